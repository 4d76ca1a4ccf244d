//! Database layer
//!
//! SQLite (default, single-file deployment) and MySQL are supported behind
//! the `DatabasePool` trait; the driver is selected from configuration.
//!
//! ```ignore
//! use astra::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config.database).await?;
//! migrations::run_migrations(&pool).await?;
//!
//! let mut tx = pool.begin().await?;
//! // ... repository `*_tx` calls ...
//! tx.commit().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DbTransaction, DynDatabasePool, MysqlDatabase,
    SqliteDatabase,
};

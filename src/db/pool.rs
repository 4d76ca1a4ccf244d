//! Connection pools for the document store
//!
//! A single interface over the SQLite and MySQL backends. The concrete pool
//! is chosen from `DatabaseConfig::driver`; callers that need typed queries
//! reach the underlying sqlx pool through `as_sqlite` / `as_mysql`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    mysql::{MySqlPool, MySqlPoolOptions},
    sqlite::{SqlitePool, SqlitePoolOptions},
    MySql, Sqlite, Transaction,
};
use std::sync::Arc;

use crate::config::{DatabaseConfig, DatabaseDriver};

/// Backend-neutral handle used by migrations and repositories
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Run one statement, returning the affected row count
    async fn execute(&self, query: &str) -> Result<u64>;

    /// Round-trip a trivial query
    async fn ping(&self) -> Result<()>;

    /// Start a transaction on a pooled connection
    async fn begin(&self) -> Result<DbTransaction<'static>>;

    /// Wait for checked-out connections and close the pool
    async fn close(&self);

    fn driver(&self) -> DatabaseDriver;

    /// Typed SQLite pool, `None` on MySQL
    fn as_sqlite(&self) -> Option<&SqlitePool>;

    /// Typed MySQL pool, `None` on SQLite
    fn as_mysql(&self) -> Option<&MySqlPool>;
}

/// An open transaction on either backend.
///
/// Dropping it without `commit` rolls the transaction back.
pub enum DbTransaction<'c> {
    Sqlite(Transaction<'c, Sqlite>),
    Mysql(Transaction<'c, MySql>),
}

impl DbTransaction<'_> {
    /// Driver the transaction runs on
    pub fn driver(&self) -> DatabaseDriver {
        match self {
            DbTransaction::Sqlite(_) => DatabaseDriver::Sqlite,
            DbTransaction::Mysql(_) => DatabaseDriver::Mysql,
        }
    }

    /// Commit all statements executed on this transaction
    pub async fn commit(self) -> Result<()> {
        match self {
            DbTransaction::Sqlite(tx) => tx.commit().await,
            DbTransaction::Mysql(tx) => tx.commit().await,
        }
        .context("Failed to commit transaction")
    }

    /// Discard all statements executed on this transaction
    pub async fn rollback(self) -> Result<()> {
        match self {
            DbTransaction::Sqlite(tx) => tx.rollback().await,
            DbTransaction::Mysql(tx) => tx.rollback().await,
        }
        .context("Failed to roll back transaction")
    }
}

/// Connections kept by a file-backed SQLite pool
const SQLITE_MAX_CONNECTIONS: u32 = 20;

/// Connections kept by a MySQL pool
const MYSQL_MAX_CONNECTIONS: u32 = 30;

fn is_memory_url(url: &str) -> bool {
    matches!(url, ":memory:" | "sqlite::memory:") || url.starts_with("sqlite::memory:?")
}

/// Normalize a configured SQLite location into a sqlx connection URL.
///
/// Bare paths get the `sqlite:` scheme, and `mode=rwc` is added unless the
/// URL already carries options so the file is created on first start.
fn sqlite_url(url: &str) -> String {
    if url == ":memory:" {
        return "sqlite::memory:".to_string();
    }
    match url.strip_prefix("sqlite:") {
        Some(_) if url.contains('?') => url.to_string(),
        Some(_) => format!("{}?mode=rwc", url),
        None => format!("sqlite:{}?mode=rwc", url),
    }
}

/// Create the directory holding a file-backed database
fn ensure_parent_dir(url: &str) -> Result<()> {
    let path = url.trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);
    match std::path::Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {:?}", parent)),
        _ => Ok(()),
    }
}

/// Document store backed by SQLite
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open (and create if needed) the database at `url`.
    ///
    /// An in-memory database lives only as long as its connection, so it gets
    /// a single connection that is never recycled.
    pub async fn new(url: &str) -> Result<Self> {
        let options = if is_memory_url(url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            ensure_parent_dir(url)?;
            SqlitePoolOptions::new().max_connections(SQLITE_MAX_CONNECTIONS)
        };

        let pool = options
            .connect(&sqlite_url(url))
            .await
            .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DatabasePool for SqliteDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let done = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("SQLite statement failed: {}", query))?;
        Ok(done.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("SQLite ping failed")?;
        Ok(())
    }

    async fn begin(&self) -> Result<DbTransaction<'static>> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin SQLite transaction")?;
        Ok(DbTransaction::Sqlite(tx))
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Sqlite
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        Some(&self.pool)
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        None
    }
}

/// Document store backed by MySQL
pub struct MysqlDatabase {
    pool: MySqlPool,
}

impl MysqlDatabase {
    /// Connect to `url`; the `mysql://` scheme is optional
    pub async fn new(url: &str) -> Result<Self> {
        let connection_url = match url.strip_prefix("mysql://") {
            Some(_) => url.to_string(),
            None => format!("mysql://{}", url),
        };

        let pool = MySqlPoolOptions::new()
            .max_connections(MYSQL_MAX_CONNECTIONS)
            .connect(&connection_url)
            .await
            .with_context(|| format!("Failed to connect to MySQL database: {}", url))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl DatabasePool for MysqlDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let done = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("MySQL statement failed: {}", query))?;
        Ok(done.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("MySQL ping failed")?;
        Ok(())
    }

    async fn begin(&self) -> Result<DbTransaction<'static>> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin MySQL transaction")?;
        Ok(DbTransaction::Mysql(tx))
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Mysql
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        None
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        Some(&self.pool)
    }
}

/// Shared handle to whichever pool the configuration selected
pub type DynDatabasePool = Arc<dyn DatabasePool>;

/// Open the pool selected by `config.driver`
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    let pool: DynDatabasePool = match config.driver {
        DatabaseDriver::Sqlite => Arc::new(SqliteDatabase::new(&config.url).await?),
        DatabaseDriver::Mysql => Arc::new(MysqlDatabase::new(&config.url).await?),
    };
    Ok(pool)
}

/// Fresh in-memory SQLite pool, without migrations applied
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    create_pool(&DatabaseConfig {
        driver: DatabaseDriver::Sqlite,
        url: ":memory:".to_string(),
        auto_migrate: false,
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_config(url: String) -> DatabaseConfig {
        DatabaseConfig {
            driver: DatabaseDriver::Sqlite,
            url,
            auto_migrate: false,
        }
    }

    #[test]
    fn test_sqlite_url_normalization() {
        assert_eq!(sqlite_url(":memory:"), "sqlite::memory:");
        assert_eq!(sqlite_url("data/astra.db"), "sqlite:data/astra.db?mode=rwc");
        assert_eq!(sqlite_url("sqlite:data/astra.db"), "sqlite:data/astra.db?mode=rwc");
        assert_eq!(sqlite_url("sqlite:a.db?mode=ro"), "sqlite:a.db?mode=ro");
        assert!(is_memory_url(":memory:"));
        assert!(is_memory_url("sqlite::memory:"));
        assert!(!is_memory_url("data/astra.db"));
    }

    #[tokio::test]
    async fn test_memory_pool() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        assert_eq!(pool.driver(), DatabaseDriver::Sqlite);
        assert!(pool.as_sqlite().is_some());
        assert!(pool.as_mysql().is_none());
        pool.ping().await.expect("Ping should succeed");

        pool.execute("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)")
            .await
            .expect("Failed to create table");
        let inserted = pool
            .execute("INSERT INTO notes (body) VALUES ('a'), ('b')")
            .await
            .expect("Failed to insert");
        assert_eq!(inserted, 2);
    }

    #[tokio::test]
    async fn test_transaction_commit_and_rollback() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        pool.execute("CREATE TABLE items (name TEXT)").await.unwrap();

        let mut tx = pool.begin().await.expect("Failed to begin");
        assert_eq!(tx.driver(), DatabaseDriver::Sqlite);
        if let DbTransaction::Sqlite(inner) = &mut tx {
            sqlx::query("INSERT INTO items (name) VALUES ('kept')")
                .execute(&mut **inner)
                .await
                .unwrap();
        }
        tx.commit().await.expect("Failed to commit");

        let mut tx = pool.begin().await.expect("Failed to begin");
        if let DbTransaction::Sqlite(inner) = &mut tx {
            sqlx::query("INSERT INTO items (name) VALUES ('dropped')")
                .execute(&mut **inner)
                .await
                .unwrap();
        }
        tx.rollback().await.expect("Failed to roll back");

        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM items")
            .fetch_all(pool.as_sqlite().unwrap())
            .await
            .unwrap();
        assert_eq!(names, vec!["kept"]);
    }

    #[tokio::test]
    async fn test_file_database_creates_directories() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = dir.path().join("data").join("nested").join("astra.db");

        let pool = create_pool(&sqlite_config(db_path.to_string_lossy().to_string()))
            .await
            .expect("Failed to create pool");
        pool.ping().await.expect("Ping should succeed");
        pool.close().await;

        assert!(db_path.exists());
    }

    #[tokio::test]
    #[ignore = "needs a MySQL server at MYSQL_TEST_URL"]
    async fn test_mysql_pool() {
        let url = std::env::var("MYSQL_TEST_URL")
            .unwrap_or_else(|_| "mysql://root@localhost/astra_test".to_string());

        let pool = create_pool(&DatabaseConfig {
            driver: DatabaseDriver::Mysql,
            url,
            auto_migrate: false,
        })
        .await
        .expect("Failed to create pool");

        assert_eq!(pool.driver(), DatabaseDriver::Mysql);
        assert!(pool.as_mysql().is_some());
        pool.ping().await.expect("Ping should succeed");
    }
}

//! Database migrations
//!
//! Migrations are embedded in the binary as SQL strings, one variant per
//! backend. Applied versions are tracked in the `_migrations` table so that
//! `run_migrations` is idempotent.
//!
//! ```ignore
//! use astra::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config.database).await?;
//! migrations::prepare_schema(&pool, config.database.auto_migrate).await?;
//! ```

use anyhow::{anyhow, Context, Result};
use sqlx::{MySqlPool, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number, unique and applied in ascending order
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// All schema migrations, in order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id VARCHAR(36) PRIMARY KEY,
                login VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id VARCHAR(36) PRIMARY KEY,
                login VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci;
        "#,
    },
    Migration {
        version: 2,
        name: "create_documents",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS documents (
                id VARCHAR(36) PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                mime VARCHAR(255) NOT NULL DEFAULT '',
                file BOOLEAN NOT NULL DEFAULT 0,
                public BOOLEAN NOT NULL DEFAULT 0,
                owner VARCHAR(36) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                grants TEXT NOT NULL DEFAULT '[]',
                json_data TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents(owner);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS documents (
                id VARCHAR(36) PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                mime VARCHAR(255) NOT NULL DEFAULT '',
                file BOOLEAN NOT NULL DEFAULT FALSE,
                public BOOLEAN NOT NULL DEFAULT FALSE,
                owner VARCHAR(36) NOT NULL,
                created_at TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
                grants TEXT NOT NULL,
                json_data LONGTEXT,
                INDEX idx_documents_owner (owner)
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci;
        "#,
    },
];

/// Run all pending migrations.
///
/// Returns the number of migrations applied by this call.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = applied_versions(pool).await?;
    let mut count = 0;

    for migration in MIGRATIONS {
        if applied.contains(&migration.version) {
            continue;
        }
        tracing::info!(
            "Applying migration {}: {}",
            migration.version,
            migration.name
        );
        apply_migration(pool, migration)
            .await
            .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
        count += 1;
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Check the connection, then apply pending migrations when `auto_migrate`
/// is set. Otherwise pending migrations are only reported.
///
/// Returns the number of migrations applied.
pub async fn prepare_schema(pool: &DynDatabasePool, auto_migrate: bool) -> Result<usize> {
    pool.ping().await.context("Database is not reachable")?;

    if auto_migrate {
        return run_migrations(pool).await;
    }

    let pending = pending_count(pool).await?;
    if pending > 0 {
        tracing::warn!(
            "Automatic migrations disabled, {} migration(s) pending",
            pending
        );
    } else {
        tracing::info!("Automatic migrations disabled, schema is up to date");
    }
    Ok(0)
}

/// Number of migrations not yet applied
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;
    let applied = applied_versions(pool).await?;
    Ok(MIGRATIONS
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .count())
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

async fn applied_versions(pool: &DynDatabasePool) -> Result<Vec<i32>> {
    match pool.driver() {
        DatabaseDriver::Sqlite => applied_versions_sqlite(sqlite_pool(pool)?).await,
        DatabaseDriver::Mysql => applied_versions_mysql(mysql_pool(pool)?).await,
    }
}

async fn applied_versions_sqlite(pool: &SqlitePool) -> Result<Vec<i32>> {
    let versions = sqlx::query_scalar("SELECT version FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;
    Ok(versions)
}

async fn applied_versions_mysql(pool: &MySqlPool) -> Result<Vec<i32>> {
    let versions = sqlx::query_scalar("SELECT version FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;
    Ok(versions)
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => {
            let pool = sqlite_pool(pool)?;
            for statement in split_sql_statements(migration.up_sqlite) {
                sqlx::query(statement)
                    .execute(pool)
                    .await
                    .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
            }
            sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
                .bind(migration.version)
                .bind(migration.name)
                .execute(pool)
                .await?;
        }
        DatabaseDriver::Mysql => {
            let pool = mysql_pool(pool)?;
            for statement in split_sql_statements(migration.up_mysql) {
                sqlx::query(statement)
                    .execute(pool)
                    .await
                    .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
            }
            sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
                .bind(migration.version)
                .bind(migration.name)
                .execute(pool)
                .await?;
        }
    }
    Ok(())
}

fn sqlite_pool(pool: &DynDatabasePool) -> Result<&SqlitePool> {
    pool.as_sqlite()
        .ok_or_else(|| anyhow!("pool reports sqlite but has no sqlite handle"))
}

fn mysql_pool(pool: &DynDatabasePool) -> Result<&MySqlPool> {
    pool.as_mysql()
        .ok_or_else(|| anyhow!("pool reports mysql but has no mysql handle"))
}

fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split a migration body into statements, skipping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

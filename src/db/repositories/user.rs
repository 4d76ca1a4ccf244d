//! User repository
//!
//! - `UserRepository` trait defining user data access
//! - `SqlxUserRepository` implementing it for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::{DbTransaction, DynDatabasePool};
use crate::models::User;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::{mysql::MySqlRow, sqlite::SqliteRow, Executor, MySql, MySqlPool, Row, Sqlite, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Persist a new user inside an open transaction
    async fn create_tx(&self, tx: &mut DbTransaction<'_>, user: &User) -> Result<User>;

    /// Get user by login
    async fn get_by_login(&self, login: &str) -> Result<Option<User>>;

    /// Get user by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<User>>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }

    fn sqlite(&self) -> Result<&SqlitePool> {
        self.pool
            .as_sqlite()
            .ok_or_else(|| anyhow!("SQLite pool unavailable"))
    }

    fn mysql(&self) -> Result<&MySqlPool> {
        self.pool
            .as_mysql()
            .ok_or_else(|| anyhow!("MySQL pool unavailable"))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => insert_user_sqlite(self.sqlite()?, user).await?,
            DatabaseDriver::Mysql => insert_user_mysql(self.mysql()?, user).await?,
        }
        Ok(user.clone())
    }

    async fn create_tx(&self, tx: &mut DbTransaction<'_>, user: &User) -> Result<User> {
        match tx {
            DbTransaction::Sqlite(tx) => insert_user_sqlite(&mut **tx, user).await?,
            DbTransaction::Mysql(tx) => insert_user_mysql(&mut **tx, user).await?,
        }
        Ok(user.clone())
    }

    async fn get_by_login(&self, login: &str) -> Result<Option<User>> {
        let sql = "SELECT id, login, password_hash, created_at FROM users WHERE login = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .bind(login)
                    .fetch_optional(self.sqlite()?)
                    .await
                    .context("Failed to get user by login")?;
                row.as_ref().map(row_to_user_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .bind(login)
                    .fetch_optional(self.mysql()?)
                    .await
                    .context("Failed to get user by login")?;
                row.as_ref().map(row_to_user_mysql).transpose()
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        let sql = "SELECT id, login, password_hash, created_at FROM users WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(self.sqlite()?)
                    .await
                    .context("Failed to get user by ID")?;
                row.as_ref().map(row_to_user_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(self.mysql()?)
                    .await
                    .context("Failed to get user by ID")?;
                row.as_ref().map(row_to_user_mysql).transpose()
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn insert_user_sqlite<'e, E>(executor: E, user: &User) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO users (id, login, password_hash, created_at) VALUES (?, ?, ?, ?)")
        .bind(&user.id)
        .bind(&user.login)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(executor)
        .await
        .context("Failed to create user")?;
    Ok(())
}

fn row_to_user_sqlite(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        login: row.try_get("login")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn insert_user_mysql<'e, E>(executor: E, user: &User) -> Result<()>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query("INSERT INTO users (id, login, password_hash, created_at) VALUES (?, ?, ?, ?)")
        .bind(&user.id)
        .bind(&user.login)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(executor)
        .await
        .context("Failed to create user")?;
    Ok(())
}

fn row_to_user_mysql(row: &MySqlRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        login: row.try_get("login")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxUserRepository::new(pool.clone());
        (pool, repo)
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let (_pool, repo) = setup_test_repo().await;
        let user = User::new("TestUser01".to_string(), "hash123".to_string());

        let created = repo.create(&user).await.expect("Failed to create user");
        assert_eq!(created.id, user.id);

        let by_login = repo
            .get_by_login("TestUser01")
            .await
            .expect("Failed to get user")
            .expect("User not found");
        assert_eq!(by_login.id, user.id);
        assert_eq!(by_login.password_hash, "hash123");

        let by_id = repo
            .get_by_id(&user.id)
            .await
            .expect("Failed to get user")
            .expect("User not found");
        assert_eq!(by_id.login, "TestUser01");
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let (_pool, repo) = setup_test_repo().await;

        assert!(repo.get_by_login("Nobody123").await.unwrap().is_none());
        assert!(repo.get_by_id("missing-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_login_fails() {
        let (_pool, repo) = setup_test_repo().await;

        repo.create(&User::new("TestUser01".to_string(), "h1".to_string()))
            .await
            .expect("First create should succeed");
        let result = repo
            .create(&User::new("TestUser01".to_string(), "h2".to_string()))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_create_tx_commit_and_rollback() {
        let (pool, repo) = setup_test_repo().await;

        let committed = User::new("Committed1".to_string(), "h".to_string());
        let mut tx = pool.begin().await.unwrap();
        repo.create_tx(&mut tx, &committed).await.unwrap();
        tx.commit().await.unwrap();

        let rolled_back = User::new("RolledBack1".to_string(), "h".to_string());
        let mut tx = pool.begin().await.unwrap();
        repo.create_tx(&mut tx, &rolled_back).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(repo.get_by_login("Committed1").await.unwrap().is_some());
        assert!(repo.get_by_login("RolledBack1").await.unwrap().is_none());
    }
}

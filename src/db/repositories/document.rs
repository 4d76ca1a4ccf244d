//! Document repository
//!
//! - `DocumentRepository` trait defining document data access
//! - `SqlxDocumentRepository` implementing it for SQLite and MySQL
//!
//! Grants are stored as a JSON array in a text column; the optional JSON
//! payload is stored as text and parsed back on read.

use crate::config::DatabaseDriver;
use crate::db::{DbTransaction, DynDatabasePool};
use crate::models::Document;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::{mysql::MySqlRow, sqlite::SqliteRow, Executor, MySql, MySqlPool, Row, Sqlite, SqlitePool};
use std::sync::Arc;

/// Document repository trait
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Persist a new document
    async fn create(&self, doc: &Document) -> Result<()>;

    /// Persist a new document inside an open transaction
    async fn create_tx(&self, tx: &mut DbTransaction<'_>, doc: &Document) -> Result<()>;

    /// Documents owned by `owner`, ordered by name then newest first.
    ///
    /// A negative `limit` returns every match.
    async fn list(&self, owner: &str, limit: i64) -> Result<Vec<Document>>;

    /// `list` inside an open transaction
    async fn list_tx(
        &self,
        tx: &mut DbTransaction<'_>,
        owner: &str,
        limit: i64,
    ) -> Result<Vec<Document>>;

    /// Get document by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<Document>>;

    /// `get_by_id` inside an open transaction
    async fn get_by_id_tx(&self, tx: &mut DbTransaction<'_>, id: &str)
        -> Result<Option<Document>>;

    /// Delete a document; returns `false` when no row matched
    async fn delete(&self, id: &str) -> Result<bool>;

    /// `delete` inside an open transaction
    async fn delete_tx(&self, tx: &mut DbTransaction<'_>, id: &str) -> Result<bool>;
}

const INSERT_SQL: &str = r#"
    INSERT INTO documents (id, name, mime, file, public, owner, created_at, grants, json_data)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const LIST_SQL: &str = r#"
    SELECT id, name, mime, file, public, owner, created_at, grants, json_data
    FROM documents
    WHERE owner = ?
    ORDER BY name, created_at DESC
    LIMIT ?
"#;

const GET_SQL: &str = r#"
    SELECT id, name, mime, file, public, owner, created_at, grants, json_data
    FROM documents
    WHERE id = ?
"#;

const DELETE_SQL: &str = "DELETE FROM documents WHERE id = ?";

/// SQLx-based document repository implementation
pub struct SqlxDocumentRepository {
    pool: DynDatabasePool,
}

impl SqlxDocumentRepository {
    /// Create a new SQLx document repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn DocumentRepository> {
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
impl DocumentRepository for SqlxDocumentRepository {
    async fn create(&self, doc: &Document) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => insert_document_sqlite(self.sqlite()?, doc).await,
            DatabaseDriver::Mysql => insert_document_mysql(self.mysql()?, doc).await,
        }
    }

    async fn create_tx(&self, tx: &mut DbTransaction<'_>, doc: &Document) -> Result<()> {
        match tx {
            DbTransaction::Sqlite(tx) => insert_document_sqlite(&mut **tx, doc).await,
            DbTransaction::Mysql(tx) => insert_document_mysql(&mut **tx, doc).await,
        }
    }

    async fn list(&self, owner: &str, limit: i64) -> Result<Vec<Document>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_documents_sqlite(self.sqlite()?, owner, limit).await,
            DatabaseDriver::Mysql => list_documents_mysql(self.mysql()?, owner, limit).await,
        }
    }

    async fn list_tx(
        &self,
        tx: &mut DbTransaction<'_>,
        owner: &str,
        limit: i64,
    ) -> Result<Vec<Document>> {
        match tx {
            DbTransaction::Sqlite(tx) => list_documents_sqlite(&mut **tx, owner, limit).await,
            DbTransaction::Mysql(tx) => list_documents_mysql(&mut **tx, owner, limit).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Document>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_document_sqlite(self.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_document_mysql(self.mysql()?, id).await,
        }
    }

    async fn get_by_id_tx(
        &self,
        tx: &mut DbTransaction<'_>,
        id: &str,
    ) -> Result<Option<Document>> {
        match tx {
            DbTransaction::Sqlite(tx) => get_document_sqlite(&mut **tx, id).await,
            DbTransaction::Mysql(tx) => get_document_mysql(&mut **tx, id).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(DELETE_SQL)
                .bind(id)
                .execute(self.sqlite()?)
                .await
                .context("Failed to delete document")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(DELETE_SQL)
                .bind(id)
                .execute(self.mysql()?)
                .await
                .context("Failed to delete document")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn delete_tx(&self, tx: &mut DbTransaction<'_>, id: &str) -> Result<bool> {
        let affected = match tx {
            DbTransaction::Sqlite(tx) => sqlx::query(DELETE_SQL)
                .bind(id)
                .execute(&mut **tx)
                .await
                .context("Failed to delete document")?
                .rows_affected(),
            DbTransaction::Mysql(tx) => sqlx::query(DELETE_SQL)
                .bind(id)
                .execute(&mut **tx)
                .await
                .context("Failed to delete document")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }
}

// ============================================================================
// Column encoding shared by both backends
// ============================================================================

fn encode_grants(grants: &[String]) -> Result<String> {
    serde_json::to_string(grants).context("Failed to encode grants")
}

fn encode_json(value: &Option<serde_json::Value>) -> Result<Option<String>> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .context("Failed to encode document json")
}

fn decode_grants(raw: Option<String>) -> Result<Vec<String>> {
    match raw.as_deref() {
        None | Some("") => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text).context("Failed to decode grants"),
    }
}

fn decode_json(raw: Option<String>) -> Result<Option<serde_json::Value>> {
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(text) => serde_json::from_str(text)
            .map(Some)
            .context("Failed to decode document json"),
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn insert_document_sqlite<'e, E>(executor: E, doc: &Document) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(INSERT_SQL)
        .bind(&doc.id)
        .bind(&doc.name)
        .bind(&doc.mime)
        .bind(doc.file)
        .bind(doc.public)
        .bind(&doc.owner)
        .bind(doc.created_at)
        .bind(encode_grants(&doc.grants)?)
        .bind(encode_json(&doc.json_data)?)
        .execute(executor)
        .await
        .context("Failed to create document")?;
    Ok(())
}

async fn list_documents_sqlite<'e, E>(executor: E, owner: &str, limit: i64) -> Result<Vec<Document>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(LIST_SQL)
        .bind(owner)
        .bind(limit)
        .fetch_all(executor)
        .await
        .context("Failed to list documents")?;
    rows.iter().map(row_to_document_sqlite).collect()
}

async fn get_document_sqlite<'e, E>(executor: E, id: &str) -> Result<Option<Document>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(GET_SQL)
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("Failed to get document by ID")?;
    row.as_ref().map(row_to_document_sqlite).transpose()
}

fn row_to_document_sqlite(row: &SqliteRow) -> Result<Document> {
    Ok(Document {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        mime: row.try_get("mime")?,
        file: row.try_get("file")?,
        public: row.try_get("public")?,
        owner: row.try_get("owner")?,
        created_at: row.try_get("created_at")?,
        grants: decode_grants(row.try_get("grants")?)?,
        json_data: decode_json(row.try_get("json_data")?)?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn insert_document_mysql<'e, E>(executor: E, doc: &Document) -> Result<()>
where
    E: Executor<'e, Database = MySql>,
{
    sqlx::query(INSERT_SQL)
        .bind(&doc.id)
        .bind(&doc.name)
        .bind(&doc.mime)
        .bind(doc.file)
        .bind(doc.public)
        .bind(&doc.owner)
        .bind(doc.created_at)
        .bind(encode_grants(&doc.grants)?)
        .bind(encode_json(&doc.json_data)?)
        .execute(executor)
        .await
        .context("Failed to create document")?;
    Ok(())
}

async fn list_documents_mysql<'e, E>(executor: E, owner: &str, limit: i64) -> Result<Vec<Document>>
where
    E: Executor<'e, Database = MySql>,
{
    // MySQL has no "unlimited" LIMIT value, so fall back to the largest one
    let limit = if limit < 0 { i64::MAX } else { limit };
    let rows = sqlx::query(LIST_SQL)
        .bind(owner)
        .bind(limit)
        .fetch_all(executor)
        .await
        .context("Failed to list documents")?;
    rows.iter().map(row_to_document_mysql).collect()
}

async fn get_document_mysql<'e, E>(executor: E, id: &str) -> Result<Option<Document>>
where
    E: Executor<'e, Database = MySql>,
{
    let row = sqlx::query(GET_SQL)
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("Failed to get document by ID")?;
    row.as_ref().map(row_to_document_mysql).transpose()
}

fn row_to_document_mysql(row: &MySqlRow) -> Result<Document> {
    Ok(Document {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        mime: row.try_get("mime")?,
        file: row.try_get("file")?,
        public: row.try_get("public")?,
        owner: row.try_get("owner")?,
        created_at: row.try_get("created_at")?,
        grants: decode_grants(row.try_get("grants")?)?,
        json_data: decode_json(row.try_get("json_data")?)?,
    })
}

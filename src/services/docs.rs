//! Docs service
//!
//! Thin business layer over `DocumentRepository`: assigns identity on create
//! and turns missing rows into `NotFound`. Caching is the HTTP layer's job.

use crate::db::repositories::DocumentRepository;
use crate::models::{CreateDocumentInput, Document};
use anyhow::Context;
use std::sync::Arc;

/// Error types for docs service operations
#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    /// Document does not exist
    #[error("document not found")]
    NotFound,

    /// Repository failure
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

/// Docs service
pub struct DocsService {
    repo: Arc<dyn DocumentRepository>,
}

impl DocsService {
    pub fn new(repo: Arc<dyn DocumentRepository>) -> Self {
        Self { repo }
    }

    /// Persist a new document with a fresh ID and creation time
    pub async fn create(&self, input: CreateDocumentInput) -> Result<Document, DocsError> {
        let doc = Document::new(input);
        self.repo
            .create(&doc)
            .await
            .context("Failed to store document")?;

        tracing::info!("Document created: {} ({}) by {}", doc.id, doc.name, doc.owner);
        Ok(doc)
    }

    /// Documents owned by `owner`, ordered by name then newest first
    pub async fn list(&self, owner: &str, limit: i64) -> Result<Vec<Document>, DocsError> {
        let docs = self
            .repo
            .list(owner, limit)
            .await
            .context("Failed to list documents")?;
        Ok(docs)
    }

    /// Fetch a document by ID
    pub async fn get_by_id(&self, id: &str) -> Result<Document, DocsError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to load document")?
            .ok_or(DocsError::NotFound)
    }

    /// Delete a document by ID
    pub async fn delete(&self, id: &str) -> Result<(), DocsError> {
        let removed = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete document")?;
        if !removed {
            return Err(DocsError::NotFound);
        }

        tracing::info!("Document deleted: {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxDocumentRepository;
    use crate::db::{create_test_pool, migrations};
    use serde_json::json;

    async fn setup_test_service() -> DocsService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        DocsService::new(SqlxDocumentRepository::boxed(pool))
    }

    fn input(name: &str, owner: &str) -> CreateDocumentInput {
        CreateDocumentInput {
            name: name.to_string(),
            mime: "application/json".to_string(),
            owner: owner.to_string(),
            json_data: Some(json!({"name": name})),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_assigns_identity() {
        let service = setup_test_service().await;

        let first = service.create(input("a.json", "u1")).await.unwrap();
        let second = service.create(input("a.json", "u1")).await.unwrap();

        assert_ne!(first.id, second.id);
        let loaded = service.get_by_id(&first.id).await.unwrap();
        assert_eq!(loaded.json_data, Some(json!({"name": "a.json"})));
    }

    #[tokio::test]
    async fn test_list_passes_through() {
        let service = setup_test_service().await;
        service.create(input("b", "u1")).await.unwrap();
        service.create(input("a", "u1")).await.unwrap();
        service.create(input("c", "u2")).await.unwrap();

        let names: Vec<String> = service
            .list("u1", 20)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let service = setup_test_service().await;

        let err = service.get_by_id("missing").await.unwrap_err();
        assert!(matches!(err, DocsError::NotFound));
        assert_eq!(err.to_string(), "document not found");

        assert!(matches!(
            service.delete("missing").await,
            Err(DocsError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_then_get() {
        let service = setup_test_service().await;
        let doc = service.create(input("a", "u1")).await.unwrap();

        service.delete(&doc.id).await.unwrap();

        assert!(matches!(
            service.get_by_id(&doc.id).await,
            Err(DocsError::NotFound)
        ));
    }
}

//! In-memory repositories
//!
//! Process-local implementations of the repository traits, used where a
//! database is unnecessary (HTTP-level tests, throwaway instances). They keep
//! the same ordering and uniqueness rules as the SQL implementations.
//!
//! Transactional variants apply their change immediately; there is nothing
//! to roll back.

use super::{DocumentRepository, UserRepository};
use crate::db::DbTransaction;
use crate::models::{Document, User};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory user store keyed by ID
#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed() -> Arc<dyn UserRepository> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.login == user.login) {
            bail!("Failed to create user: login '{}' already exists", user.login);
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user.clone())
    }

    async fn create_tx(&self, _tx: &mut DbTransaction<'_>, user: &User) -> Result<User> {
        self.create(user).await
    }

    async fn get_by_login(&self, login: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.login == login).cloned())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }
}

/// In-memory document store keyed by ID
///
/// Counts `list` calls so callers can observe cache effectiveness.
#[derive(Default)]
pub struct MemoryDocumentRepository {
    docs: RwLock<HashMap<String, Document>>,
    list_calls: AtomicUsize,
}

impl MemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `list`/`list_tx` calls served so far
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    async fn create(&self, doc: &Document) -> Result<()> {
        let mut docs = self.docs.write().await;
        if docs.contains_key(&doc.id) {
            bail!("Failed to create document: id '{}' already exists", doc.id);
        }
        docs.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn create_tx(&self, _tx: &mut DbTransaction<'_>, doc: &Document) -> Result<()> {
        self.create(doc).await
    }

    async fn list(&self, owner: &str, limit: i64) -> Result<Vec<Document>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let docs = self.docs.read().await;
        let mut owned: Vec<Document> = docs.values().filter(|d| d.owner == owner).cloned().collect();
        owned.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        if let Ok(limit) = usize::try_from(limit) {
            owned.truncate(limit);
        }
        Ok(owned)
    }

    async fn list_tx(
        &self,
        _tx: &mut DbTransaction<'_>,
        owner: &str,
        limit: i64,
    ) -> Result<Vec<Document>> {
        self.list(owner, limit).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.docs.read().await.get(id).cloned())
    }

    async fn get_by_id_tx(
        &self,
        _tx: &mut DbTransaction<'_>,
        id: &str,
    ) -> Result<Option<Document>> {
        self.get_by_id(id).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.docs.write().await.remove(id).is_some())
    }

    async fn delete_tx(&self, _tx: &mut DbTransaction<'_>, id: &str) -> Result<bool> {
        self.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateDocumentInput;
    use chrono::{Duration, Utc};

    fn new_doc(name: &str, owner: &str) -> Document {
        Document::new(CreateDocumentInput {
            name: name.to_string(),
            owner: owner.to_string(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_user_login_is_unique() {
        let repo = MemoryUserRepository::new();
        let user = User::new("TestUser01".to_string(), "h".to_string());

        repo.create(&user).await.unwrap();
        assert!(repo
            .create(&User::new("TestUser01".to_string(), "h".to_string()))
            .await
            .is_err());

        assert_eq!(repo.get_by_id(&user.id).await.unwrap().unwrap().login, "TestUser01");
        assert!(repo.get_by_login("Other0001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_document_list_order_limit_and_counter() {
        let repo = MemoryDocumentRepository::new();
        let mut older = new_doc("b", "u1");
        older.created_at = Utc::now() - Duration::minutes(5);
        let newer = new_doc("b", "u1");
        let first = new_doc("a", "u1");
        for doc in [&older, &newer, &first, &new_doc("z", "u2")] {
            repo.create(doc).await.unwrap();
        }

        let ids: Vec<String> = repo
            .list("u1", 20)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![first.id.clone(), newer.id.clone(), older.id.clone()]);
        assert_eq!(repo.list("u1", 1).await.unwrap().len(), 1);
        assert_eq!(repo.list("u1", -1).await.unwrap().len(), 3);
        assert_eq!(repo.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_document_delete() {
        let repo = MemoryDocumentRepository::new();
        let doc = new_doc("a", "u1");
        repo.create(&doc).await.unwrap();

        assert!(repo.delete(&doc.id).await.unwrap());
        assert!(!repo.delete(&doc.id).await.unwrap());
        assert!(repo.get_by_id(&doc.id).await.unwrap().is_none());
    }
}

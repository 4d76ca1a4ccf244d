//! In-memory session store
//!
//! Maps bearer tokens to sessions. Sessions live until logout or process
//! exit; there is no expiry.

use crate::models::Session;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Token → session map guarded by a single reader/writer lock
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for a user and return its fresh token
    pub async fn create(&self, user_id: &str, login: &str) -> String {
        let token = Uuid::new_v4().to_string();
        let session = Session {
            token: token.clone(),
            user_id: user_id.to_string(),
            login: login.to_string(),
            created_at: Utc::now(),
        };

        self.sessions.write().await.insert(token.clone(), session);
        tracing::debug!("Session opened for {}", login);
        token
    }

    /// Look up a session by token
    pub async fn get(&self, token: &str) -> Option<Session> {
        self.sessions.read().await.get(token).cloned()
    }

    /// Remove a session; `false` when the token was unknown
    pub async fn delete(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Number of open sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_and_get() {
        let store = SessionStore::new();

        let token = store.create("user-1", "TestUser01").await;
        assert!(Uuid::parse_str(&token).is_ok());

        let session = store.get(&token).await.expect("session should exist");
        assert_eq!(session.token, token);
        assert_eq!(session.user_id, "user-1");
        assert_eq!(session.login, "TestUser01");
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let store = SessionStore::new();
        assert!(store.get("nope").await.is_none());
        assert!(!store.delete("nope").await);
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let store = SessionStore::new();
        let token = store.create("user-1", "TestUser01").await;

        assert!(store.delete(&token).await);
        assert!(!store.delete(&token).await);
        assert!(store.get(&token).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_tokens_are_distinct_per_login() {
        let store = SessionStore::new();
        let first = store.create("user-1", "TestUser01").await;
        let second = store.create("user-1", "TestUser01").await;

        assert_ne!(first, second);
        assert_eq!(store.len().await, 2);

        store.delete(&first).await;
        assert!(store.get(&second).await.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_create() {
        let store = Arc::new(SessionStore::new());

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.create(&format!("user-{i}"), "TestUser01").await })
            })
            .collect();

        for handle in handles {
            let token = handle.await.unwrap();
            assert!(store.get(&token).await.is_some());
        }
        assert_eq!(store.len().await, 50);
    }
}

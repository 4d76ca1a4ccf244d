//! Cache layer
//!
//! This module provides the read-through cache used by the document endpoints.
//! Lookups are served from memory when fresh; every write path invalidates
//! the affected keys so readers fall through to the repository.
//!
//! # Usage
//!
//! ```rust,ignore
//! use astra::cache::{create_cache, doc_key, CachedDocs};
//! use astra::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default());
//! cache.set(doc_key(&doc.id), CachedDocs::Document(Arc::new(doc))).await;
//! ```

pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::models::Document;

pub use memory::TtlCache;

/// Values held by the document cache
///
/// Payloads are reference counted so cache hits are cheap to hand out.
#[derive(Debug, Clone)]
pub enum CachedDocs {
    /// A single document looked up by id
    Document(Arc<Document>),
    /// The result of a list query
    List(Arc<Vec<Document>>),
}

/// Cache shared by the document handlers
pub type DocumentCache = TtlCache<CachedDocs>;

/// Cache key for a single document
pub fn doc_key(id: &str) -> String {
    format!("doc:{}", id)
}

/// Cache key for a list query
pub fn list_key(owner: &str, limit: i64) -> String {
    format!("list:{}:{}", owner, limit)
}

/// Create the document cache from configuration
pub fn create_cache(config: &CacheConfig) -> Arc<DocumentCache> {
    let ttl = Duration::from_secs(config.ttl_seconds);
    Arc::new(TtlCache::with_capacity_and_ttl(config.max_capacity, ttl))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateDocumentInput;

    fn sample_document(id: &str) -> Document {
        let mut doc = Document::new(CreateDocumentInput {
            name: "report.pdf".to_string(),
            mime: "application/pdf".to_string(),
            file: true,
            owner: "user-1".to_string(),
            ..Default::default()
        });
        doc.id = id.to_string();
        doc
    }

    #[test]
    fn test_key_formats() {
        assert_eq!(doc_key("abc"), "doc:abc");
        assert_eq!(list_key("user-1", 20), "list:user-1:20");
        assert_eq!(list_key("", 0), "list::0");
    }

    #[tokio::test]
    async fn test_create_cache_from_config() {
        let config = CacheConfig {
            ttl_seconds: 1800,
            max_capacity: 100,
        };
        let cache = create_cache(&config);
        assert_eq!(cache.ttl(), Some(Duration::from_secs(1800)));

        let doc = sample_document("d1");
        cache
            .set(doc_key("d1"), CachedDocs::Document(Arc::new(doc.clone())))
            .await;

        match cache.get(&doc_key("d1")).await {
            Some(CachedDocs::Document(cached)) => assert_eq!(*cached, doc),
            other => panic!("unexpected cache value: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_ttl_config_disables_expiry() {
        let config = CacheConfig {
            ttl_seconds: 0,
            max_capacity: 100,
        };
        let cache = create_cache(&config);
        assert_eq!(cache.ttl(), None);
    }

    #[tokio::test]
    async fn test_list_and_document_entries_share_invalidation() {
        let cache = create_cache(&CacheConfig::default());

        let docs = vec![sample_document("d1"), sample_document("d2")];
        cache
            .set(list_key("user-1", 20), CachedDocs::List(Arc::new(docs)))
            .await;
        cache
            .set(
                doc_key("d1"),
                CachedDocs::Document(Arc::new(sample_document("d1"))),
            )
            .await;

        cache.invalidate_all();

        assert!(cache.get(&list_key("user-1", 20)).await.is_none());
        assert!(cache.get(&doc_key("d1")).await.is_none());
    }
}

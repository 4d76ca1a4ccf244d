//! In-memory TTL cache backed by moka
//!
//! Provides a thread-safe key/value store with an optional expiration stamp
//! on every entry.
//!
//! # Features
//! - Absolute expiration (`now + ttl`) stamped on each `set`; a zero TTL never expires
//! - Lazy expiry: freshness is checked on read and stale entries are dropped there
//! - Single-key and whole-store invalidation
//!
//! moka supplies the concurrent map and the capacity bound. Expiration is
//! carried in the entry instead of moka's own TTL policy so that the
//! freshness check is exactly the one performed by `get`.

use moka::future::Cache;
use std::time::{Duration, Instant};

/// Default maximum cache capacity (number of entries)
const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// Stored value plus its optional expiration instant
#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    /// `None` means the entry never expires
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if now > deadline)
    }
}

/// Generic TTL cache
///
/// All operations are infallible and safe to call from any number of tasks.
/// Concurrent `set`s on one key resolve last-writer-wins.
pub struct TtlCache<V> {
    store: Cache<String, CacheEntry<V>>,
    /// `None` when expiration is disabled
    ttl: Option<Duration>,
}

impl<V> std::fmt::Debug for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("entry_count", &self.store.entry_count())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache whose entries expire `ttl` after being set.
    ///
    /// A zero `ttl` disables expiration.
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity_and_ttl(DEFAULT_MAX_CAPACITY, ttl)
    }

    /// Create a cache with a custom capacity bound.
    pub fn with_capacity_and_ttl(max_capacity: u64, ttl: Duration) -> Self {
        let store = Cache::builder().max_capacity(max_capacity).build();
        let ttl = if ttl.is_zero() { None } else { Some(ttl) };
        Self { store, ttl }
    }

    /// Configured TTL, `None` when entries never expire
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Store `value` under `key`, replacing any previous entry.
    ///
    /// A deadline past what `Instant` can represent means the entry never expires.
    pub async fn set(&self, key: impl Into<String>, value: V) {
        let expires_at = self.ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        self.store
            .insert(key.into(), CacheEntry { value, expires_at })
            .await;
    }

    /// Look up `key`.
    ///
    /// An entry whose deadline has passed is removed here and reported as a miss.
    pub async fn get(&self, key: &str) -> Option<V> {
        let entry = self.store.get(key).await?;
        if entry.is_expired(Instant::now()) {
            self.store.invalidate(key).await;
            return None;
        }
        Some(entry.value)
    }

    /// Remove a single entry; no-op when absent.
    pub async fn invalidate(&self, key: &str) {
        self.store.invalidate(key).await;
    }

    /// Discard every entry currently in the store.
    ///
    /// Entries set before this call are no longer visible once it returns.
    /// A `set` racing with this call may or may not survive.
    pub fn invalidate_all(&self) {
        self.store.invalidate_all();
    }

    /// Approximate number of live entries
    pub async fn entry_count(&self) -> u64 {
        self.store.run_pending_tasks().await;
        self.store.entry_count()
    }
}

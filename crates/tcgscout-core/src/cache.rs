//! In-memory TTL cache for web lookups.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

/// TTL used for market-info lookups.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner<V> {
    map: HashMap<String, CacheEntry<V>>,
    ttl: Duration,
}

/// Thread-safe cache; clones share the same entries.
///
/// Expired entries are dropped on every write, so the map never holds more
/// than one TTL's worth of distinct keys.
#[derive(Debug, Clone)]
pub struct CacheStore<V> {
    inner: Arc<RwLock<CacheInner<V>>>,
}

impl<V: Clone> CacheStore<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                map: HashMap::new(),
                ttl,
            })),
        }
    }

    /// Returns the value for `key` unless it is missing or expired.
    pub async fn get(&self, key: &str) -> Option<V> {
        let store = self.inner.read().await;
        store
            .map
            .get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.value.clone())
    }

    /// Stores `value` for one TTL, evicting whatever has already expired.
    pub async fn put(&self, key: impl Into<String>, value: V) {
        let now = Instant::now();
        let mut store = self.inner.write().await;
        store.map.retain(|_, entry| entry.expires_at > now);
        let expires_at = now + store.ttl;
        store.map.insert(key.into(), CacheEntry { value, expires_at });
    }
}

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Default time-to-live for cached upstream responses.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry {
    payload: Value,
    written_at: Instant,
}

/// Process-wide TTL cache for upstream responses.
///
/// There is no active eviction; an entry at or past the TTL simply behaves
/// as a miss. Writes replace the whole entry under the write lock, so readers
/// never observe a partially written payload. The cache is explicitly
/// constructed and injected so tests can instantiate isolated instances.
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    /// Create a cache with the default 5-minute TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL)
    }

    /// Create a cache with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Look up a cached payload; stale entries are misses.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;

        if entry.written_at.elapsed() >= self.ttl {
            debug!("Cache entry expired: {}", key);
            return None;
        }

        Some(entry.payload.clone())
    }

    /// Store a payload, replacing any previous entry for the key.
    pub async fn set(&self, key: &str, payload: Value) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                payload,
                written_at: Instant::now(),
            },
        );
    }

    /// Remove every entry and return how many were present.
    ///
    /// Administrative operation; the discovery logic itself never clears.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = ResponseCache::new();
        cache.set("key", json!({"id": "b-1"})).await;

        let value = cache.get("key").await.unwrap();
        assert_eq!(value["id"], "b-1");
        assert!(cache.get("other").await.is_none());
    }

    #[tokio::test]
    async fn test_set_replaces_previous_entry() {
        let cache = ResponseCache::new();
        cache.set("key", json!(1)).await;
        cache.set("key", json!(2)).await;

        assert_eq!(cache.get("key").await.unwrap(), json!(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = ResponseCache::with_ttl(Duration::from_secs(300));
        cache.set("key", json!("payload")).await;

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get("key").await.is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("key").await.is_none());
    }

    #[tokio::test]
    async fn test_clear_returns_prior_count() {
        let cache = ResponseCache::new();
        cache.set("a", json!(1)).await;
        cache.set("b", json!(2)).await;

        assert_eq!(cache.clear().await, 2);
        assert_eq!(cache.clear().await, 0);
        assert!(cache.get("a").await.is_none());
    }
}

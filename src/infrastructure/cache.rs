use axum::body::Bytes;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Key prefix of the cached home feed.
pub const INDEX_PAGE_KEY_PREFIX: &str = "index_page";

/// Cache entry holding rendered bytes and the moment they were stored
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Bytes,
    pub inserted_at: Instant,
}

impl CacheEntry {
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            inserted_at: Instant::now(),
        }
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() >= ttl
    }
}

/// Process-wide cache of rendered page fragments.
///
/// Entries live for a fixed TTL and are never invalidated by writes; only
/// [`FragmentCache::clear`] drops them early. Two requests racing on a miss
/// both render and the later `insert` wins.
pub struct FragmentCache {
    inner: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl FragmentCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stored bytes for `key` unless missing or older than the TTL.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let mut inner = self.lock();
        match inner.get(key) {
            Some(entry) if !entry.is_expired(self.ttl) => {
                debug!("Page cache hit for {}", key);
                Some(entry.data.clone())
            }
            Some(_) => {
                debug!("Page cache entry for {} expired", key);
                inner.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: impl Into<String>, data: Bytes) {
        self.lock().put(key.into(), CacheEntry::new(data));
    }

    pub fn remove(&self, key: &str) -> Option<Bytes> {
        self.lock().pop(key).map(|entry| entry.data)
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, CacheEntry>> {
        // A panic while holding the lock cannot leave an entry half-written.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Cache key of one page of the home feed, e.g. `index_page:/?page=2`.
pub fn index_page_key(path_and_query: &str) -> String {
    format!("{}:{}", INDEX_PAGE_KEY_PREFIX, path_and_query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_served_until_ttl_elapses() {
        let cache = FragmentCache::new(10, Duration::from_secs(20));
        cache.insert("index_page:/", Bytes::from_static(b"first"));

        tokio::time::advance(Duration::from_secs(19)).await;
        assert_eq!(cache.get("index_page:/"), Some(Bytes::from_static(b"first")));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("index_page:/"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_drops_everything() {
        let cache = FragmentCache::new(10, Duration::from_secs(20));
        cache.insert(index_page_key("/"), Bytes::from_static(b"a"));
        cache.insert(index_page_key("/?page=2"), Bytes::from_static(b"b"));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.get(&index_page_key("/")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_least_recent() {
        let cache = FragmentCache::new(1, Duration::from_secs(20));
        cache.insert("a", Bytes::from_static(b"a"));
        cache.insert("b", Bytes::from_static(b"b"));
        assert!(cache.get("a").is_none());
        assert_eq!(cache.remove("b"), Some(Bytes::from_static(b"b")));
    }
}

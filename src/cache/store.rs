//! Guarded Store
//!
//! Mutex-protected [`LruCache`] of [`ByteView`]s. The LRU is allocated on
//! the first write so an empty group costs nothing.

use std::sync::Arc;

use parking_lot::Mutex;

use super::byteview::ByteView;
use super::lru::LruCache;
use super::metrics::GroupStats;

/// Thread-safe, lazily allocated byte-budgeted store
pub struct GuardedCache {
    /// Budget handed to the LRU on first write
    cache_bytes: i64,
    lru: Mutex<Option<LruCache<ByteView>>>,
    /// Evictions are reported here when set
    stats: Option<Arc<GroupStats>>,
}

impl GuardedCache {
    /// Create a store with the given byte budget (`<= 0` = unbounded)
    pub fn new(cache_bytes: i64) -> Self {
        Self {
            cache_bytes,
            lru: Mutex::new(None),
            stats: None,
        }
    }

    /// Create a store that counts evictions into `stats`
    pub fn with_stats(cache_bytes: i64, stats: Arc<GroupStats>) -> Self {
        Self {
            stats: Some(stats),
            ..Self::new(cache_bytes)
        }
    }

    /// Insert or update, allocating the LRU on first write
    pub fn add(&self, key: &str, value: ByteView) {
        let mut guard = self.lru.lock();
        let lru = guard.get_or_insert_with(|| {
            let on_evicted = self.stats.clone().map(|stats| {
                Box::new(move |_: &str, _: &ByteView| stats.record_eviction())
                    as super::lru::OnEvicted<ByteView>
            });
            LruCache::new(self.cache_bytes, on_evicted)
        });
        lru.put(key, value);
    }

    /// Clone of the value for `key`, marking it most recently used
    pub fn get(&self, key: &str) -> Option<ByteView> {
        let mut guard = self.lru.lock();
        guard.as_mut()?.get(key).cloned()
    }

    /// Presence check that leaves recency untouched
    pub fn contains(&self, key: &str) -> bool {
        self.lru
            .lock()
            .as_ref()
            .is_some_and(|lru| lru.contains(key))
    }

    /// Bytes currently held
    pub fn bytes(&self) -> i64 {
        self.lru.lock().as_ref().map_or(0, |lru| lru.bytes())
    }

    /// Number of entries currently held
    pub fn items(&self) -> usize {
        self.lru.lock().as_ref().map_or(0, |lru| lru.len())
    }

    /// Configured byte budget
    pub fn capacity(&self) -> i64 {
        self.cache_bytes
    }
}

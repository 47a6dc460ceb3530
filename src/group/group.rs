//! Group - Read-Through Cache Orchestrator
//!
//! Serves a lookup from the local store, the owning peer, or the local
//! getter, in that order:
//!
//! ```text
//! get(key)
//!   ├─ empty key ─────────────▶ Error::EmptyKey
//!   ├─ local store hit ───────▶ value
//!   └─ Flight::work(key, load)
//!        ├─ peer owns key ─── fetch ok ──▶ value (not stored locally)
//!        │                 └─ fetch err ─┐
//!        └─ self owns key ───────────────┴▶ getter ─▶ store ─▶ value
//! ```

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::cache::{ByteView, GroupStats, GuardedCache, StatsSnapshot};
use crate::domain::{FetchRequest, Getter, PeerGetter, PeerPicker};
use crate::error::{Error, Result};
use crate::singleflight::Flight;

/// A named cache namespace with its own store, getter and peers
pub struct Group {
    name: String,
    /// Computes values on miss
    getter: Arc<dyn Getter>,
    /// Local store; only locally computed values land here
    main_cache: GuardedCache,
    /// Set at most once
    peers: OnceCell<Arc<dyn PeerPicker>>,
    /// Coalesces concurrent loads of the same key
    loader: Flight<Result<ByteView>>,
    stats: Arc<GroupStats>,
}

impl Group {
    /// Create a detached group. Most callers want
    /// [`GroupRegistry::new_group`](super::GroupRegistry::new_group) so peers
    /// can find the group by name.
    pub fn new(name: impl Into<String>, cache_bytes: i64, getter: Arc<dyn Getter>) -> Self {
        let stats = Arc::new(GroupStats::new());
        Self {
            name: name.into(),
            getter,
            main_cache: GuardedCache::with_stats(cache_bytes, Arc::clone(&stats)),
            peers: OnceCell::new(),
            loader: Flight::new(),
            stats,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach the peer router. Topology is fixed for the group's lifetime,
    /// so a second call is a configuration error.
    pub fn register_peers(&self, peers: Arc<dyn PeerPicker>) -> Result<()> {
        self.peers
            .set(peers)
            .map_err(|_| Error::PeersAlreadyRegistered(self.name.clone()))
    }

    /// Look up `key`, loading it on miss
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        self.stats.record_get();
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }

        if let Some(value) = self.main_cache.get(key) {
            self.stats.record_cache_hit();
            debug!(group = %self.name, key, "cache hit");
            return Ok(value);
        }

        self.load(key).await
    }

    #[instrument(skip(self), fields(group = %self.name))]
    async fn load(&self, key: &str) -> Result<ByteView> {
        self.stats.record_load();
        self.loader
            .work(key, || async {
                self.stats.record_load_deduped();

                if let Some(peer) = self.peers.get().and_then(|p| p.pick_peer(key)) {
                    match self.get_from_peer(peer.as_ref(), key).await {
                        Ok(value) => {
                            self.stats.record_peer_load();
                            return Ok(value);
                        }
                        Err(e) => {
                            self.stats.record_peer_error();
                            warn!(
                                group = %self.name,
                                key,
                                error = %e,
                                "failed to get from peer, loading locally"
                            );
                        }
                    }
                }

                self.get_locally(key).await
            })
            .await
    }

    async fn get_from_peer(&self, peer: &dyn PeerGetter, key: &str) -> Result<ByteView> {
        let request = FetchRequest::new(self.name.as_str(), key);
        let response = peer.fetch(&request).await?;
        Ok(ByteView::new(response.value))
    }

    async fn get_locally(&self, key: &str) -> Result<ByteView> {
        let bytes = match self.getter.get(key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.stats.record_local_load_err();
                return Err(e);
            }
        };
        self.stats.record_local_load();
        debug!(group = %self.name, key, len = bytes.len(), "loaded locally");

        let value = ByteView::new(bytes);
        self.populate_cache(key, value.clone());
        Ok(value)
    }

    fn populate_cache(&self, key: &str, value: ByteView) {
        self.main_cache.add(key, value);
    }

    /// Whether `key` is held in this node's store (recency untouched)
    pub fn is_cached(&self, key: &str) -> bool {
        self.main_cache.contains(key)
    }

    /// Counters for this group
    pub fn stats(&self) -> &GroupStats {
        &self.stats
    }

    /// Counters plus store occupancy
    pub fn snapshot(&self) -> GroupSnapshot {
        GroupSnapshot {
            name: self.name.clone(),
            stats: self.stats.snapshot(),
            cache_bytes: self.main_cache.bytes(),
            cache_items: self.main_cache.items(),
            capacity_bytes: self.main_cache.capacity(),
        }
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("capacity_bytes", &self.main_cache.capacity())
            .field("peers_registered", &self.peers.get().is_some())
            .finish()
    }
}

/// Serializable view of a group's state
#[derive(Debug, Clone, Serialize)]
pub struct GroupSnapshot {
    pub name: String,
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    pub cache_bytes: i64,
    pub cache_items: usize,
    pub capacity_bytes: i64,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FetchResponse, GetterFn};
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn db() -> HashMap<&'static str, &'static str> {
        HashMap::from([("zurich", "100"), ("alfred", "92"), ("tomcat", "79")])
    }

    /// Getter over `db()` that counts loads per key
    fn counting_getter() -> (Arc<dyn Getter>, Arc<Mutex<HashMap<String, usize>>>) {
        let counts = Arc::new(Mutex::new(HashMap::new()));
        let seen = Arc::clone(&counts);
        let getter = GetterFn::new(move |key: &str| {
            *seen.lock().entry(key.to_string()).or_insert(0) += 1;
            db().get(key)
                .map(|v| v.as_bytes().to_vec())
                .ok_or_else(|| Error::NotFound(key.to_string()))
        });
        (Arc::new(getter), counts)
    }

    struct StaticPeer {
        value: &'static [u8],
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PeerGetter for StaticPeer {
        async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.group, "scores");
            Ok(FetchResponse::new(self.value))
        }
    }

    struct FailingPeer;

    #[async_trait]
    impl PeerGetter for FailingPeer {
        async fn fetch(&self, _request: &FetchRequest) -> Result<FetchResponse> {
            Err(Error::PeerStatus {
                peer: "http://localhost:8002".to_string(),
                status: 500,
            })
        }
    }

    /// Routes every key to the same peer, or to self when `peer` is None
    struct FixedPicker(Option<Arc<dyn PeerGetter>>);

    impl PeerPicker for FixedPicker {
        fn pick_peer(&self, _key: &str) -> Option<Arc<dyn PeerGetter>> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn test_get_loads_then_hits() {
        let (getter, counts) = counting_getter();
        let group = Group::new("scores", 2 << 10, getter);

        for (k, v) in db() {
            let view = group.get(k).await.unwrap();
            assert_eq!(view.to_string(), v);

            let view = group.get(k).await.unwrap();
            assert_eq!(view.to_string(), v);
            assert_eq!(counts.lock()[k], 1, "cache {} miss", k);
        }

        assert_eq!(group.stats().cache_hits(), 3);
        assert_eq!(group.stats().local_loads(), 3);
    }

    #[tokio::test]
    async fn test_unknown_key_is_not_found_and_not_cached() {
        let (getter, counts) = counting_getter();
        let group = Group::new("scores", 2 << 10, getter);

        assert_matches!(group.get("unknown").await, Err(Error::NotFound(k)) if k == "unknown");
        assert_matches!(group.get("unknown").await, Err(Error::NotFound(_)));

        assert_eq!(counts.lock()["unknown"], 2);
        assert!(!group.is_cached("unknown"));
        assert_eq!(group.snapshot().stats.local_load_errs, 2);
    }

    #[tokio::test]
    async fn test_empty_key_rejected_before_getter() {
        let (getter, counts) = counting_getter();
        let group = Group::new("scores", 2 << 10, getter);

        assert_matches!(group.get("").await, Err(Error::EmptyKey));
        assert!(counts.lock().is_empty());
        assert_eq!(group.stats().gets(), 1);
    }

    #[tokio::test]
    async fn test_remote_owned_key_not_cached_locally() {
        let (getter, counts) = counting_getter();
        let group = Group::new("scores", 2 << 10, getter);
        let peer = Arc::new(StaticPeer {
            value: b"remote",
            calls: AtomicUsize::new(0),
        });
        let remote: Arc<dyn PeerGetter> = peer.clone();
        group
            .register_peers(Arc::new(FixedPicker(Some(remote))))
            .unwrap();

        let view = group.get("zurich").await.unwrap();
        assert_eq!(view.to_string(), "remote");
        assert!(!group.is_cached("zurich"));
        assert!(counts.lock().is_empty());

        // still not cached: the next lookup goes back to the peer
        group.get("zurich").await.unwrap();
        assert_eq!(peer.calls.load(Ordering::SeqCst), 2);
        assert_eq!(group.stats().peer_loads(), 2);
    }

    #[tokio::test]
    async fn test_peer_failure_falls_back_to_getter() {
        let (getter, counts) = counting_getter();
        let group = Group::new("scores", 2 << 10, getter);
        let failing: Arc<dyn PeerGetter> = Arc::new(FailingPeer);
        group
            .register_peers(Arc::new(FixedPicker(Some(failing))))
            .unwrap();

        let view = group.get("alfred").await.unwrap();
        assert_eq!(view.to_string(), "92");
        assert!(group.is_cached("alfred"));
        assert_eq!(counts.lock()["alfred"], 1);
        assert_eq!(group.stats().peer_errors(), 1);
    }

    #[tokio::test]
    async fn test_peer_failure_then_getter_failure_returns_getter_error() {
        let (getter, _) = counting_getter();
        let group = Group::new("scores", 2 << 10, getter);
        let failing: Arc<dyn PeerGetter> = Arc::new(FailingPeer);
        group
            .register_peers(Arc::new(FixedPicker(Some(failing))))
            .unwrap();

        assert_matches!(group.get("nobody").await, Err(Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_self_owned_key_loads_locally() {
        let (getter, counts) = counting_getter();
        let group = Group::new("scores", 2 << 10, getter);
        group.register_peers(Arc::new(FixedPicker(None))).unwrap();

        group.get("tomcat").await.unwrap();
        assert!(group.is_cached("tomcat"));
        assert_eq!(counts.lock()["tomcat"], 1);
    }

    #[tokio::test]
    async fn test_register_peers_twice_fails() {
        let (getter, _) = counting_getter();
        let group = Group::new("scores", 0, getter);

        group.register_peers(Arc::new(FixedPicker(None))).unwrap();
        assert_matches!(
            group.register_peers(Arc::new(FixedPicker(None))),
            Err(Error::PeersAlreadyRegistered(name)) if name == "scores"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_load_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let getter = GetterFn::new(move |key: &str| {
            seen.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(100));
            Ok(format!("value-of-{}", key).into_bytes())
        });
        let group = Arc::new(Group::new("slow", 0, Arc::new(getter)));
        let barrier = Arc::new(tokio::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let group = Arc::clone(&group);
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    group.get("k").await
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().to_string(), "value-of-k");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_share_one_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let getter = GetterFn::new(move |key: &str| {
            seen.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(100));
            Err(Error::NotFound(key.to_string()))
        });
        let group = Arc::new(Group::new("slow", 0, Arc::new(getter)));
        let barrier = Arc::new(tokio::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let group = Arc::clone(&group);
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    group.get("k").await
                })
            })
            .collect();

        for handle in handles {
            assert_matches!(handle.await.unwrap(), Err(Error::NotFound(key)) if key == "k");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!group.is_cached("k"));
        assert_eq!(group.snapshot().stats.local_load_errs, 1);
    }

    #[tokio::test]
    async fn test_eviction_respects_capacity() {
        let getter = GetterFn::new(|_key: &str| Ok(vec![b'x'; 10]));
        // room for two 12-byte entries
        let group = Group::new("small", 24, Arc::new(getter));

        group.get("k1").await.unwrap();
        group.get("k2").await.unwrap();
        group.get("k3").await.unwrap();

        assert!(!group.is_cached("k1"));
        assert!(group.is_cached("k2"));
        assert!(group.is_cached("k3"));

        let snapshot = group.snapshot();
        assert_eq!(snapshot.cache_items, 2);
        assert_eq!(snapshot.cache_bytes, 24);
        assert_eq!(snapshot.stats.evictions, 1);
    }

    #[test]
    fn test_snapshot_serializes_flat() {
        let getter = GetterFn::new(|_key: &str| Ok(Vec::new()));
        let group = Group::new("flat", 64, Arc::new(getter));

        let json = serde_json::to_value(group.snapshot()).unwrap();
        assert_eq!(json["name"], "flat");
        assert_eq!(json["gets"], 0);
        assert_eq!(json["capacity_bytes"], 64);
    }
}

//! Group Statistics
//!
//! Lock-free counters describing how a group's lookups were served.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Per-group counters
#[derive(Debug, Default)]
pub struct GroupStats {
    /// Every `get` call, including rejected ones
    gets: AtomicU64,
    /// Served from the local store
    cache_hits: AtomicU64,
    /// Remote fetches that succeeded
    peer_loads: AtomicU64,
    /// Remote fetches that failed and fell back to local compute
    peer_errors: AtomicU64,
    /// Misses that entered the coalescer
    loads: AtomicU64,
    /// Loads actually executed after coalescing
    loads_deduped: AtomicU64,
    /// Successful local computes
    local_loads: AtomicU64,
    /// Failed local computes
    local_load_errs: AtomicU64,
    /// Lookups requested by peers over the transport
    server_requests: AtomicU64,
    /// Entries dropped from the local store
    evictions: AtomicU64,
}

impl GroupStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_get(&self) {
        self.gets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_peer_load(&self) {
        self.peer_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_peer_error(&self) {
        self.peer_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_deduped(&self) {
        self.loads_deduped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_local_load(&self) {
        self.local_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_local_load_err(&self) {
        self.local_load_errs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_server_request(&self) {
        self.server_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn gets(&self) -> u64 {
        self.gets.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn local_loads(&self) -> u64 {
        self.local_loads.load(Ordering::Relaxed)
    }

    pub fn peer_loads(&self) -> u64 {
        self.peer_loads.load(Ordering::Relaxed)
    }

    pub fn peer_errors(&self) -> u64 {
        self.peer_errors.load(Ordering::Relaxed)
    }

    /// Hit ratio over all non-rejected gets
    pub fn hit_ratio(&self) -> f64 {
        let hits = self.cache_hits() as f64;
        let total = hits + self.loads.load(Ordering::Relaxed) as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            gets: self.gets(),
            cache_hits: self.cache_hits(),
            peer_loads: self.peer_loads(),
            peer_errors: self.peer_errors(),
            loads: self.loads.load(Ordering::Relaxed),
            loads_deduped: self.loads_deduped.load(Ordering::Relaxed),
            local_loads: self.local_loads(),
            local_load_errs: self.local_load_errs.load(Ordering::Relaxed),
            server_requests: self.server_requests.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Counter values at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub gets: u64,
    pub cache_hits: u64,
    pub peer_loads: u64,
    pub peer_errors: u64,
    pub loads: u64,
    pub loads_deduped: u64,
    pub local_loads: u64,
    pub local_load_errs: u64,
    pub server_requests: u64,
    pub evictions: u64,
}

impl StatsSnapshot {
    /// `(name, value)` pairs in a stable order, for exposition
    pub fn counters(&self) -> [(&'static str, u64); 10] {
        [
            ("gets", self.gets),
            ("cache_hits", self.cache_hits),
            ("peer_loads", self.peer_loads),
            ("peer_errors", self.peer_errors),
            ("loads", self.loads),
            ("loads_deduped", self.loads_deduped),
            ("local_loads", self.local_loads),
            ("local_load_errs", self.local_load_errs),
            ("server_requests", self.server_requests),
            ("evictions", self.evictions),
        ]
    }
}

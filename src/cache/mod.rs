//! Local Cache Domain
//!
//! The process-local half of a group: an immutable value type, a
//! byte-budgeted LRU, and the mutex that guards it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                GuardedCache                  │
//! │  parking_lot::Mutex<Option<LruCache<..>>>    │
//! │  ┌────────────────────────────────────────┐  │
//! │  │ LruCache<ByteView>                     │  │
//! │  │  HashMap<String, slot> + slot arena    │  │
//! │  │  head (MRU) ◀──▶ ... ◀──▶ tail (LRU)   │  │
//! │  └────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Entry size = key length + value length. Evictions are reported to the
//! owning group's [`GroupStats`].

mod byteview;
mod lru;
mod metrics;
mod proptest;
mod store;

pub use byteview::ByteView;
pub use lru::{ByteLen, Iter, LruCache, OnEvicted};
pub use metrics::{GroupStats, StatsSnapshot};
pub use store::GuardedCache;

/// Default group budget used by the demo binary (2 KiB)
pub const DEFAULT_CACHE_BYTES: i64 = 2 << 10;

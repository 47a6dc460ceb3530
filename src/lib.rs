//! zcache - Distributed Read-Through Cache
//!
//! Each node holds a byte-budgeted LRU store per named group. On a miss the
//! key's owner is found on a consistent-hash ring: remote owners are asked
//! over HTTP, and keys this node owns are computed through the group's
//! getter and stored. Concurrent misses for one key share a single load.
//!
//! # Architecture
//!
//! ```text
//!            ┌──────────────┐   miss    ┌──────────────┐  remote  ┌────────────┐
//! get(key) ─▶│ GuardedCache │──────────▶│    Flight    │─────────▶│ HttpGetter │──▶ peer
//!            │    (LRU)     │           │ (coalescer)  │          └────────────┘
//!            └──────────────┘           └──────┬───────┘
//!                    ▲                         │ local / peer failed
//!                    └──────── store ──── Getter (user source)
//! ```
//!
//! # Modules
//!
//! - [`adapters`] - HTTP implementations of the peer ports
//! - [`cache`] - LRU store, byte views and counters
//! - [`consistent_hash`] - Hash ring mapping keys to peers
//! - [`domain`] - Ports and the peer wire protocol
//! - [`error`] - Error types
//! - [`group`] - Group orchestrator and registry
//! - [`server`] - Peer and API HTTP servers
//! - [`singleflight`] - Per-key call coalescing

pub mod adapters;
pub mod cache;
pub mod consistent_hash;
pub mod domain;
pub mod error;
pub mod group;
pub mod server;
pub mod singleflight;

pub use adapters::{HttpGetter, HttpPool, HttpPoolOptions};
pub use cache::{ByteView, GuardedCache, LruCache};
pub use consistent_hash::HashRing;
pub use domain::{FetchRequest, FetchResponse, Getter, GetterFn, PeerGetter, PeerPicker};
pub use error::{Error, Result};
pub use group::{Group, GroupRegistry};
pub use singleflight::Flight;

//! Infrastructure Adapters
//!
//! HTTP implementations of the domain's peer ports.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Domain Layer                              │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │                    Ports (Traits)                           │ │
//! │  │           Getter │ PeerPicker │ PeerGetter                  │ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Adapters (This Module)                       │
//! │  ┌────────────────────────────────────────────────────────────┐ │
//! │  │   HttpPool (PeerPicker)  ──owns──▶  HttpGetter (PeerGetter) │ │
//! │  └────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use zcache::adapters::HttpPool;
//! use zcache::group::GroupRegistry;
//!
//! let registry = GroupRegistry::global();
//! let pool = Arc::new(HttpPool::new("http://localhost:8001", registry.clone())?);
//! pool.set(["http://localhost:8001", "http://localhost:8002"]);
//! group.register_peers(pool.clone())?;
//! ```

mod http_getter;
mod http_pool;

pub use http_getter::HttpGetter;
pub use http_pool::{HttpPool, HttpPoolOptions, DEFAULT_BASE_PATH};

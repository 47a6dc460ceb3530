//! Domain Layer
//!
//! Capabilities the cache core depends on, and the messages that cross the
//! peer boundary.
//!
//! # Architecture
//!
//! - **Ports** (`ports.rs`) - `Getter`, `PeerPicker`, `PeerGetter`
//! - **Protocol** (`protocol.rs`) - `FetchRequest` / `FetchResponse` and
//!   the response wire codec
//!
//! # Usage
//!
//! ```ignore
//! use zcache::domain::{FetchRequest, PeerPicker};
//!
//! if let Some(peer) = picker.pick_peer(key) {
//!     let response = peer.fetch(&FetchRequest::new("scores", key)).await?;
//!     // ...
//! }
//! ```

pub mod ports;
pub mod protocol;

pub use ports::{Getter, GetterFn, PeerGetter, PeerPicker};
pub use protocol::{FetchRequest, FetchResponse};

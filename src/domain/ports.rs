//! Domain Ports (Port/Adapter Pattern)
//!
//! Capabilities a [`Group`](crate::group::Group) depends on but does not
//! implement. Adapters provide concrete implementations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Domain Layer                            │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                    Ports (Traits)                    │    │
//! │  │        Getter │ PeerPicker │ PeerGetter              │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Infrastructure Layer                       │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                  Adapters (Impls)                    │    │
//! │  │        GetterFn │ HttpPool │ HttpGetter              │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::protocol::{FetchRequest, FetchResponse};
use crate::error::Result;

// =============================================================================
// Getter Port
// =============================================================================

/// Computes a value on cache miss.
///
/// An error means the value is unavailable; it is returned to the caller
/// and never cached.
///
/// # Example
///
/// ```ignore
/// struct SlowDb { /* ... */ }
///
/// #[async_trait]
/// impl Getter for SlowDb {
///     async fn get(&self, key: &str) -> Result<Vec<u8>> {
///         // Query the backing store
///     }
/// }
/// ```
#[async_trait]
pub trait Getter: Send + Sync {
    async fn get(&self, key: &str) -> Result<Vec<u8>>;
}

/// Adapter turning a plain closure into a [`Getter`]
pub struct GetterFn<F>(pub F);

impl<F> GetterFn<F>
where
    F: Fn(&str) -> Result<Vec<u8>> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> Getter for GetterFn<F>
where
    F: Fn(&str) -> Result<Vec<u8>> + Send + Sync,
{
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        (self.0)(key)
    }
}

impl<F> fmt::Debug for GetterFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetterFn").finish_non_exhaustive()
    }
}

// =============================================================================
// Peer Ports
// =============================================================================

/// Fetches a value from one remote peer.
#[async_trait]
pub trait PeerGetter: Send + Sync {
    /// Round-trip `request` to the peer
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}

/// Decides which peer owns a key.
pub trait PeerPicker: Send + Sync {
    /// The owning peer, or `None` when this node owns the key (or no peers
    /// are configured)
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}

// =============================================================================
// Tests
// =============================================================================

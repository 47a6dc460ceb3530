//! Consistent Hashing
//!
//! Virtual-node hash ring used to decide which peer owns a key.

pub mod crc32;
mod ring;

pub use ring::{Hash, HashRing};

/// Default virtual nodes per peer
pub const DEFAULT_REPLICAS: usize = 50;

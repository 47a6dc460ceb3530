//! Hash Ring
//!
//! Maps string keys onto a set of peers using virtual nodes. Each peer is
//! placed on the ring `replicas` times, at `hash(i ++ peer)` for
//! `i in 0..replicas`; a key belongs to the first position clockwise from
//! its own hash.

use std::collections::HashMap;

use super::crc32;

/// Pluggable 32-bit hash
pub type Hash = fn(&[u8]) -> u32;

/// Consistent-hash ring of peer identifiers
#[derive(Debug, Clone)]
pub struct HashRing {
    hash: Hash,
    /// Virtual nodes per peer
    replicas: usize,
    /// Sorted ring positions
    keys: Vec<u32>,
    /// Position -> owning peer
    owners: HashMap<u32, String>,
}

impl HashRing {
    /// Create an empty ring hashed with CRC-32 (IEEE)
    pub fn new(replicas: usize) -> Self {
        Self::with_hash(replicas, crc32::checksum_ieee)
    }

    /// Create an empty ring with a custom hash
    pub fn with_hash(replicas: usize, hash: Hash) -> Self {
        Self {
            hash,
            replicas,
            keys: Vec::new(),
            owners: HashMap::new(),
        }
    }

    /// Place each peer on the ring `replicas` times.
    ///
    /// Existing positions are kept; to route over exactly a new peer set,
    /// build a fresh ring.
    pub fn add<I, S>(&mut self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for peer in peers {
            let peer = peer.as_ref();
            for i in 0..self.replicas {
                let position = (self.hash)(format!("{}{}", i, peer).as_bytes());
                self.keys.push(position);
                self.owners.insert(position, peer.to_string());
            }
        }
        self.keys.sort_unstable();
    }

    /// Peer owning `key`, or `None` when the ring is empty
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }
        let hash = (self.hash)(key.as_bytes());
        let idx = self.keys.partition_point(|&position| position < hash);
        // past the last position wraps to the first
        let position = self.keys[idx % self.keys.len()];
        self.owners.get(&position).map(String::as_str)
    }

    /// Number of virtual positions on the ring
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }
}

// =============================================================================
// Tests
// =============================================================================

//! HTTP Peer Pool
//!
//! Owns this node's view of the cluster: a hash ring over every peer
//! address plus one [`HttpGetter`] per address. Implements `PeerPicker` so
//! groups can route keys to their owners; the server side lives in
//! [`crate::server`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::Client;
use tracing::{debug, info};

use super::http_getter::HttpGetter;
use crate::consistent_hash::{crc32, Hash, HashRing, DEFAULT_REPLICAS};
use crate::domain::ports::{PeerGetter, PeerPicker};
use crate::error::{Error, Result};
use crate::group::GroupRegistry;

/// URL prefix peers serve cache requests under
pub const DEFAULT_BASE_PATH: &str = "/_zcache/";

/// Tunables for an [`HttpPool`]
#[derive(Clone)]
pub struct HttpPoolOptions {
    /// Must start and end with `/`
    pub base_path: String,
    /// Virtual nodes per peer
    pub replicas: usize,
    /// Ring hash; every node in a cluster must agree on it
    pub hash: Hash,
    /// Per-request timeout for peer fetches
    pub fetch_timeout: Duration,
}

impl Default for HttpPoolOptions {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            replicas: DEFAULT_REPLICAS,
            hash: crc32::checksum_ieee,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

impl fmt::Debug for HttpPoolOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPoolOptions")
            .field("base_path", &self.base_path)
            .field("replicas", &self.replicas)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

struct PoolState {
    ring: HashRing,
    getters: HashMap<String, Arc<HttpGetter>>,
}

/// Peer router and request target for one node
pub struct HttpPool {
    /// This node's own address, e.g. `http://localhost:8001`
    self_addr: String,
    options: HttpPoolOptions,
    registry: Arc<GroupRegistry>,
    client: Client,
    /// Ring and getters are swapped together by `set`
    state: Mutex<PoolState>,
}

impl HttpPool {
    /// Pool with default options
    pub fn new(self_addr: impl Into<String>, registry: Arc<GroupRegistry>) -> Result<Self> {
        Self::with_options(self_addr, registry, HttpPoolOptions::default())
    }

    pub fn with_options(
        self_addr: impl Into<String>,
        registry: Arc<GroupRegistry>,
        options: HttpPoolOptions,
    ) -> Result<Self> {
        if !options.base_path.starts_with('/') || !options.base_path.ends_with('/') {
            return Err(Error::Config(format!(
                "base path must start and end with '/': {:?}",
                options.base_path
            )));
        }
        if options.replicas == 0 {
            return Err(Error::Config("replicas must be at least 1".into()));
        }

        let client = Client::builder()
            .timeout(options.fetch_timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        let ring = HashRing::with_hash(options.replicas, options.hash);
        Ok(Self {
            self_addr: self_addr.into(),
            options,
            registry,
            client,
            state: Mutex::new(PoolState {
                ring,
                getters: HashMap::new(),
            }),
        })
    }

    pub fn self_addr(&self) -> &str {
        &self.self_addr
    }

    pub fn base_path(&self) -> &str {
        &self.options.base_path
    }

    pub fn registry(&self) -> &Arc<GroupRegistry> {
        &self.registry
    }

    /// Replace the peer set. `peers` should include this node's own address
    /// so every node builds the same ring.
    pub fn set<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let peers: Vec<String> = peers.into_iter().map(|p| p.as_ref().to_string()).collect();

        let mut ring = HashRing::with_hash(self.options.replicas, self.options.hash);
        ring.add(&peers);

        let getters = peers
            .iter()
            .map(|peer| {
                let getter = HttpGetter::new(
                    format!("{}{}", peer, self.options.base_path),
                    self.client.clone(),
                );
                (peer.clone(), Arc::new(getter))
            })
            .collect();

        *self.state.lock() = PoolState { ring, getters };
        info!(node = %self.self_addr, peers = ?peers, "peer set updated");
    }

    /// Addresses currently in the ring, sorted
    pub fn peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.state.lock().getters.keys().cloned().collect();
        peers.sort();
        peers
    }

    /// Owning address for `key`, which may be this node
    pub fn owner(&self, key: &str) -> Option<String> {
        self.state.lock().ring.get(key).map(str::to_string)
    }
}

impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        let state = self.state.lock();
        let owner = state.ring.get(key)?;
        if owner == self.self_addr {
            return None;
        }
        debug!(node = %self.self_addr, peer = owner, key, "pick peer");
        state
            .getters
            .get(owner)
            .map(|getter| Arc::clone(getter) as Arc<dyn PeerGetter>)
    }
}

impl fmt::Debug for HttpPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPool")
            .field("self_addr", &self.self_addr)
            .field("options", &self.options)
            .field("peers", &self.peers())
            .finish()
    }
}

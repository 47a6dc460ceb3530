//! Error types for zcache

use std::sync::Arc;

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving a cache lookup
///
/// `Clone` so a single load outcome can be handed to every caller that was
/// coalesced onto it.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Empty key passed to a lookup
    #[error("key is required")]
    EmptyKey,

    /// The getter has no value for this key
    #[error("{0} not found")]
    NotFound(String),

    /// Any other getter failure, message verbatim
    #[error("{0}")]
    Load(String),

    // =========================================================================
    // Peer Errors
    // =========================================================================
    /// Network-level failure talking to a peer
    #[error("request to peer {peer} failed: {reason}")]
    PeerRequest { peer: String, reason: String },

    /// Peer answered with a non-success status
    #[error("peer {peer} returned status {status}")]
    PeerStatus { peer: String, status: u16 },

    /// Peer response body could not be decoded
    #[error("failed to decode peer response: {0}")]
    Decode(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// No group registered under this name
    #[error("no such group: {0}")]
    GroupNotFound(String),

    /// `register_peers` called more than once on a group
    #[error("peers already registered for group {0}")]
    PeersAlreadyRegistered(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}

impl Error {
    /// True for failures that happened while fetching from a peer
    pub fn is_peer_error(&self) -> bool {
        matches!(
            self,
            Error::PeerRequest { .. } | Error::PeerStatus { .. } | Error::Decode(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_is_verbatim_for_load() {
        let err = Error::Load("tomcat not exist".to_string());
        assert_eq!(err.to_string(), "tomcat not exist");
    }

    #[test]
    fn test_empty_key_message() {
        assert_eq!(Error::EmptyKey.to_string(), "key is required");
    }

    #[test]
    fn test_peer_error_classification() {
        let status = Error::PeerStatus {
            peer: "http://localhost:8002".to_string(),
            status: 500,
        };
        assert!(status.is_peer_error());
        assert!(Error::Decode("truncated".into()).is_peer_error());
        assert!(!Error::NotFound("k".into()).is_peer_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "busy");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.clone().to_string().contains("busy"));
    }
}

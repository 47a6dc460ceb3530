//! HTTP Peer Client
//!
//! Implements the `PeerGetter` port by issuing
//! `GET <peer><base_path><group>/<key>` and decoding the response body.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

use crate::domain::ports::PeerGetter;
use crate::domain::protocol::{FetchRequest, FetchResponse};
use crate::error::{Error, Result};

/// Client handle for one remote peer
#[derive(Debug, Clone)]
pub struct HttpGetter {
    /// `<peer address><base path>`, e.g. `http://localhost:8002/_zcache/`
    base_url: String,
    client: Client,
}

impl HttpGetter {
    /// Create a getter sharing an existing HTTP client
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for a request
    pub fn url_for(&self, request: &FetchRequest) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            urlencoding::encode(&request.group),
            urlencoding::encode(&request.key)
        )
    }
}

#[async_trait]
impl PeerGetter for HttpGetter {
    #[instrument(skip(self, request), fields(peer = %self.base_url, key = %request.key))]
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let url = self.url_for(request);
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::PeerRequest {
                peer: self.base_url.clone(),
                reason: e.to_string(),
            })?;

        if response.status() != StatusCode::OK {
            return Err(Error::PeerStatus {
                peer: self.base_url.clone(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| Error::PeerRequest {
            peer: self.base_url.clone(),
            reason: format!("reading response body failed: {}", e),
        })?;

        FetchResponse::decode(body)
    }
}

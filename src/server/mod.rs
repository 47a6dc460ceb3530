//! HTTP Servers
//!
//! Two listeners share one hyper accept loop:
//!
//! - [`serve_peers`]: answers `GET <base_path><group>/<key>` from other
//!   nodes with an encoded `FetchResponse`
//! - [`serve_api`]: the client-facing `/api?key=`, plus `/stats`,
//!   `/metrics` and `/healthz`

mod api;
mod metrics;
mod peer;

pub use api::{handle_api_request, serve_api};
pub use metrics::render_metrics;
pub use peer::{handle_peer_request, serve_peers};

use std::convert::Infallible;
use std::future::Future;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::{Error, Result};

pub(crate) const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub(crate) const OCTET_STREAM: &str = "application/octet-stream";
pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Build a response without going through the fallible builder
pub(crate) fn reply(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

pub(crate) fn text(status: StatusCode, body: impl Into<String>) -> Response<Full<Bytes>> {
    reply(status, TEXT_PLAIN, body.into())
}

/// Accept connections on `listener` forever, answering each request with
/// `handler`. Returns only on accept failure.
pub(crate) async fn serve<H, Fut>(
    listener: TcpListener,
    name: &'static str,
    handler: H,
) -> Result<()>
where
    H: Fn(Request<Incoming>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Response<Full<Bytes>>> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!("{} server listening on {}", name, addr);

    loop {
        let (stream, remote) = listener
            .accept()
            .await
            .map_err(|e| Error::Internal(format!("{} server accept error: {}", name, e)))?;

        let io = TokioIo::new(stream);
        let handler = handler.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let response = handler(req);
                async move { Ok::<_, Infallible>(response.await) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!(%remote, "{} server connection error: {}", name, e);
            }
        });
    }
}

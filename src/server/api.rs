//! Client-facing API: `/api?key=`, `/stats`, `/metrics`, `/healthz`

use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use tokio::net::TcpListener;
use tracing::warn;

use super::metrics::render_metrics;
use super::{reply, serve, text, APPLICATION_JSON, OCTET_STREAM, TEXT_PLAIN};
use crate::error::Result;
use crate::group::{Group, GroupRegistry};

/// Serve the API for `group`, with stats for every group in `registry`
pub async fn serve_api(
    registry: Arc<GroupRegistry>,
    group: Arc<Group>,
    listener: TcpListener,
) -> Result<()> {
    serve(listener, "api", move |req| {
        let registry = Arc::clone(&registry);
        let group = Arc::clone(&group);
        let path = req.uri().path().to_string();
        let query = req.uri().query().map(str::to_string);
        async move { handle_api_request(&registry, &group, &path, query.as_deref()).await }
    })
    .await
}

/// Answer one API request
pub async fn handle_api_request(
    registry: &GroupRegistry,
    group: &Group,
    path: &str,
    query: Option<&str>,
) -> Response<Full<Bytes>> {
    match path {
        "/api" => {
            let key = query.and_then(|q| query_param(q, "key")).unwrap_or_default();
            match group.get(&key).await {
                Ok(view) => reply(StatusCode::OK, OCTET_STREAM, view.bytes()),
                Err(e) => text(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            }
        }
        "/stats" => {
            let snapshots: Vec<_> = registry.groups().iter().map(|g| g.snapshot()).collect();
            match serde_json::to_vec(&snapshots) {
                Ok(body) => reply(StatusCode::OK, APPLICATION_JSON, body),
                Err(e) => text(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            }
        }
        "/metrics" => match render_metrics(&registry.groups()) {
            Ok(body) => reply(StatusCode::OK, TEXT_PLAIN, body),
            Err(e) => {
                warn!("failed to render metrics: {}", e);
                text(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        },
        "/healthz" => text(StatusCode::OK, "ok"),
        _ => text(StatusCode::NOT_FOUND, "not found"),
    }
}

/// Value of `name` in a form-encoded query string (`+` is a space)
fn query_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        if k != name {
            return None;
        }
        urlencoding::decode(&v.replace('+', " "))
            .ok()
            .map(|v| v.into_owned())
    })
}

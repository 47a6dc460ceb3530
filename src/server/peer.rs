//! Peer request handling: `GET <base_path><group>/<key>`

use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use tokio::net::TcpListener;
use tracing::{debug, error, instrument};

use super::{reply, serve, text, OCTET_STREAM};
use crate::adapters::HttpPool;
use crate::domain::FetchResponse;
use crate::error::{Error, Result};

/// Serve peer fetches for every group in the pool's registry
pub async fn serve_peers(pool: Arc<HttpPool>, listener: TcpListener) -> Result<()> {
    serve(listener, "peer", move |req| {
        let pool = Arc::clone(&pool);
        let path = req.uri().path().to_string();
        async move { handle_peer_request(&pool, &path).await }
    })
    .await
}

/// Answer one peer request.
///
/// - path outside the base path, or unknown group: 404
/// - path without a `<group>/<key>` pair, or bad escaping: 400
/// - lookup error: 500 with the error text
/// - otherwise 200 with the encoded value
#[instrument(skip(pool), fields(node = %pool.self_addr()))]
pub async fn handle_peer_request(pool: &HttpPool, path: &str) -> Response<Full<Bytes>> {
    let Some(rest) = path.strip_prefix(pool.base_path()) else {
        error!("unexpected path");
        return text(StatusCode::NOT_FOUND, "not found");
    };

    let Some((group_name, key)) = rest.split_once('/') else {
        return text(StatusCode::BAD_REQUEST, "bad request");
    };
    let (Ok(group_name), Ok(key)) = (urlencoding::decode(group_name), urlencoding::decode(key))
    else {
        return text(StatusCode::BAD_REQUEST, "bad request");
    };

    let Some(group) = pool.registry().get_group(&group_name) else {
        error!(group = %group_name, "no such group");
        return text(
            StatusCode::NOT_FOUND,
            Error::GroupNotFound(group_name.into_owned()).to_string(),
        );
    };
    group.stats().record_server_request();
    debug!(group = %group_name, key = %key, "serving peer request");

    match group.get(&key).await {
        Ok(view) => reply(
            StatusCode::OK,
            OCTET_STREAM,
            FetchResponse::new(view.bytes()).encode(),
        ),
        Err(e) => text(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Getter, GetterFn};
    use crate::group::GroupRegistry;
    use http_body_util::BodyExt;

    fn pool() -> HttpPool {
        let registry = Arc::new(GroupRegistry::new());
        let getter: Arc<dyn Getter> = Arc::new(GetterFn::new(|key: &str| match key {
            "zurich" => Ok(b"100".to_vec()),
            "a/b c" => Ok(b"escaped".to_vec()),
            _ => Err(Error::NotFound(key.to_string())),
        }));
        registry.new_group("scores", 2 << 10, getter);
        HttpPool::new("http://localhost:8001", registry).unwrap()
    }

    async fn body(response: Response<Full<Bytes>>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_serves_encoded_value() {
        let pool = pool();
        let response = handle_peer_request(&pool, "/_zcache/scores/zurich").await;

        assert_eq!(response.status(), StatusCode::OK);
        let decoded = FetchResponse::decode(body(response).await).unwrap();
        assert_eq!(&decoded.value[..], b"100");

        let group = pool.registry().get_group("scores").unwrap();
        assert_eq!(group.snapshot().stats.server_requests, 1);
        assert!(group.is_cached("zurich"));
    }

    #[tokio::test]
    async fn test_decodes_escaped_key() {
        let pool = pool();
        let response = handle_peer_request(&pool, "/_zcache/scores/a%2Fb%20c").await;

        assert_eq!(response.status(), StatusCode::OK);
        let decoded = FetchResponse::decode(body(response).await).unwrap();
        assert_eq!(&decoded.value[..], b"escaped");
    }

    #[tokio::test]
    async fn test_missing_key_segment_is_bad_request() {
        let response = handle_peer_request(&pool(), "/_zcache/scores").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_path_outside_base_is_not_found() {
        let response = handle_peer_request(&pool(), "/other/scores/zurich").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_group_is_not_found() {
        let response = handle_peer_request(&pool(), "/_zcache/nope/zurich").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(&body(response).await[..], b"no such group: nope");
    }

    #[tokio::test]
    async fn test_lookup_error_is_server_error() {
        let pool = pool();
        let response = handle_peer_request(&pool, "/_zcache/scores/unknown").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(&body(response).await[..], b"unknown not found");
    }

    #[tokio::test]
    async fn test_empty_key_is_server_error() {
        let response = handle_peer_request(&pool(), "/_zcache/scores/").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(&body(response).await[..], b"key is required");
    }
}

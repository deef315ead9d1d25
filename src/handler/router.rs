//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: health probes, body size
//! limits, and handing the product route to the product handler.

use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::product::{self, ProductRequest};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_LENGTH, USER_AGENT};
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let access_log = state.access_log_enabled();
    let entry = access_log.then(|| access_entry(&req, remote_addr));

    let response = route_request(req, &state).await;

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or_default();
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

fn access_entry<B>(req: &Request<B>, remote_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        remote_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = format!("{:?}", req.version())
        .trim_start_matches("HTTP/")
        .to_string();
    entry.user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry
}

/// Route request based on path and configuration
async fn route_request<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let routes = &state.config.routes;
    let server_name = state.config.http.server_name.as_str();
    let path = req.uri().path();

    // Health check endpoints (highest priority, always fast)
    if routes.health.enabled {
        if path == routes.health.liveness_path {
            return http::build_health_response(None, server_name);
        }
        if path == routes.health.readiness_path {
            return http::build_health_response(Some(state.store.len()), server_name);
        }
    }

    if path != routes.product_path {
        tracing::debug!(%path, "no route");
        return http::build_404_response(path, server_name);
    }

    let max_body_size = state.config.http.max_body_size;
    if let Some(resp) = check_body_size(&req, max_body_size, server_name) {
        return resp;
    }

    let method = req.method().as_str().to_string();
    let id = http::query_param(req.uri().query(), "id");

    let body = match read_body(req.into_body(), max_body_size).await {
        Ok(body) => body,
        Err(BodyError::TooLarge) => return http::build_413_response(max_body_size, server_name),
        Err(BodyError::Read(e)) => {
            tracing::warn!("failed to read request body: {e}");
            return http::build_failure_response(
                StatusCode::BAD_REQUEST,
                "Failed to read request body",
                server_name,
            );
        }
    };

    let request = ProductRequest::new(method, id.as_deref()).with_body(body);
    let response = product::handle(&request, &state.store);
    if !response.is_success() {
        tracing::debug!(
            status = response.status.as_u16(),
            "product request refused: {}",
            response.message().unwrap_or_default()
        );
    }
    http::build_product_response(&response, server_name)
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(
    req: &Request<B>,
    max_body_size: u64,
    server_name: &str,
) -> Option<Response<Full<Bytes>>> {
    let size_str = req.headers().get(CONTENT_LENGTH)?.to_str().ok()?;
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            tracing::warn!("request body too large: {size} bytes (max: {max_body_size})");
            Some(http::build_413_response(max_body_size, server_name))
        }
        Err(_) => {
            tracing::warn!("invalid Content-Length value: '{size_str}', skipping size check");
            None
        }
        _ => None,
    }
}

enum BodyError {
    TooLarge,
    Read(Box<dyn std::error::Error + Send + Sync>),
}

/// Collect the body, refusing anything larger than `limit` bytes
async fn read_body<B>(body: B, limit: u64) -> Result<Bytes, BodyError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(BodyError::TooLarge),
        Err(e) => Err(BodyError::Read(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use hyper::Method;

    fn test_state() -> Arc<AppState> {
        let mut config = Config::load_from("does-not-exist/product-store").unwrap();
        config.logging.access_log = false;
        config.http.max_body_size = 64;
        Arc::new(AppState::new(&config))
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn send(
        state: &Arc<AppState>,
        req: Request<Full<Bytes>>,
    ) -> (StatusCode, serde_json::Value) {
        let addr: SocketAddr = "127.0.0.1:50000".parse().unwrap();
        let resp = handle_request(req, Arc::clone(state), addr).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_product_crud_over_http() {
        let state = test_state();

        let (status, json) = send(
            &state,
            request(Method::POST, "/api/product", r#"{"id":"p1","name":"Widget","price":9.99}"#),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["success"], true);

        let (status, json) = send(&state, request(Method::GET, "/api/product?id=p1", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["data"],
            serde_json::json!({ "id": "p1", "name": "Widget", "price": 9.99 })
        );

        let put = request(Method::PUT, "/api/product?id=p1", r#"{"price":2}"#);
        let (status, _) = send(&state, put).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.store.get("p1").unwrap().price, 2.0);

        let delete = request(Method::DELETE, "/api/product?id=p1", "");
        let (status, json) = send(&state, delete).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], r#"Product with ID "p1" deleted."#);
        assert!(state.store.is_empty());
    }

    #[tokio::test]
    async fn test_encoded_id_is_decoded() {
        let state = test_state();
        send(
            &state,
            request(Method::POST, "/api/product", r#"{"id":"a b","name":"Spaced","price":1}"#),
        )
        .await;
        let (status, json) = send(&state, request(Method::GET, "/api/product?id=a%20b", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["name"], "Spaced");
    }

    #[tokio::test]
    async fn test_unsupported_method_reaches_handler() {
        let state = test_state();
        let (status, json) = send(&state, request(Method::PATCH, "/api/product", "")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(json["message"], "Method PATCH not allowed.");
    }

    #[tokio::test]
    async fn test_unknown_path_is_404_envelope() {
        let state = test_state();
        let (status, json) = send(&state, request(Method::GET, "/api/other", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_health_probes() {
        let state = test_state();
        let (status, json) = send(&state, request(Method::GET, "/healthz", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");

        let (_, json) = send(&state, request(Method::GET, "/readyz", "")).await;
        assert_eq!(json["products"], 0);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let state = test_state();
        let name = "x".repeat(100);
        let body = format!(r#"{{"id":"big","name":"{name}","price":1}}"#);
        let (status, json) = send(&state, request(Method::POST, "/api/product", &body)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json["success"], false);
        assert!(state.store.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_content_length_is_rejected() {
        let state = test_state();
        let mut req = request(Method::POST, "/api/product", "{}");
        req.headers_mut()
            .insert(CONTENT_LENGTH, hyper::header::HeaderValue::from_static("4096"));
        let (status, _) = send(&state, req).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let state = test_state();
        let (status, json) = send(&state, request(Method::POST, "/api/product", "{oops")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
    }
}

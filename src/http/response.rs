//! HTTP response building module
//!
//! Serializes bodies to JSON and wraps them in hyper responses.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE, SERVER};
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::product::{Envelope, ProductResponse};

/// Methods the product route answers
pub const PRODUCT_METHODS: &str = "GET, POST, PUT, DELETE";

const INTERNAL_ERROR_BODY: &str =
    r#"{"success":false,"message":"Internal server error"}"#;

/// Build JSON response
pub fn json_response<T: Serialize>(
    status: StatusCode,
    body: &T,
    server_name: &str,
) -> Response<Full<Bytes>> {
    let (status, json) = match serde_json::to_vec(body) {
        Ok(j) => (status, Bytes::from(j)),
        Err(e) => {
            tracing::error!("failed to serialize response: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Bytes::from_static(INTERNAL_ERROR_BODY.as_bytes()),
            )
        }
    };

    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json");
    if let Ok(value) = HeaderValue::from_str(server_name) {
        builder = builder.header(SERVER, value);
    }

    builder.body(Full::new(json)).unwrap_or_else(|e| {
        log_build_error(status, &e);
        Response::new(Full::new(Bytes::from_static(INTERNAL_ERROR_BODY.as_bytes())))
    })
}

/// Convert a handler result into the wire response
pub fn build_product_response(
    response: &ProductResponse,
    server_name: &str,
) -> Response<Full<Bytes>> {
    let mut resp = json_response(response.status, &response.body, server_name);
    if response.status == StatusCode::METHOD_NOT_ALLOWED {
        resp.headers_mut()
            .insert(ALLOW, HeaderValue::from_static(PRODUCT_METHODS));
    }
    resp
}

/// Failure envelope with an arbitrary status, for host-level refusals
pub fn build_failure_response(
    status: StatusCode,
    message: &str,
    server_name: &str,
) -> Response<Full<Bytes>> {
    json_response(status, &Envelope::failure(message), server_name)
}

/// 404 for paths other than the product route
pub fn build_404_response(path: &str, server_name: &str) -> Response<Full<Bytes>> {
    build_failure_response(
        StatusCode::NOT_FOUND,
        &format!("No route for path \"{path}\"."),
        server_name,
    )
}

/// 413 Payload Too Large response
pub fn build_413_response(max_body_size: u64, server_name: &str) -> Response<Full<Bytes>> {
    build_failure_response(
        StatusCode::PAYLOAD_TOO_LARGE,
        &format!("Request body exceeds {max_body_size} bytes."),
        server_name,
    )
}

#[derive(Serialize)]
struct HealthStatus<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    products: Option<usize>,
}

/// Health probe response; readiness includes the product count
pub fn build_health_response(products: Option<usize>, server_name: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &HealthStatus {
            status: "ok",
            products,
        },
        server_name,
    )
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    tracing::error!("failed to build {status} response: {error}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(resp: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_json_response_headers() {
        let resp = json_response(StatusCode::CREATED, &Envelope::failure("x"), "test/1.0");
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(resp.headers()[SERVER], "test/1.0");
        assert_eq!(body_json(resp).await["message"], "x");
    }

    #[tokio::test]
    async fn test_method_not_allowed_sets_allow() {
        let product = ProductResponse::new(
            StatusCode::METHOD_NOT_ALLOWED,
            Envelope::failure("Method PATCH not allowed."),
        );
        let resp = build_product_response(&product, "test");
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()[ALLOW], PRODUCT_METHODS);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Method PATCH not allowed.");
    }

    #[tokio::test]
    async fn test_health_response() {
        let json = body_json(build_health_response(Some(3), "test")).await;
        assert_eq!(json, serde_json::json!({ "status": "ok", "products": 3 }));

        let json = body_json(build_health_response(None, "test")).await;
        assert_eq!(json, serde_json::json!({ "status": "ok" }));
    }
}

//! Error responses.
//!
//! # Design Decisions
//! - Bodies are `{"error": "..."}`; nothing internal is echoed back
//! - 500 bodies add the correlation ID so support can find the audit entry
//! - 429 carries `Retry-After` in whole seconds

use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::GateError;

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            GateError::Internal { request_id } => (
                status,
                Json(json!({ "error": "Internal server error", "request_id": request_id })),
            )
                .into_response(),
            GateError::RateLimitExceeded { retry_after_secs } => {
                let mut response =
                    (status, Json(json!({ "error": "Rate limit exceeded" }))).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
                response
            }
            other => (status, Json(json!({ "error": other.to_string() }))).into_response(),
        }
    }
}

/// 500 response used when a panic escapes the handler stack.
pub fn panic_response(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let request_id = super::request::new_correlation_id();
    tracing::error!(request_id = %request_id, "Handler panicked");
    GateError::Internal { request_id }.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_rate_limited_has_retry_after() {
        let response = GateError::RateLimitExceeded { retry_after_secs: 60 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "60");
        assert_eq!(body_json(response).await["error"], "Rate limit exceeded");
    }

    #[tokio::test]
    async fn test_internal_hides_cause() {
        let response = GateError::Internal { request_id: "req-1".into() }.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "error": "Internal server error", "request_id": "req-1" }));
    }

    #[tokio::test]
    async fn test_payload_too_large_omits_size() {
        let response = GateError::PayloadTooLarge { size: 123_456, limit: 100_000 }.into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "error": "Payload too large" }));
    }

    #[tokio::test]
    async fn test_panic_response_shape() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["request_id"].as_str().is_some());
        assert!(!body.to_string().contains("boom"));
    }
}

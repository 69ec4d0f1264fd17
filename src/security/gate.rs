//! Request gate for protected endpoints.
//!
//! Checks run in a fixed order and stop at the first failure:
//! method → content type → size → JSON parse → sanitize.
//! Each rejection emits exactly one security event; a request that passes
//! every check emits `REQUEST_VALIDATED`.

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request};
use serde_json::{json, Value};

use crate::audit::{AuditLog, SecurityEvent, SecurityEventKind};
use crate::config::GateConfig;
use crate::error::GateError;
use crate::observability::metrics;
use crate::security::client_ip::extract_client_ip;
use crate::security::limits::{check_body_size, is_json_content_type, read_body, BodyRead};
use crate::security::sanitize::sanitize;

/// Characters of the user agent kept in the validation event.
pub const USER_AGENT_AUDIT_CHARS: usize = 100;

/// Payload field naming the caller.
pub const USER_ID_FIELD: &str = "userId";

/// A request that passed every gate check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    /// Sanitized JSON body.
    pub payload: Value,
    pub user_id: Option<String>,
    pub client_ip: String,
    pub user_agent: Option<String>,
}

impl ValidatedRequest {
    /// Identity used for rate limiting: the declared user, else the client IP.
    pub fn caller_key(&self) -> &str {
        self.user_id.as_deref().unwrap_or(&self.client_ip)
    }
}

pub struct RequestGate {
    limits: GateConfig,
    audit: AuditLog,
}

impl RequestGate {
    pub fn new(limits: GateConfig, audit: AuditLog) -> Self {
        Self { limits, audit }
    }

    /// Run every check against `request` for `endpoint`.
    pub async fn validate(
        &self,
        endpoint: &str,
        request: Request<Body>,
    ) -> Result<ValidatedRequest, GateError> {
        let (parts, body) = request.into_parts();
        let client_ip = extract_client_ip(&parts.headers);

        if parts.method != Method::POST {
            let details = json!({ "method": parts.method.as_str() });
            return Err(self
                .reject(endpoint, &client_ip, GateError::MethodNotAllowed, details)
                .await);
        }

        if !is_json_content_type(&parts.headers) {
            let content_type = parts
                .headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let details = json!({ "content_type": content_type });
            return Err(self
                .reject(endpoint, &client_ip, GateError::InvalidContentType, details)
                .await);
        }

        let bytes = match read_body(body, &parts.headers, self.limits.max_transport_bytes).await {
            Ok(BodyRead::Complete(bytes)) => bytes,
            Ok(BodyRead::Oversized { observed }) => {
                let err = GateError::PayloadTooLarge {
                    size: observed,
                    limit: self.limits.max_body_bytes,
                };
                let details = json!({ "size": observed, "limit": self.limits.max_body_bytes });
                return Err(self.reject(endpoint, &client_ip, err, details).await);
            }
            Err(e) => {
                let message = format!("failed to read request body: {}", e);
                let details = json!({ "error": message });
                return Err(self
                    .reject(endpoint, &client_ip, GateError::InvalidJson(message), details)
                    .await);
            }
        };

        if let Err(err) = check_body_size(bytes.len(), self.limits.max_body_bytes) {
            let details = json!({ "size": bytes.len(), "limit": self.limits.max_body_bytes });
            return Err(self.reject(endpoint, &client_ip, err, details).await);
        }

        let mut payload: Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                let message = e.to_string();
                let details = json!({ "error": message });
                return Err(self
                    .reject(endpoint, &client_ip, GateError::InvalidJson(message), details)
                    .await);
            }
        };

        let stripped = sanitize(&mut payload);
        if stripped > 0 {
            tracing::warn!(endpoint, client_ip = %client_ip, stripped, "Removed forbidden payload keys");
        }

        let user_id = extract_user_id(&payload);
        let user_agent = user_agent(&parts.headers);

        let event = SecurityEvent::new(
            SecurityEventKind::RequestValidated,
            endpoint,
            json!({
                "has_user_id": user_id.is_some(),
                "user_agent": user_agent.as_deref().map(truncate_user_agent),
            }),
        )
        .with_caller(user_id.clone())
        .with_client_ip(client_ip.as_str());
        self.audit.emit(event).await;

        Ok(ValidatedRequest {
            payload,
            user_id,
            client_ip,
            user_agent,
        })
    }

    async fn reject(
        &self,
        endpoint: &str,
        client_ip: &str,
        err: GateError,
        details: Value,
    ) -> GateError {
        if let Some(kind) = err.event_kind() {
            tracing::warn!(endpoint, client_ip, kind = %kind, "Request rejected by gate");
            metrics::record_gate_rejection(kind.as_str());
            let event = SecurityEvent::new(kind, endpoint, details).with_client_ip(client_ip);
            self.audit.emit(event).await;
        }
        err
    }
}

/// The payload's `userId`, when it is a non-empty string.
pub fn extract_user_id(payload: &Value) -> Option<String> {
    payload
        .get(USER_ID_FIELD)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn truncate_user_agent(user_agent: &str) -> String {
    user_agent.chars().take(USER_AGENT_AUDIT_CHARS).collect()
}

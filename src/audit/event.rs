//! Security events and their wire form.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// `resource_type` recorded for every event raised by a protected function.
pub const RESOURCE_TYPE: &str = "edge_function";

/// Kind of security-relevant decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityEventKind {
    InvalidMethod,
    InvalidContentType,
    PayloadTooLarge,
    InvalidJson,
    RateLimitExceeded,
    RequestValidated,
    InternalError,
}

impl SecurityEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityEventKind::InvalidMethod => "INVALID_METHOD",
            SecurityEventKind::InvalidContentType => "INVALID_CONTENT_TYPE",
            SecurityEventKind::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            SecurityEventKind::InvalidJson => "INVALID_JSON",
            SecurityEventKind::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            SecurityEventKind::RequestValidated => "REQUEST_VALIDATED",
            SecurityEventKind::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for SecurityEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable record of one validation or enforcement decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityEvent {
    pub kind: SecurityEventKind,
    /// Endpoint the request targeted.
    pub endpoint: String,
    pub details: Value,
    pub caller_key: Option<String>,
    pub client_ip: Option<String>,
    /// Epoch milliseconds.
    pub timestamp: u64,
}

impl SecurityEvent {
    pub fn new(kind: SecurityEventKind, endpoint: impl Into<String>, details: Value) -> Self {
        Self {
            kind,
            endpoint: endpoint.into(),
            details,
            caller_key: None,
            client_ip: None,
            timestamp: crate::clock::now_millis(),
        }
    }

    pub fn with_caller(mut self, caller_key: Option<String>) -> Self {
        self.caller_key = caller_key;
        self
    }

    pub fn with_client_ip(mut self, client_ip: impl Into<String>) -> Self {
        self.client_ip = Some(client_ip.into());
        self
    }

    /// Convert into the argument record of the hosted logging procedure.
    pub fn to_record(&self) -> AuditRecord {
        AuditRecord {
            action: self.kind.as_str().to_string(),
            resource_type: RESOURCE_TYPE.to_string(),
            resource_id: self.endpoint.clone(),
            old_values: Value::Null,
            new_values: json!({
                "details": self.details,
                "caller_key": self.caller_key,
                "client_ip": self.client_ip,
                "timestamp": self.timestamp,
            }),
            company_id: None,
        }
    }
}

/// Argument shape of the external audit logging procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub old_values: Value,
    pub new_values: Value,
    pub company_id: Option<String>,
}

//! Business handlers behind the gate.

use async_trait::async_trait;
use serde_json::{json, Value};

/// Everything a handler learns about an admitted request.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub endpoint: String,
    pub request_id: String,
    /// Sanitized payload.
    pub payload: Value,
    pub user_id: Option<String>,
    pub client_ip: String,
    /// Full `User-Agent` header; only the audit copy is truncated.
    pub user_agent: Option<String>,
}

/// Failure inside a handler. Never shown to the caller.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The message followed by every cause, joined with `: `.
    pub fn chain(&self) -> String {
        let mut out = self.message.clone();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            out.push_str(": ");
            out.push_str(&err.to_string());
            cause = err.source();
        }
        out
    }
}

/// Business logic for one protected endpoint.
#[async_trait]
pub trait FunctionHandler: Send + Sync {
    async fn call(&self, invocation: Invocation) -> Result<Value, HandlerError>;
}

/// Confirms receipt. Registered for endpoints without their own handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcknowledgeHandler;

#[async_trait]
impl FunctionHandler for AcknowledgeHandler {
    async fn call(&self, invocation: Invocation) -> Result<Value, HandlerError> {
        Ok(json!({
            "endpoint": invocation.endpoint,
            "request_id": invocation.request_id,
            "received_at": crate::clock::now_millis(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_includes_sources() {
        let io = std::io::Error::other("socket closed");
        let err = HandlerError::with_source("model call failed", io);
        assert_eq!(err.to_string(), "model call failed");
        assert_eq!(err.chain(), "model call failed: socket closed");
    }

    #[tokio::test]
    async fn test_acknowledge() {
        let value = AcknowledgeHandler
            .call(Invocation {
                endpoint: "analysis".into(),
                request_id: "r-1".into(),
                payload: json!({}),
                user_id: None,
                client_ip: "unknown".into(),
                user_agent: None,
            })
            .await
            .unwrap();
        assert_eq!(value["endpoint"], "analysis");
        assert_eq!(value["request_id"], "r-1");
    }
}

//! Audit sinks.
//!
//! A sink persists one [`SecurityEvent`] per call. [`AuditLog`] wraps a sink
//! and guarantees that a failed write never reaches the request path.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::audit::event::{SecurityEvent, SecurityEventKind};
use crate::config::AuditConfig;
use crate::observability::metrics;

/// Errors raised while writing an audit record.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("audit procedure returned status {0}")]
    Rejected(u16),

    #[error("invalid audit credentials: {0}")]
    Credentials(String),
}

/// Destination for security events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: SecurityEvent) -> Result<(), AuditError>;
}

/// Calls the hosted platform's logging procedure over HTTP.
pub struct RpcAuditSink {
    client: reqwest::Client,
    rpc_url: String,
}

impl RpcAuditSink {
    pub fn new(config: &AuditConfig) -> Result<Self, AuditError> {
        let mut headers = HeaderMap::new();
        if !config.api_key.is_empty() {
            let key = HeaderValue::from_str(&config.api_key)
                .map_err(|e| AuditError::Credentials(e.to_string()))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| AuditError::Credentials(e.to_string()))?;
            headers.insert("apikey", key);
            headers.insert(AUTHORIZATION, bearer);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            rpc_url: config.rpc_url.clone(),
        })
    }
}

#[async_trait]
impl AuditSink for RpcAuditSink {
    async fn record(&self, event: SecurityEvent) -> Result<(), AuditError> {
        let response = self
            .client
            .post(&self.rpc_url)
            .json(&event.to_record())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuditError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Writes events to the process log. Used when no procedure URL is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: SecurityEvent) -> Result<(), AuditError> {
        match event.kind {
            SecurityEventKind::RequestValidated => tracing::debug!(
                target: "audit",
                kind = %event.kind,
                endpoint = %event.endpoint,
                caller_key = ?event.caller_key,
                client_ip = ?event.client_ip,
                details = %event.details,
                "Security event"
            ),
            _ => tracing::warn!(
                target: "audit",
                kind = %event.kind,
                endpoint = %event.endpoint,
                caller_key = ?event.caller_key,
                client_ip = ?event.client_ip,
                details = %event.details,
                "Security event"
            ),
        }
        Ok(())
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryAuditSink {
    events: Arc<Mutex<Vec<SecurityEvent>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events, oldest first.
    pub fn events(&self) -> Vec<SecurityEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<SecurityEventKind> {
        self.events().iter().map(|e| e.kind).collect()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: SecurityEvent) -> Result<(), AuditError> {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
        Ok(())
    }
}

/// Front door for emitting security events.
#[derive(Clone)]
pub struct AuditLog {
    sink: Arc<dyn AuditSink>,
}

impl AuditLog {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Pick the sink described by the configuration.
    pub fn from_config(config: &AuditConfig) -> Result<Self, AuditError> {
        if config.rpc_url.is_empty() {
            tracing::info!("Audit procedure not configured, security events go to the log");
            return Ok(Self::new(Arc::new(TracingAuditSink)));
        }

        tracing::info!(rpc_url = %config.rpc_url, "Audit events forwarded to logging procedure");
        Ok(Self::new(Arc::new(RpcAuditSink::new(config)?)))
    }

    /// Write one event. Failures are logged and dropped.
    pub async fn emit(&self, event: SecurityEvent) {
        let kind = event.kind;
        let endpoint = event.endpoint.clone();

        if let Err(e) = self.sink.record(event).await {
            metrics::record_audit_failure();
            tracing::error!(kind = %kind, endpoint = %endpoint, error = %e, "Failed to write audit event");
        }
    }
}

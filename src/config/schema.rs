//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the edge guard.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request gate limits.
    pub gate: GateConfig,

    /// Rate limiting configuration, including per-endpoint quotas.
    pub rate_limit: RateLimitConfig,

    /// Cross-origin settings applied to every protected endpoint.
    pub cors: CorsConfig,

    /// Audit sink settings.
    pub audit: AuditConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Limits enforced by the request gate.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GateConfig {
    /// Largest accepted body, in bytes. A body of exactly this size passes.
    pub max_body_bytes: usize,

    /// Hard cap on how much of a body is ever buffered.
    pub max_transport_bytes: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 100_000,
            max_transport_bytes: 1024 * 1024,
        }
    }
}

/// Admission quota for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointQuota {
    /// Maximum admitted requests per trailing window.
    pub max: u32,

    /// Window length in milliseconds.
    pub window_ms: u64,
}

impl EndpointQuota {
    pub const fn new(max: u32, window_ms: u64) -> Self {
        Self { max, window_ms }
    }

    /// Seconds advertised in `Retry-After` when this quota rejects.
    pub fn retry_after_secs(&self) -> u64 {
        self.window_ms.div_ceil(1000)
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Chance that a single check also sweeps every tracked key.
    pub sweep_probability: f64,

    /// Interval of the background sweeper in seconds (0 disables it).
    pub sweep_interval_secs: u64,

    /// Quotas keyed by endpoint name. Only endpoints listed here are served.
    pub endpoints: BTreeMap<String, EndpointQuota>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let mut endpoints = BTreeMap::new();
        endpoints.insert("analysis".to_string(), EndpointQuota::new(10, 60_000));
        endpoints.insert("verification".to_string(), EndpointQuota::new(50, 60_000));
        endpoints.insert("conversation".to_string(), EndpointQuota::new(20, 60_000));

        Self {
            sweep_probability: 0.01,
            sweep_interval_secs: 0,
            endpoints,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origin patterns; `*` matches any run of characters.
    pub allowed_origins: Vec<String>,

    /// Headers a browser may send.
    pub allowed_headers: Vec<String>,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:*".to_string(),
                "https://*.lovable.app".to_string(),
                "https://*.lovableproject.com".to_string(),
            ],
            allowed_headers: vec![
                "authorization".to_string(),
                "x-client-info".to_string(),
                "apikey".to_string(),
                "content-type".to_string(),
            ],
            max_age_secs: 86_400,
        }
    }
}

/// Audit sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// URL of the hosted logging procedure. Empty means log locally only.
    pub rpc_url: String,

    /// Key sent as `apikey` and bearer token.
    pub api_key: String,

    /// Timeout for one audit write in seconds.
    pub timeout_secs: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            api_key: String::new(),
            timeout_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

//! HTTP server setup and the protected-function pipeline.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, request ID, panic capture)
//! - Run gate → rate limiter → function handler per request
//! - Bound each handler call by the request deadline
//! - Attach CORS headers to every function response
//! - Spawn the limiter sweeper when configured

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use futures_util::FutureExt;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::AdminState;
use crate::audit::{AuditError, AuditLog, SecurityEvent, SecurityEventKind};
use crate::config::GuardConfig;
use crate::error::GateError;
use crate::http::cors::CorsPolicy;
use crate::http::handler::{AcknowledgeHandler, FunctionHandler, Invocation};
use crate::http::request::{
    new_correlation_id, propagate_request_id_layer, request_id, set_request_id_layer,
};
use crate::http::response::panic_response;
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::security::rate_limit::{limiter_key, run_sweeper, SlidingWindowLimiter};
use crate::security::RequestGate;

/// Characters of a handler failure kept in the audit trail.
pub const ERROR_AUDIT_CHARS: usize = 500;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GuardConfig>,
    pub gate: Arc<RequestGate>,
    pub limiter: Arc<SlidingWindowLimiter>,
    pub audit: AuditLog,
    pub cors: Arc<CorsPolicy>,
    pub handlers: Arc<HashMap<String, Arc<dyn FunctionHandler>>>,
}

/// HTTP server for the protected functions.
pub struct HttpServer {
    config: Arc<GuardConfig>,
    limiter: Arc<SlidingWindowLimiter>,
    audit: AuditLog,
    handlers: HashMap<String, Arc<dyn FunctionHandler>>,
}

impl HttpServer {
    /// Create a server from configuration. Every configured endpoint starts
    /// with [`AcknowledgeHandler`].
    pub fn new(config: GuardConfig) -> Result<Self, AuditError> {
        let audit = AuditLog::from_config(&config.audit)?;
        Ok(Self::with_audit(config, audit))
    }

    /// Create a server that writes security events to `audit`.
    pub fn with_audit(config: GuardConfig, audit: AuditLog) -> Self {
        let limiter = Arc::new(SlidingWindowLimiter::with_sweep_probability(
            config.rate_limit.sweep_probability,
        ));

        let handlers = config
            .rate_limit
            .endpoints
            .keys()
            .map(|name| (name.clone(), Arc::new(AcknowledgeHandler) as Arc<dyn FunctionHandler>))
            .collect();

        Self {
            config: Arc::new(config),
            limiter,
            audit,
            handlers,
        }
    }

    /// Serve `endpoint` with `handler`. Endpoints without a quota stay unrouted.
    pub fn with_handler(mut self, endpoint: &str, handler: Arc<dyn FunctionHandler>) -> Self {
        if self.config.rate_limit.endpoints.contains_key(endpoint) {
            self.handlers.insert(endpoint.to_string(), handler);
        } else {
            tracing::warn!(endpoint, "Handler registered for endpoint without a quota, ignoring");
        }
        self
    }

    /// State for the admin router, sharing this server's limiter.
    pub fn admin_state(&self) -> AdminState {
        AdminState {
            config: self.config.clone(),
            limiter: self.limiter.clone(),
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn router(&self) -> Router {
        let state = AppState {
            config: self.config.clone(),
            gate: Arc::new(RequestGate::new(self.config.gate.clone(), self.audit.clone())),
            limiter: self.limiter.clone(),
            audit: self.audit.clone(),
            cors: Arc::new(CorsPolicy::new(&self.config.cors)),
            handlers: Arc::new(self.handlers.clone()),
        };

        Router::new()
            .route("/functions/{endpoint}", any(function_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::INTERNAL_SERVER_ERROR,
                stalled_request_deadline(self.config.timeouts.request_secs),
            ))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            endpoints = ?self.config.rate_limit.endpoints.keys().collect::<Vec<_>>(),
            "HTTP server starting"
        );

        if self.config.rate_limit.sweep_interval_secs > 0 {
            let interval = Duration::from_secs(self.config.rate_limit.sweep_interval_secs);
            tokio::spawn(run_sweeper(self.limiter.clone(), interval, shutdown_rx.resubscribe()));
        }

        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Entry point for every protected function.
async fn function_handler(
    State(state): State<AppState>,
    Path(endpoint): Path<String>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let origin = request.headers().get(header::ORIGIN).cloned();

    // Preflight: no gate, no limiter, no body.
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::OK.into_response();
        state.cors.apply(origin.as_ref(), response.headers_mut());
        return response;
    }

    let mut response = match run_pipeline(&state, &endpoint, request).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => err.into_response(),
    };

    state.cors.apply(origin.as_ref(), response.headers_mut());
    metrics::record_request(&endpoint, response.status().as_u16(), start);
    response
}

/// Gate, then limiter, then the endpoint's handler.
async fn run_pipeline(
    state: &AppState,
    endpoint: &str,
    request: Request<Body>,
) -> Result<serde_json::Value, GateError> {
    let (Some(quota), Some(handler)) = (
        state.config.rate_limit.endpoints.get(endpoint),
        state.handlers.get(endpoint),
    ) else {
        tracing::debug!(endpoint, "Unknown function requested");
        return Err(GateError::UnknownEndpoint(endpoint.to_string()));
    };

    let request_id = request_id(request.headers());
    let validated = state.gate.validate(endpoint, request).await?;

    let key = limiter_key(endpoint, validated.caller_key());
    if !state.limiter.check(&key, quota) {
        tracing::warn!(endpoint, key = %key, max = quota.max, window_ms = quota.window_ms, "Rate limit exceeded");
        metrics::record_rate_limited(endpoint);
        let event = SecurityEvent::new(
            SecurityEventKind::RateLimitExceeded,
            endpoint,
            json!({ "key": key, "max": quota.max, "window_ms": quota.window_ms }),
        )
        .with_caller(validated.user_id.clone())
        .with_client_ip(validated.client_ip.as_str());
        state.audit.emit(event).await;

        return Err(GateError::RateLimitExceeded {
            retry_after_secs: quota.retry_after_secs(),
        });
    }

    let invocation = Invocation {
        endpoint: endpoint.to_string(),
        request_id,
        payload: validated.payload,
        user_id: validated.user_id.clone(),
        client_ip: validated.client_ip.clone(),
        user_agent: validated.user_agent,
    };

    let deadline = Duration::from_secs(state.config.timeouts.request_secs);
    let call = AssertUnwindSafe(handler.call(invocation)).catch_unwind();
    let failure = match tokio::time::timeout(deadline, call).await {
        Ok(Ok(Ok(body))) => return Ok(body),
        Ok(Ok(Err(e))) => e.chain(),
        Ok(Err(panic)) => format!("handler panicked: {}", panic_message(panic.as_ref())),
        Err(_) => format!("handler timed out after {}s", deadline.as_secs()),
    };

    let correlation_id = new_correlation_id();
    let error: String = failure.chars().take(ERROR_AUDIT_CHARS).collect();
    tracing::error!(endpoint, request_id = %correlation_id, error = %error, "Function handler failed");

    let event = SecurityEvent::new(
        SecurityEventKind::InternalError,
        endpoint,
        json!({ "error": error, "request_id": correlation_id }),
    )
    .with_caller(validated.user_id)
    .with_client_ip(validated.client_ip);
    state.audit.emit(event).await;

    Err(GateError::Internal {
        request_id: correlation_id,
    })
}

/// Text of a panic payload, when it carries one.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Outer bound for requests that never reach a handler, such as a stalled
/// upload. Handler calls hit their own deadline first.
fn stalled_request_deadline(request_secs: u64) -> Duration {
    Duration::from_secs(request_secs.saturating_mul(2).max(1))
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guard_requests_total` (counter): requests by endpoint, status
//! - `guard_request_duration_seconds` (histogram): latency distribution
//! - `guard_gate_rejections_total` (counter): gate rejections by kind
//! - `guard_rate_limited_total` (counter): limiter rejections by endpoint
//! - `guard_limiter_swept_keys_total` (counter): keys dropped by sweeps
//! - `guard_limiter_tracked_keys` (gauge): keys held after the last sweep
//! - `guard_audit_failures_total` (counter): audit writes that failed
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics exporter"),
    }
}

pub fn record_request(endpoint: &str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!(
        "guard_requests_total",
        "endpoint" => endpoint.to_string(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "guard_request_duration_seconds",
        "endpoint" => endpoint.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_gate_rejection(kind: &'static str) {
    counter!("guard_gate_rejections_total", "kind" => kind).increment(1);
}

pub fn record_rate_limited(endpoint: &str) {
    counter!("guard_rate_limited_total", "endpoint" => endpoint.to_string()).increment(1);
}

pub fn record_limiter_sweep(removed: usize, remaining: usize) {
    counter!("guard_limiter_swept_keys_total").increment(removed as u64);
    gauge!("guard_limiter_tracked_keys").set(remaining as f64);
}

pub fn record_audit_failure() {
    counter!("guard_audit_failures_total").increment(1);
}

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::clock::now_millis;
use crate::config::EndpointQuota;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct LimiterStatus {
    pub tracked_keys: usize,
    pub sweep_probability: f64,
    pub sweep_interval_secs: u64,
}

#[derive(Serialize)]
pub struct SweepResult {
    pub removed: usize,
    pub tracked_keys: usize,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

pub async fn get_limiter(State(state): State<AdminState>) -> Json<LimiterStatus> {
    Json(LimiterStatus {
        tracked_keys: state.limiter.tracked_keys(),
        sweep_probability: state.limiter.sweep_probability(),
        sweep_interval_secs: state.config.rate_limit.sweep_interval_secs,
    })
}

pub async fn get_quotas(State(state): State<AdminState>) -> Json<BTreeMap<String, EndpointQuota>> {
    Json(state.config.rate_limit.endpoints.clone())
}

pub async fn sweep_limiter(State(state): State<AdminState>) -> Json<SweepResult> {
    let removed = state.limiter.sweep(now_millis());
    tracing::info!(removed, "Manual rate limiter sweep");
    Json(SweepResult {
        removed,
        tracked_keys: state.limiter.tracked_keys(),
    })
}

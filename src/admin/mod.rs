//! Admin API: limiter introspection and maintenance.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::config::GuardConfig;
use crate::security::SlidingWindowLimiter;
use self::auth::admin_auth_middleware;
use self::handlers::*;

#[derive(Clone)]
pub struct AdminState {
    pub config: Arc<GuardConfig>,
    pub limiter: Arc<SlidingWindowLimiter>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/limiter", get(get_limiter))
        .route("/admin/limiter/sweep", post(sweep_limiter))
        .route("/admin/quotas", get(get_quotas))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

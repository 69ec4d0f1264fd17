//! Rejections produced by the request pipeline.

use axum::http::StatusCode;
use thiserror::Error;

use crate::audit::SecurityEventKind;

/// Why a request to a protected endpoint did not reach, or failed in, its handler.
///
/// Every variant except `Internal` and `UnknownEndpoint` is decided from the
/// request alone, before any business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Content-Type must be application/json")]
    InvalidContentType,

    #[error("Payload too large")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Invalid JSON payload")]
    InvalidJson(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after_secs: u64 },

    #[error("Unknown function '{0}'")]
    UnknownEndpoint(String),

    /// Carries the correlation id returned to the caller, never the cause.
    #[error("Internal server error")]
    Internal { request_id: String },
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            GateError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GateError::InvalidContentType => StatusCode::BAD_REQUEST,
            GateError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GateError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            GateError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            GateError::UnknownEndpoint(_) => StatusCode::NOT_FOUND,
            GateError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Audit event kind raised for this rejection, if any.
    pub fn event_kind(&self) -> Option<SecurityEventKind> {
        match self {
            GateError::MethodNotAllowed => Some(SecurityEventKind::InvalidMethod),
            GateError::InvalidContentType => Some(SecurityEventKind::InvalidContentType),
            GateError::PayloadTooLarge { .. } => Some(SecurityEventKind::PayloadTooLarge),
            GateError::InvalidJson(_) => Some(SecurityEventKind::InvalidJson),
            GateError::RateLimitExceeded { .. } => Some(SecurityEventKind::RateLimitExceeded),
            GateError::Internal { .. } => Some(SecurityEventKind::InternalError),
            GateError::UnknownEndpoint(_) => None,
        }
    }
}

//! Request size and content-type limits.
//!
//! # Responsibilities
//! - Require a JSON content type
//! - Collect the body under a hard transport cap
//! - Enforce the maximum accepted body size
//!
//! # Design Decisions
//! - A declared Content-Length above the transport cap is rejected before reading
//! - The observed size is reported, not just "too large"
//! - A body of exactly the limit is accepted

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap};
use futures_util::StreamExt;

use crate::error::GateError;

/// Outcome of reading a body under the transport cap.
#[derive(Debug)]
pub enum BodyRead {
    Complete(Bytes),
    /// Stopped early; `observed` is the best known size.
    Oversized { observed: usize },
}

/// True when the Content-Type header names JSON.
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false)
}

/// Declared body length, if the client sent one.
pub fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Read the body, giving up once more than `transport_cap` bytes arrive.
pub async fn read_body(
    body: Body,
    headers: &HeaderMap,
    transport_cap: usize,
) -> Result<BodyRead, axum::Error> {
    let declared = declared_length(headers);
    if let Some(len) = declared {
        if len > transport_cap {
            return Ok(BodyRead::Oversized { observed: len });
        }
    }

    let mut stream = body.into_data_stream();
    let mut buf = Vec::with_capacity(declared.unwrap_or(0));

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        buf.extend_from_slice(&chunk);
        if buf.len() > transport_cap {
            let observed = declared.unwrap_or(0).max(buf.len());
            return Ok(BodyRead::Oversized { observed });
        }
    }

    Ok(BodyRead::Complete(Bytes::from(buf)))
}

/// Reject bodies longer than `limit` bytes.
pub fn check_body_size(size: usize, limit: usize) -> Result<(), GateError> {
    if size > limit {
        return Err(GateError::PayloadTooLarge { size, limit });
    }
    Ok(())
}

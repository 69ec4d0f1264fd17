//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → client_ip.rs (identify the caller's address)
//!     → gate.rs (method, content type, size, JSON, sanitize)
//!         → limits.rs, sanitize.rs
//!     → rate_limit.rs (per endpoint + caller sliding window)
//!     → Pass to function handler
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - The gate runs before the limiter, so malformed requests never consume quota
//! - No trust in client input

pub mod client_ip;
pub mod gate;
pub mod limits;
pub mod rate_limit;
pub mod sanitize;

pub use client_ip::extract_client_ip;
pub use gate::{RequestGate, ValidatedRequest};
pub use rate_limit::{limiter_key, SlidingWindowLimiter};

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → cors.rs (preflight answered here)
//!     → security gate + rate limiter
//!     → handler.rs (business logic)
//!     → response.rs (error bodies, Retry-After)
//!     → Send to client
//! ```

pub mod cors;
pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use handler::{AcknowledgeHandler, FunctionHandler, HandlerError, Invocation};
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};

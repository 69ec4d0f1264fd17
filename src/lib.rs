//! Request gate and sliding-window rate limiter for JSON function endpoints.

pub mod admin;
pub mod audit;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GuardConfig;
pub use error::GateError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

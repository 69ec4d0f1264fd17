//! Security audit trail.
//!
//! # Data Flow
//! ```text
//! gate / rate limiter / handler failure
//!     → event.rs (SecurityEvent built at the decision point)
//!     → sink.rs (AuditLog::emit → AuditSink)
//!     → hosted logging procedure, or the process log
//! ```
//!
//! # Design Decisions
//! - One event per decision, emitted before the response is produced
//! - Events are never retained after the emitting call
//! - A failed audit write is logged locally and never fails the request

pub mod event;
pub mod sink;

pub use event::{AuditRecord, SecurityEvent, SecurityEventKind};
pub use sink::{AuditError, AuditLog, AuditSink, MemoryAuditSink, RpcAuditSink, TracingAuditSink};

//! Audit records for goal runs and tool executions.
//!
//! Purely observational: the recorder feeds logs and dashboard numbers and
//! never steers control flow. A run is created when a goal starts and
//! finalized exactly once; a tool record brackets each dispatched action.

mod api;
mod errors;
mod humanize;
mod mem;
mod retry;

pub use api::{AuditRecorder, RunRecord, RunStatus, ToolRecord, ToolStatus};
pub use errors::AuditError;
pub use humanize::humanize_time;
pub use mem::{ActivityItem, InMemoryAudit};
pub use retry::{with_retry, Retrying, RetryPolicy};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pagepilot_core_types::{RunId, ToolRecordId};

use crate::errors::AuditError;

/// Lifecycle status of one goal attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// Lifecycle status of one tool execution.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ToolStatus {
    Running,
    Success,
    Failed,
}

impl ToolStatus {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Persisted record of one goal attempt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: RunId,
    pub goal: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Persisted record of one tool execution within a run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolRecord {
    pub id: ToolRecordId,
    pub run_id: RunId,
    pub name: String,
    pub args: serde_json::Value,
    pub status: ToolStatus,
    pub result: Option<serde_json::Value>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Persistence boundary for audit records.
///
/// Implementations must tolerate out-of-order shutdown (an update for an
/// unknown run reports an error rather than panicking) and must never mutate
/// agent control flow.
#[async_trait]
pub trait AuditRecorder: Send + Sync {
    /// Create a run in `Running` state; called when a goal is adopted.
    async fn create_run(&self, goal: &str) -> Result<RunRecord, AuditError>;

    /// Set a run's terminal (or intermediate) status and stamp `finished_at`
    /// for terminal statuses.
    async fn update_run_status(&self, run: &RunId, status: RunStatus) -> Result<(), AuditError>;

    /// Create a tool record in `Running` state immediately before dispatch.
    async fn create_tool(
        &self,
        run: &RunId,
        name: &str,
        args: serde_json::Value,
    ) -> Result<ToolRecord, AuditError>;

    /// Finalize a tool record with its terminal status and result payload.
    async fn update_tool_status(
        &self,
        tool: &ToolRecordId,
        status: ToolStatus,
        result: Option<serde_json::Value>,
    ) -> Result<(), AuditError>;
}

#[async_trait]
impl<R: AuditRecorder + ?Sized> AuditRecorder for std::sync::Arc<R> {
    async fn create_run(&self, goal: &str) -> Result<RunRecord, AuditError> {
        (**self).create_run(goal).await
    }

    async fn update_run_status(&self, run: &RunId, status: RunStatus) -> Result<(), AuditError> {
        (**self).update_run_status(run, status).await
    }

    async fn create_tool(
        &self,
        run: &RunId,
        name: &str,
        args: serde_json::Value,
    ) -> Result<ToolRecord, AuditError> {
        (**self).create_tool(run, name, args).await
    }

    async fn update_tool_status(
        &self,
        tool: &ToolRecordId,
        status: ToolStatus,
        result: Option<serde_json::Value>,
    ) -> Result<(), AuditError> {
        (**self).update_tool_status(tool, status, result).await
    }
}

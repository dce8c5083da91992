use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use pagepilot_core_types::{RunId, ToolRecordId};

use crate::api::{AuditRecorder, RunRecord, RunStatus, ToolRecord, ToolStatus};
use crate::errors::AuditError;
use crate::humanize::humanize_time;

/// One row of the recent-activity feed.
#[derive(Clone, Debug, Serialize)]
pub struct ActivityItem {
    pub id: ToolRecordId,
    pub action: String,
    pub time: String,
    pub status: String,
}

/// In-memory recorder, also the source for dashboard numbers.
#[derive(Default)]
pub struct InMemoryAudit {
    runs: DashMap<RunId, RunRecord>,
    tools: DashMap<ToolRecordId, ToolRecord>,
    /// Tool ids in creation order, newest last.
    tool_order: Mutex<Vec<ToolRecordId>>,
}

impl InMemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(&self, id: &RunId) -> Option<RunRecord> {
        self.runs.get(id).map(|r| r.clone())
    }

    pub fn tool(&self, id: &ToolRecordId) -> Option<ToolRecord> {
        self.tools.get(id).map(|t| t.clone())
    }

    pub fn tools_for_run(&self, run: &RunId) -> Vec<ToolRecord> {
        let order = self.tool_order.lock();
        order
            .iter()
            .filter_map(|id| self.tools.get(id))
            .filter(|t| &t.run_id == run)
            .map(|t| t.clone())
            .collect()
    }

    pub fn total_runs(&self) -> usize {
        self.runs.len()
    }

    pub fn failed_runs(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| r.status == RunStatus::Failed)
            .count()
    }

    /// Percentage of completed runs, one decimal. 0.0 when no runs exist.
    pub fn success_rate(&self) -> f64 {
        let total = self.runs.len();
        if total == 0 {
            return 0.0;
        }
        let completed = self
            .runs
            .iter()
            .filter(|r| r.status == RunStatus::Completed)
            .count();
        (completed as f64 / total as f64 * 1000.0).round() / 10.0
    }

    /// Sum of finished-run durations, in minutes with one decimal.
    pub fn total_runtime_minutes(&self) -> f64 {
        let seconds: i64 = self
            .runs
            .iter()
            .filter_map(|r| {
                r.finished_at
                    .map(|end| end.signed_duration_since(r.started_at).num_seconds())
            })
            .sum();
        (seconds as f64 / 60.0 * 10.0).round() / 10.0
    }

    /// Latest `limit` tool executions, newest first, with humanized times.
    pub fn recent_activity(&self, limit: usize) -> Vec<ActivityItem> {
        let now = Utc::now();
        let order = self.tool_order.lock();
        order
            .iter()
            .rev()
            .take(limit)
            .filter_map(|id| self.tools.get(id))
            .map(|tool| ActivityItem {
                id: tool.id.clone(),
                action: tool.name.clone(),
                time: humanize_time(tool.started_at, now),
                status: if tool.status.is_success() {
                    "success".to_string()
                } else {
                    "error".to_string()
                },
            })
            .collect()
    }
}

#[async_trait]
impl AuditRecorder for InMemoryAudit {
    async fn create_run(&self, goal: &str) -> Result<RunRecord, AuditError> {
        let record = RunRecord {
            id: RunId::new(),
            goal: goal.to_string(),
            status: RunStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
        };
        debug!(run = %record.id, goal, "run created");
        self.runs.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update_run_status(&self, run: &RunId, status: RunStatus) -> Result<(), AuditError> {
        let mut record = self
            .runs
            .get_mut(run)
            .ok_or_else(|| AuditError::RunNotFound(run.to_string()))?;
        record.status = status;
        if status != RunStatus::Running {
            record.finished_at = Some(Utc::now());
        }
        debug!(run = %run, ?status, "run status updated");
        Ok(())
    }

    async fn create_tool(
        &self,
        run: &RunId,
        name: &str,
        args: serde_json::Value,
    ) -> Result<ToolRecord, AuditError> {
        let record = ToolRecord {
            id: ToolRecordId::new(),
            run_id: run.clone(),
            name: name.to_string(),
            args,
            status: ToolStatus::Running,
            result: None,
            started_at: Utc::now(),
            finished_at: None,
        };
        self.tools.insert(record.id.clone(), record.clone());
        self.tool_order.lock().push(record.id.clone());
        Ok(record)
    }

    async fn update_tool_status(
        &self,
        tool: &ToolRecordId,
        status: ToolStatus,
        result: Option<serde_json::Value>,
    ) -> Result<(), AuditError> {
        let mut record = self
            .tools
            .get_mut(tool)
            .ok_or_else(|| AuditError::ToolNotFound(tool.to_string()))?;
        record.status = status;
        if result.is_some() {
            record.result = result;
        }
        record.finished_at = Some(Utc::now());
        Ok(())
    }
}

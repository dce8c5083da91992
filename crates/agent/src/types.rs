use serde::{Deserialize, Serialize};

use pagepilot_actions::{ActionRequest, StepRecord};
use pagepilot_core_types::RunId;

/// Who produced a turn.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
    /// Summarized outcomes of the actions the preceding assistant turn asked
    /// for. Always immediately follows that assistant turn.
    ActionResult,
}

/// One entry in the conversation history. `requests` is only ever non-empty
/// on assistant turns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requests: Vec<ActionRequest>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            requests: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            requests: Vec::new(),
        }
    }

    pub fn assistant_with_requests(
        content: impl Into<String>,
        requests: Vec<ActionRequest>,
    ) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            requests,
        }
    }

    pub fn action_result(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::ActionResult,
            content: content.into(),
            requests: Vec::new(),
        }
    }

    pub fn has_requests(&self) -> bool {
        !self.requests.is_empty()
    }
}

/// Mutable state of one conversation. Owned by exactly one control-loop
/// invocation at a time; sessions never share state.
#[derive(Debug, Default)]
pub struct SessionState {
    pub history: Vec<Turn>,
    /// Active goal text; empty means no goal has been adopted.
    pub goal: String,
    /// Reasoning iterations spent on the current goal.
    pub loop_count: u32,
    /// Latched once the goal reads as achieved; only adopting a new goal
    /// clears it.
    pub goal_complete: bool,
    pub steps_log: Vec<StepRecord>,
    /// Audit run for the current goal. `None` after finalization, which is
    /// what makes finalize idempotent.
    pub run_id: Option<RunId>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt `goal` as the new objective and reset everything scoped to the
    /// previous one.
    pub fn adopt_goal(&mut self, goal: &str) {
        self.goal = goal.to_string();
        self.loop_count = 0;
        self.goal_complete = false;
        self.steps_log.clear();
        self.run_id = None;
    }

    pub fn latest_turn(&self) -> Option<&Turn> {
        self.history.last()
    }

    /// One line per executed step, for the oracle's goal reminder.
    pub fn steps_summary(&self) -> String {
        self.steps_log
            .iter()
            .map(|s| format!("{}. {} ({:?})", s.step_index, s.action_name, s.status))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

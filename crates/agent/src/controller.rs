use std::sync::Arc;

use tracing::{debug, info, warn};

use pagepilot_actions::{ActionRequest, Dispatcher, StepRecord};
use pagepilot_audit::{AuditRecorder, RunStatus};
use pagepilot_event_bus::{ProgressBus, ProgressEvent};

use crate::config::AgentConfig;
use crate::errors::AgentError;
use crate::oracle::{Oracle, OracleReply};
use crate::prompt::{task_prompt, CHAT_FRAMING};
use crate::router::{route, Destination};
use crate::trim::trim;
use crate::types::{SessionState, Turn};

/// Fragments in an assistant reply that read as "the goal is achieved".
/// Matched by containment, so derived forms ("successfully", "I'm done.")
/// count too.
const COMPLETION_KEYWORDS: [&str; 5] = ["success", "completed", "done", "finished", "satisfied"];

/// Where the loop stands after one transition.
enum Phase {
    Reasoning,
    Dispatching(Vec<ActionRequest>),
    Continuation(OracleReply),
    Finalized,
}

/// Drives one conversation: routes each user turn, runs the bounded
/// reason-act loop for task turns, and finalizes the audit run exactly once.
pub struct AgentController {
    oracle: Arc<dyn Oracle>,
    dispatcher: Arc<Dispatcher>,
    audit: Arc<dyn AuditRecorder>,
    progress: Arc<ProgressBus>,
    config: AgentConfig,
}

impl AgentController {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        dispatcher: Arc<Dispatcher>,
        audit: Arc<dyn AuditRecorder>,
        progress: Arc<ProgressBus>,
        config: AgentConfig,
    ) -> Self {
        Self {
            oracle,
            dispatcher,
            audit,
            progress,
            config,
        }
    }

    /// Handle one user message and return the reply to show. Oracle failures
    /// propagate; everything else is absorbed into the conversation.
    pub async fn handle_message(
        &self,
        state: &mut SessionState,
        text: &str,
    ) -> Result<String, AgentError> {
        state.history.push(Turn::user(text));

        match route(state) {
            Destination::Chat => self.chat_turn(state).await,
            Destination::Task => self.task_turn(state).await,
        }
    }

    async fn chat_turn(&self, state: &mut SessionState) -> Result<String, AgentError> {
        let trimmed = trim(&state.history, self.config.max_history);
        let reply = self.oracle.complete(CHAT_FRAMING, &trimmed).await?;
        state.history.push(Turn::assistant(reply.text.clone()));
        self.progress.publish(ProgressEvent::AssistantReply {
            text: reply.text.clone(),
        });
        Ok(reply.text)
    }

    async fn task_turn(&self, state: &mut SessionState) -> Result<String, AgentError> {
        if state.run_id.is_none() {
            match self.audit.create_run(&state.goal).await {
                Ok(run) => state.run_id = Some(run.id),
                // An unavailable recorder never blocks the goal itself.
                Err(err) => warn!(%err, "run creation failed, continuing un-audited"),
            }
        }
        info!(goal = %state.goal, "task loop started");

        let mut phase = Phase::Reasoning;
        let mut last_reply = String::new();

        loop {
            phase = match phase {
                Phase::Reasoning => {
                    let system = task_prompt(state);
                    let trimmed = trim(&state.history, self.config.max_history);
                    let reply = self.oracle.complete(&system, &trimmed).await?;
                    Phase::Continuation(reply)
                }

                Phase::Continuation(reply) => {
                    state.loop_count += 1;
                    debug!(loop_count = state.loop_count, "loop iteration");

                    if !reply.text.is_empty() {
                        last_reply = reply.text.clone();
                        self.progress.publish(ProgressEvent::AssistantReply {
                            text: reply.text.clone(),
                        });
                    }
                    state.history.push(Turn::assistant_with_requests(
                        reply.text.clone(),
                        reply.requests.clone(),
                    ));

                    if state.loop_count > self.config.loop_limit {
                        warn!(
                            loop_count = state.loop_count,
                            limit = self.config.loop_limit,
                            "loop limit reached, abandoning goal"
                        );
                        self.finalize(state, false).await;
                        Phase::Finalized
                    } else if !reply.requests.is_empty() {
                        Phase::Dispatching(reply.requests)
                    } else if goal_satisfied(&reply.text, &state.goal) {
                        state.goal_complete = true;
                        self.finalize(state, true).await;
                        Phase::Finalized
                    } else {
                        Phase::Reasoning
                    }
                }

                Phase::Dispatching(requests) => {
                    let mut lines = Vec::with_capacity(requests.len());
                    for request in &requests {
                        let outcome = self
                            .dispatcher
                            .execute(request, state.run_id.as_ref())
                            .await;
                        state.steps_log.push(StepRecord {
                            step_index: state.steps_log.len() + 1,
                            action_name: outcome.name.clone(),
                            status: outcome.status,
                        });
                        lines.push(format!("{}: {}", outcome.name, outcome.result));
                    }
                    state.history.push(Turn::action_result(lines.join("\n")));
                    Phase::Reasoning
                }

                Phase::Finalized => break,
            };
        }

        if last_reply.is_empty() {
            last_reply = "I could not complete that task.".to_string();
        }
        Ok(last_reply)
    }

    /// Close the current run. Taking `run_id` makes this idempotent: a second
    /// call for the same goal finds nothing to finalize.
    async fn finalize(&self, state: &mut SessionState, completed: bool) {
        let Some(run_id) = state.run_id.take() else {
            return;
        };
        let status = if completed {
            RunStatus::Completed
        } else {
            RunStatus::Failed
        };
        if let Err(err) = self.audit.update_run_status(&run_id, status).await {
            warn!(run = %run_id, %err, "run finalization not recorded");
        }
        self.progress.publish(ProgressEvent::RunFinalized {
            goal: state.goal.clone(),
            completed,
        });
        info!(run = %run_id, completed, "run finalized");
    }
}

/// An assistant reply signals completion when it contains a completion
/// fragment or the goal's leading word, case-insensitively.
fn goal_satisfied(reply: &str, goal: &str) -> bool {
    let reply = reply.to_lowercase();
    if COMPLETION_KEYWORDS.iter().any(|kw| reply.contains(kw)) {
        return true;
    }
    goal.split_whitespace()
        .next()
        .is_some_and(|first| reply.contains(&first.to_lowercase()))
}

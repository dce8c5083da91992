//! Progress notification channel.
//!
//! Observers (a websocket fan-out, a CLI spinner, a test probe) subscribe to
//! a broadcast of progress events. Publishing is fire-and-forget: it never
//! blocks, and having zero observers is not an error, so the control loop can
//! narrate itself without caring who listens.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

/// What the agent is doing right now, for display only. Nothing in the
/// control loop reads these back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Assistant produced a user-visible reply.
    AssistantReply { text: String },
    /// A tool is about to execute.
    ToolStarted { name: String },
    /// A tool finished; `success` mirrors the audited status.
    ToolFinished {
        name: String,
        success: bool,
        result: String,
    },
    /// The run reached a terminal status.
    RunFinalized { goal: String, completed: bool },
}

/// Broadcast bus for [`ProgressEvent`]s.
pub struct ProgressBus {
    sender: broadcast::Sender<ProgressEvent>,
}

impl ProgressBus {
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }

    /// Publish an event to whoever is listening. A send error only means
    /// there are no subscribers, which is fine.
    pub fn publish(&self, event: ProgressEvent) {
        trace!(?event, "progress");
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_subscribers_is_silent() {
        let bus = ProgressBus::new(8);
        bus.publish(ProgressEvent::ToolStarted {
            name: "click".into(),
        });
    }

    #[tokio::test]
    async fn subscribers_receive_in_order() {
        let bus = ProgressBus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(ProgressEvent::ToolStarted {
            name: "launch".into(),
        });
        bus.publish(ProgressEvent::ToolFinished {
            name: "launch".into(),
            success: true,
            result: "ok".into(),
        });

        assert_eq!(
            rx.recv().await.unwrap(),
            ProgressEvent::ToolStarted {
                name: "launch".into()
            }
        );
        match rx.recv().await.unwrap() {
            ProgressEvent::ToolFinished { name, success, .. } => {
                assert_eq!(name, "launch");
                assert!(success);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}

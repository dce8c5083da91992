use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use tracing::{debug, warn};

use pagepilot_audit::{AuditRecorder, ToolStatus};
use pagepilot_core_types::RunId;
use pagepilot_dom_cache::DomCache;
use pagepilot_driver::{DriverPort, DriverSession};
use pagepilot_event_bus::{ProgressBus, ProgressEvent};

use crate::model::{Action, ActionRequest};

const NO_SESSION_MSG: &str =
    "Browser not initialized. Use the launch action to open a page first.";
const NO_MATCH_MSG: &str = "No matching element found.";

#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Hard ceiling on elements stored per snapshot, whatever the request asks.
    pub max_elements_cap: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_elements_cap: 1000,
        }
    }
}

/// What one executed request produced. Failures are data, not errors: the
/// control loop narrates the result text back into the conversation either way.
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchOutcome {
    pub name: String,
    pub status: ToolStatus,
    pub result: String,
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Executes action requests against the live session and the element cache,
/// recording each execution in the audit trail and narrating it on the
/// progress bus.
///
/// The dispatcher owns the session handle for its conversation: `launch`
/// installs one, a second `launch` replaces it (the dropped handle releases
/// the previous browser), and session-needing actions without one fail softly.
pub struct Dispatcher {
    driver: Arc<dyn DriverPort>,
    session: Mutex<Option<Arc<dyn DriverSession>>>,
    cache: Arc<DomCache>,
    audit: Arc<dyn AuditRecorder>,
    progress: Arc<ProgressBus>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        driver: Arc<dyn DriverPort>,
        cache: Arc<DomCache>,
        audit: Arc<dyn AuditRecorder>,
        progress: Arc<ProgressBus>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            driver,
            session: Mutex::new(None),
            cache,
            audit,
            progress,
            config,
        }
    }

    pub fn has_session(&self) -> bool {
        self.session.lock().is_some()
    }

    fn current_session(&self) -> Option<Arc<dyn DriverSession>> {
        self.session.lock().clone()
    }

    /// Execute one request end to end. Never returns an error: driver and
    /// audit failures become Failed outcomes or are logged and skipped, so a
    /// bad step can never abort the surrounding loop.
    pub async fn execute(
        &self,
        request: &ActionRequest,
        run_id: Option<&RunId>,
    ) -> DispatchOutcome {
        self.progress.publish(ProgressEvent::ToolStarted {
            name: request.name.clone(),
        });

        // Audit row first so even unparseable requests leave a trace. A
        // recorder outage downgrades the step to un-audited, never blocks it.
        let tool_record = match run_id {
            Some(run) => match self
                .audit
                .create_tool(run, &request.name, request.arguments.clone())
                .await
            {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(name = %request.name, %err, "audit create failed, executing un-audited");
                    None
                }
            },
            None => None,
        };

        let (status, result) = match Action::parse(&request.name, &request.arguments) {
            Ok(action) => self.run_action(action).await,
            Err(err) => (ToolStatus::Failed, err.to_string()),
        };
        debug!(name = %request.name, ?status, "action executed");

        if let Some(record) = tool_record {
            if let Err(err) = self
                .audit
                .update_tool_status(&record.id, status, Some(json!({ "result": result })))
                .await
            {
                warn!(tool = %record.id, %err, "audit update failed");
            }
        }

        self.progress.publish(ProgressEvent::ToolFinished {
            name: request.name.clone(),
            success: status.is_success(),
            result: result.clone(),
        });

        DispatchOutcome {
            name: request.name.clone(),
            status,
            result,
        }
    }

    async fn run_action(&self, action: Action) -> (ToolStatus, String) {
        if action.needs_session() && !self.has_session() {
            return (ToolStatus::Failed, NO_SESSION_MSG.to_string());
        }

        match action {
            Action::Launch(args) => match self.driver.launch(&args.address).await {
                Ok(session) => {
                    *self.session.lock() = Some(session);
                    (
                        ToolStatus::Success,
                        format!("Browser launched and navigated to {}", args.address),
                    )
                }
                Err(err) => (ToolStatus::Failed, err.to_string()),
            },

            Action::RefreshSnapshot(args) => {
                // needs_session() held above, so the handle is present.
                let Some(session) = self.current_session() else {
                    return (ToolStatus::Failed, NO_SESSION_MSG.to_string());
                };
                let cap = args.max_elements.min(self.config.max_elements_cap);
                match session.scan_elements(cap).await {
                    Ok(elements) => {
                        let count = self.cache.refresh(&args.address, elements, cap);
                        (
                            ToolStatus::Success,
                            format!(
                                "Number of elements that are displayed and enabled found: {count}"
                            ),
                        )
                    }
                    Err(err) => (ToolStatus::Failed, err.to_string()),
                }
            }

            Action::QueryChunk(args) => {
                match self
                    .cache
                    .query(&args.address, args.limit, args.offset, &args.filters)
                {
                    Some(views) => match serde_json::to_string(&views) {
                        Ok(body) => (ToolStatus::Success, body),
                        Err(err) => (ToolStatus::Failed, err.to_string()),
                    },
                    None => (ToolStatus::Failed, NO_MATCH_MSG.to_string()),
                }
            }

            Action::FindOne(args) => {
                match self.cache.find_one(
                    &args.address,
                    args.tag.as_deref(),
                    args.text.as_deref(),
                    args.name.as_deref(),
                    args.id.as_deref(),
                ) {
                    Some(record) => match serde_json::to_string(&record) {
                        Ok(body) => (ToolStatus::Success, body),
                        Err(err) => (ToolStatus::Failed, err.to_string()),
                    },
                    None => (ToolStatus::Failed, NO_MATCH_MSG.to_string()),
                }
            }

            Action::ElementDetails(args) => {
                self.with_session(|session| async move {
                    let details = session.element_details(&args.to_selector()).await?;
                    Ok(serde_json::to_string(&details)
                        .unwrap_or_else(|_| "{}".to_string()))
                })
                .await
            }

            Action::Click(args) => {
                self.with_session(|session| async move {
                    session.click(&args.to_selector()).await?;
                    Ok(format!("Clicked element {}", args.selector))
                })
                .await
            }

            Action::TypeText(args) => {
                self.with_session(|session| async move {
                    session
                        .type_text(&args.to_selector(), &args.text, args.clear_first)
                        .await?;
                    Ok(format!("Typed '{}' into {}", args.text, args.selector))
                })
                .await
            }

            Action::SelectOption(args) => {
                self.with_session(|session| async move {
                    session
                        .select_option(&args.to_selector(), &args.option, args.option_type)
                        .await?;
                    Ok(format!(
                        "Selected '{}' from dropdown {}",
                        args.option, args.selector
                    ))
                })
                .await
            }

            Action::ToggleCheckbox(args) => {
                self.with_session(|session| async move {
                    let checked = session.toggle_checkbox(&args.to_selector()).await?;
                    Ok(if checked {
                        format!("Checkbox {} is checked", args.selector)
                    } else {
                        format!("Checkbox {} is unchecked", args.selector)
                    })
                })
                .await
            }

            Action::ReadText(args) => {
                self.with_session(|session| async move {
                    let text = session.read_text(&args.to_selector()).await?;
                    Ok(format!("Read text from element: {text}"))
                })
                .await
            }

            Action::ReadTable(args) => {
                self.with_session(|session| async move {
                    let rows = session.read_table(&args.to_selector()).await?;
                    Ok(serde_json::to_string(&rows)
                        .unwrap_or_else(|_| "[]".to_string()))
                })
                .await
            }

            Action::GetAttribute(args) => {
                self.with_session(|session| async move {
                    let value = session
                        .get_attribute(&args.to_selector(), &args.attribute_name)
                        .await?;
                    Ok(format!(
                        "Attribute '{}' of {} is '{value}'",
                        args.attribute_name, args.selector
                    ))
                })
                .await
            }

            Action::WaitFor(args) => {
                self.with_session(|session| async move {
                    session
                        .wait_for(&args.to_selector(), args.condition)
                        .await?;
                    Ok(format!(
                        "Element {} satisfied condition '{}'",
                        args.selector, args.condition
                    ))
                })
                .await
            }
        }
    }

    async fn with_session<F, Fut>(&self, f: F) -> (ToolStatus, String)
    where
        F: FnOnce(Arc<dyn DriverSession>) -> Fut,
        Fut: std::future::Future<Output = Result<String, pagepilot_driver::DriverError>>,
    {
        let Some(session) = self.current_session() else {
            return (ToolStatus::Failed, NO_SESSION_MSG.to_string());
        };
        match f(session).await {
            Ok(text) => (ToolStatus::Success, text),
            Err(err) => (ToolStatus::Failed, err.to_string()),
        }
    }
}

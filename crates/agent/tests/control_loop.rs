//! End-to-end control loop tests against the mock driver and a scripted
//! oracle.

use std::sync::Arc;

use serde_json::json;

use pagepilot_actions::{ActionRequest, Dispatcher, DispatcherConfig};
use pagepilot_agent::{
    AgentConfig, AgentController, OracleReply, ScriptedOracle, SessionState,
};
use pagepilot_audit::{InMemoryAudit, ToolStatus};
use pagepilot_dom_cache::{DomCache, ElementExtras, ElementRecord, SelectorType};
use pagepilot_driver::MockDriver;
use pagepilot_event_bus::ProgressBus;

fn element(tag: &str, id: &str, text: &str) -> ElementRecord {
    ElementRecord {
        tag: tag.into(),
        element_id: Some(id.into()),
        name: Some(id.into()),
        text: text.into(),
        visible: true,
        enabled: true,
        selector_type: SelectorType::Css,
        selector: format!("#{id}"),
        extras: ElementExtras::default(),
    }
}

struct Harness {
    controller: AgentController,
    audit: Arc<InMemoryAudit>,
    driver: MockDriver,
}

fn harness(driver: MockDriver, oracle: ScriptedOracle, config: AgentConfig) -> Harness {
    let audit = Arc::new(InMemoryAudit::new());
    let progress = ProgressBus::new(64);
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(driver.clone()),
        Arc::new(DomCache::default()),
        audit.clone(),
        progress.clone(),
        DispatcherConfig::default(),
    ));
    let controller = AgentController::new(
        Arc::new(oracle),
        dispatcher,
        audit.clone(),
        progress,
        config,
    );
    Harness {
        controller,
        audit,
        driver,
    }
}

fn selector(sel: &str) -> serde_json::Value {
    json!({"selector_type": "css", "selector": sel})
}

#[tokio::test]
async fn login_scenario_end_to_end() {
    let driver = MockDriver::new().with_elements(
        "https://example.com/login",
        vec![
            element("input", "username", ""),
            element("input", "password", ""),
            element("button", "submit", "Log in"),
        ],
    );
    let oracle = ScriptedOracle::new([
        OracleReply::act(
            "Opening the login page.",
            vec![
                ActionRequest::new("launch", json!({"address": "https://example.com/login"})),
                ActionRequest::new(
                    "refresh_snapshot",
                    json!({"address": "https://example.com/login"}),
                ),
            ],
        ),
        OracleReply::act(
            "Looking for the login form.",
            vec![ActionRequest::new(
                "query_chunk",
                json!({"address": "https://example.com/login", "filters": {"tag": "input"}}),
            )],
        ),
        OracleReply::act(
            "Filling in the credentials.",
            vec![
                ActionRequest::new(
                    "type_text",
                    json!({"selector_type": "css", "selector": "#username", "text": "alice"}),
                ),
                ActionRequest::new(
                    "type_text",
                    json!({"selector_type": "css", "selector": "#password", "text": "hunter2"}),
                ),
                ActionRequest::new("click", selector("#submit")),
            ],
        ),
        OracleReply::say("All finished, you are logged in."),
    ]);

    let h = harness(driver, oracle, AgentConfig::default());
    let mut state = SessionState::new();
    let reply = h
        .controller
        .handle_message(&mut state, "go to example.com/login and log in as alice")
        .await
        .unwrap();

    assert_eq!(reply, "All finished, you are logged in.");
    assert!(state.goal_complete);
    assert!(state.run_id.is_none(), "run must be finalized");

    // Every step was logged in order, all successful.
    let names: Vec<&str> = state
        .steps_log
        .iter()
        .map(|s| s.action_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "launch",
            "refresh_snapshot",
            "query_chunk",
            "type_text",
            "type_text",
            "click"
        ]
    );
    assert!(state.steps_log.iter().all(|s| s.status == ToolStatus::Success));
    let indexes: Vec<usize> = state.steps_log.iter().map(|s| s.step_index).collect();
    assert_eq!(indexes, vec![1, 2, 3, 4, 5, 6]);

    // The browser saw the real interactions.
    let performed = h.driver.performed();
    assert!(performed.contains(&"type #username".to_string()));
    assert!(performed.contains(&"click #submit".to_string()));

    // The run finished Completed with six audited tools.
    assert_eq!(h.audit.total_runs(), 1);
    assert_eq!(h.audit.success_rate(), 100.0);
    let activity = h.audit.recent_activity(10);
    assert_eq!(activity.len(), 6);
    assert!(activity.iter().all(|a| a.status == "success"));
}

#[tokio::test]
async fn derived_completion_word_ends_the_run() {
    // "successfully" must latch completion even though the bare keyword
    // "success" never appears as its own word.
    let oracle = ScriptedOracle::new([OracleReply::say(
        "I have logged you in successfully.",
    )]);
    let h = harness(
        MockDriver::new(),
        oracle,
        AgentConfig::default().with_loop_limit(2),
    );

    let mut state = SessionState::new();
    let reply = h
        .controller
        .handle_message(&mut state, "log into the site and check the inbox")
        .await
        .unwrap();

    assert_eq!(reply, "I have logged you in successfully.");
    assert!(state.goal_complete, "completion signal was not detected");
    assert!(state.run_id.is_none());
    assert_eq!(state.loop_count, 1);
    assert_eq!(h.audit.total_runs(), 1);
    assert_eq!(h.audit.failed_runs(), 0);
}

#[tokio::test]
async fn loop_limit_bounds_a_wandering_oracle() {
    // Replies that never request actions and never read as complete.
    let oracle = ScriptedOracle::new([
        OracleReply::say("Let me think about that."),
        OracleReply::say("Still considering the best approach."),
        OracleReply::say("Weighing the alternatives."),
    ]);
    let h = harness(
        MockDriver::new(),
        oracle,
        AgentConfig::default().with_loop_limit(2),
    );

    let mut state = SessionState::new();
    let reply = h
        .controller
        .handle_message(&mut state, "navigate somewhere eventually")
        .await
        .unwrap();

    assert_eq!(reply, "Weighing the alternatives.");
    assert!(!state.goal_complete);
    assert!(state.run_id.is_none());
    assert_eq!(state.loop_count, 3);

    assert_eq!(h.audit.total_runs(), 1);
    assert_eq!(h.audit.failed_runs(), 1);
}

#[tokio::test]
async fn failed_action_does_not_abort_the_loop() {
    let driver = MockDriver::new().failing_selector("#ghost");
    let oracle = ScriptedOracle::new([
        OracleReply::act(
            "Opening the page.",
            vec![ActionRequest::new("launch", json!({"address": "https://example.com"}))],
        ),
        OracleReply::act(
            "Clicking the button.",
            vec![ActionRequest::new("click", selector("#ghost"))],
        ),
        OracleReply::say("Done, as far as the page allows."),
    ]);
    let h = harness(driver, oracle, AgentConfig::default());

    let mut state = SessionState::new();
    let reply = h
        .controller
        .handle_message(&mut state, "open example.com and click the button")
        .await
        .unwrap();

    assert_eq!(reply, "Done, as far as the page allows.");
    assert_eq!(state.steps_log.len(), 2);
    assert_eq!(state.steps_log[1].status, ToolStatus::Failed);
    // The failure was narrated back into the history.
    let failure_turn = state
        .history
        .iter()
        .find(|t| t.content.contains("#ghost"))
        .unwrap();
    assert!(!failure_turn.content.is_empty());
}

#[tokio::test]
async fn completed_goal_resets_for_the_next_one() {
    let oracle = ScriptedOracle::new([
        OracleReply::say("Done."),
        OracleReply::say("Done again."),
    ]);
    let h = harness(MockDriver::new(), oracle, AgentConfig::default());
    let mut state = SessionState::new();

    h.controller
        .handle_message(&mut state, "open the first page")
        .await
        .unwrap();
    assert!(state.goal_complete);
    let first_goal = state.goal.clone();

    h.controller
        .handle_message(&mut state, "read the second page")
        .await
        .unwrap();
    assert_ne!(state.goal, first_goal);
    assert_eq!(state.goal, "read the second page");
    assert!(state.goal_complete);

    // Two separate runs, both completed.
    assert_eq!(h.audit.total_runs(), 2);
    assert_eq!(h.audit.failed_runs(), 0);
}

#[tokio::test]
async fn chat_turns_do_not_create_runs() {
    let oracle = ScriptedOracle::new([OracleReply::say("Hello! How can I help?")]);
    let h = harness(MockDriver::new(), oracle, AgentConfig::default());

    let mut state = SessionState::new();
    let reply = h
        .controller
        .handle_message(&mut state, "hello there")
        .await
        .unwrap();

    assert_eq!(reply, "Hello! How can I help?");
    assert_eq!(h.audit.total_runs(), 0);
    assert!(state.steps_log.is_empty());
}

#[tokio::test]
async fn run_outcomes_feed_dashboard_metrics() {
    let oracle = ScriptedOracle::new([
        OracleReply::say("Done."),
        OracleReply::say("no progress"),
        OracleReply::say("no progress"),
    ]);
    let h = harness(
        MockDriver::new(),
        oracle,
        AgentConfig::default().with_loop_limit(1),
    );
    let mut state = SessionState::new();

    h.controller
        .handle_message(&mut state, "open page one")
        .await
        .unwrap();
    h.controller
        .handle_message(&mut state, "open page two")
        .await
        .unwrap();

    assert_eq!(h.audit.total_runs(), 2);
    assert_eq!(h.audit.failed_runs(), 1);
    assert_eq!(h.audit.success_rate(), 50.0);
}

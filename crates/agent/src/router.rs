use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::types::{SessionState, TurnRole};

/// Where the current turn goes next.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Destination {
    /// Plain conversation; one oracle call, no actions.
    Chat,
    /// Browser task; enter the reason-act loop.
    Task,
}

/// Words that mark an utterance as a browser task.
static TASK_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:click|open|go to|navigate|type|fill|select|check|uncheck|read|scrape|inspect|browser|element|extract)\b",
    )
    .unwrap()
});

/// Imperative fragments that override an in-flight goal mid-session.
/// Matched by containment, so "restart" and "reopen" count as commands too.
const IMPERATIVE_KEYWORDS: [&str; 8] = [
    "open", "launch", "login", "start", "go to", "click", "press", "select",
];

/// Classify the latest turn and maintain the session goal.
///
/// Only a latest *user* turn may mutate the goal: a fresh utterance is
/// adopted when no goal is active or the previous one completed, and an
/// imperative utterance overrides a goal still in flight. Non-user latest
/// turns get a destination decision and nothing else.
pub fn route(state: &mut SessionState) -> Destination {
    let Some(latest) = state.latest_turn() else {
        return Destination::Chat;
    };

    if latest.role != TurnRole::User {
        return if !state.goal.is_empty() && !state.goal_complete {
            Destination::Task
        } else {
            Destination::Chat
        };
    }

    let utterance = latest.content.to_lowercase();

    let adopt = state.goal.is_empty()
        || state.goal_complete
        || IMPERATIVE_KEYWORDS.iter().any(|kw| utterance.contains(kw));
    if adopt {
        let goal = latest.content.clone();
        state.adopt_goal(&goal);
    }

    let destination = if TASK_KEYWORDS.is_match(&utterance) {
        Destination::Task
    } else {
        Destination::Chat
    };
    debug!(?destination, goal = %state.goal, "routed turn");
    destination
}

//! System framing for oracle calls. Deliberately thin: constants and string
//! assembly only, no logic.

use crate::types::SessionState;

pub const CHAT_FRAMING: &str = "You are PagePilot, a helpful assistant that can \
also operate a web browser when asked. Answer conversationally and briefly.";

const TASK_FRAMING: &str = "You are PagePilot, an assistant that operates a web \
browser through a fixed set of actions. Work toward the user's goal one step \
at a time. Capabilities:\n\
- launch: open a browser session at an address\n\
- refresh_snapshot: scan the current page and cache its interactive elements\n\
- query_chunk: page through cached elements, optionally filtered by tag/text/id/name\n\
- find_one: exact lookup of a single cached element\n\
- element_details: current value or options of one element\n\
- click, type_text, select_option, toggle_checkbox: interact with one element\n\
- read_text, read_table, get_attribute: extract content\n\
- wait_for: wait until an element reaches a readiness condition\n\
Always refresh_snapshot after navigation before querying. When the goal is \
achieved, say so plainly using a word like 'done' or 'completed' and stop \
requesting actions.";

/// Framing for one reasoning iteration: capabilities, the goal, and what
/// already ran.
pub fn task_prompt(state: &SessionState) -> String {
    let mut prompt = format!("{TASK_FRAMING}\n\nCurrent goal: {}", state.goal);
    if !state.steps_log.is_empty() {
        prompt.push_str(
            "\n\nSteps already executed (do not repeat unless required):\n",
        );
        prompt.push_str(&state.steps_summary());
    }
    prompt
}

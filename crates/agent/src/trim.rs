use crate::types::{Turn, TurnRole};

/// Keep the last `window` turns without ever splitting an assistant turn from
/// the action-result turn that answers it.
///
/// The window is taken from the tail, then leading action-result turns are
/// dropped: their requesting assistant turn fell outside the window, and an
/// orphaned result would read as unprompted noise to the oracle.
pub fn trim(history: &[Turn], window: usize) -> Vec<Turn> {
    if window == 0 {
        return Vec::new();
    }
    let start = history.len().saturating_sub(window);
    let mut tail = &history[start..];
    while let Some(first) = tail.first() {
        if first.role == TurnRole::ActionResult {
            tail = &tail[1..];
        } else {
            break;
        }
    }
    tail.to_vec()
}

use thiserror::Error;

/// Errors surfaced by driver implementations.
///
/// Every action contract fails with a descriptive error, never a silent
/// no-op; the dispatcher above converts these into Failed tool outcomes.
#[derive(Debug, Error, Clone)]
pub enum DriverError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("element not {condition} within {wait_secs}s: {selector}")]
    Timeout {
        selector: String,
        condition: String,
        wait_secs: u64,
    },

    #[error("no element matches selector: {0}")]
    NotFound(String),

    #[error("attribute '{attribute}' not found on element: {selector}")]
    AttributeMissing {
        attribute: String,
        selector: String,
    },

    #[error("invalid option_type: {0}")]
    InvalidOption(String),

    #[error("driver protocol error: {0}")]
    Protocol(String),
}

impl DriverError {
    pub fn timeout(selector: impl Into<String>, condition: impl Into<String>, wait_secs: u64) -> Self {
        Self::Timeout {
            selector: selector.into(),
            condition: condition.into(),
            wait_secs,
        }
    }
}

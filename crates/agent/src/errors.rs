use thiserror::Error;

use crate::oracle::OracleError;

/// Failures that abort a turn. Action and audit failures never reach here;
/// only losing the reasoning oracle makes the loop unable to proceed.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("oracle failure: {0}")]
    Oracle(#[from] OracleError),
}

use thiserror::Error;

/// Errors surfaced by audit recorder backends.
#[derive(Debug, Error, Clone)]
pub enum AuditError {
    /// Transient backend failure; candidates for retry.
    #[error("audit backend unavailable: {0}")]
    Unavailable(String),

    #[error("unknown run: {0}")]
    RunNotFound(String),

    #[error("unknown tool record: {0}")]
    ToolNotFound(String),
}

impl AuditError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

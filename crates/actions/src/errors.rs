use thiserror::Error;

/// Failures mapping a free-form `{name, arguments}` request onto the closed
/// action set. Never propagated out of dispatch; converted into a Failed
/// outcome with the error text as the result.
#[derive(Debug, Error)]
pub enum ActionParseError {
    #[error("Tool '{0}' not found")]
    UnknownAction(String),

    #[error("invalid arguments for '{name}': {message}")]
    BadArguments { name: String, message: String },
}

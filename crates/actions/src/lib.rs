//! The agent's capability surface.
//!
//! Every action the reasoning model may request is a variant of a closed
//! enum with a declared argument schema, so dispatch is an exhaustive match
//! and "unknown tool" only exists at the parse boundary where free-form
//! requests enter. One failing action never aborts the control loop; it
//! becomes a Failed outcome narrated back into the conversation.

mod dispatch;
mod errors;
mod model;

pub use dispatch::{Dispatcher, DispatcherConfig, DispatchOutcome};
pub use errors::ActionParseError;
pub use model::{
    Action, ActionRequest, FindOneArgs, GetAttributeArgs, LaunchArgs, QueryChunkArgs,
    RefreshSnapshotArgs, SelectOptionArgs, SelectorArgs, StepRecord, TypeTextArgs, WaitForArgs,
    ACTION_NAMES,
};

//! Conversation control for PagePilot.
//!
//! A turn enters through the router, which decides whether the utterance is
//! small talk or a browser task and maintains the session goal. Task turns run
//! a bounded reason-act loop: ask the oracle, dispatch whatever actions it
//! requested, feed the results back, repeat until the goal reads as complete
//! or the loop-safety counter trips. The oracle is a trait; tests script it.

mod config;
mod controller;
mod errors;
mod oracle;
mod prompt;
mod router;
mod trim;
mod types;

pub use config::AgentConfig;
pub use controller::AgentController;
pub use errors::AgentError;
pub use oracle::{HttpOracle, HttpOracleConfig, Oracle, OracleError, OracleReply, ScriptedOracle};
pub use router::{route, Destination};
pub use trim::trim;
pub use types::{SessionState, Turn, TurnRole};

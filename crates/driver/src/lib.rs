//! Browser driver boundary.
//!
//! The control loop never talks to a real browser directly; it depends on the
//! port traits here. A session-scoped handle is acquired at launch and passed
//! explicitly into every action, so there is no process-wide driver state.
//! Implementations performing blocking I/O must offload it (for example via
//! `tokio::task::spawn_blocking`) so the cooperative loop is never stalled.

mod errors;
mod mock;
mod ports;

pub use errors::DriverError;
pub use mock::{MockDriver, MockPage};
pub use ports::{
    DriverPort, DriverSession, ElementDetails, OptionBy, SelectOptionItem, Selector, TableRow,
    WaitCondition, ELEMENT_TEXT_CAP,
};

//! Signal database and DBC parser
//!
//! Signal definitions are needed to turn raw CAN traces into named channels.

pub mod database;
pub mod dbc;

pub use database::{MessageDefinition, SignalDatabase};

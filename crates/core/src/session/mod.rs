//! Session aggregate, command gating and the controller that drives them.

mod command;
mod controller;
mod gating;
mod measurement;
mod state;

pub use command::Command;
pub use controller::{LoopControl, SessionController};
pub use gating::{Rejection, gate};
pub use measurement::MeasurementRecord;
pub use state::{ConnectedDevice, Session, SessionState};

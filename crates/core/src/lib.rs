//! Session core for one measurement device reachable over a continuous (USB)
//! or discoverable (BLE) link.
//!
//! [`SessionController`] owns the [`Session`] aggregate and is the only place
//! it is mutated. Collaborator callbacks reach it through the
//! [`EventRouter`](dsc_runtime::EventRouter), user commands through
//! [`CommandLoop`], and everything the user should see leaves through an
//! injected [`Notifier`].

pub mod command_loop;
pub mod config;
pub mod error;
pub mod notice;
pub mod session;

pub use command_loop::{CommandLoop, LoopExit, LoopSignal};
pub use config::SessionConfig;
pub use error::{ErrorKind, Result, SessionError};
pub use notice::{CollectingNotifier, DeviceEntry, Notice, Notifier};
pub use session::{Command, ConnectedDevice, LoopControl, MeasurementRecord, Rejection, Session, SessionController, SessionState, gate};

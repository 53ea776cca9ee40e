//! Data types shared between the device collaborators and the session core.
//!
//! This crate contains the serde-serializable shapes that cross the boundary
//! between a transport backend (USB, BLE, or the in-process simulator) and the
//! session controller: discovered-device descriptors, opened-device metadata,
//! measurement result sets, and the events each collaborator emits.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization, parsing and display
//! * Transport-neutral: The same descriptor shape is used for every link type
//! * Stable: Changes only when a collaborator contract changes
//!
//! Session behavior is built on top of these types in `dsc-core`.

pub mod device;
pub mod events;
pub mod measurement;

pub use device::*;
pub use events::*;
pub use measurement::*;

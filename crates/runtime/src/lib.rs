//! Device collaborator contracts, event routing, and the simulated backend.
//!
//! The session core never talks to a driver stack directly. It consumes the
//! [`DetectorGateway`] and [`DeviceHandle`] traits, registers for their events
//! through an [`EventRouter`], and receives those events on its own task in
//! arrival order.

pub mod error;
pub mod gateway;
pub mod hub;
pub mod router;
pub mod sim;

pub use error::{DetectorError, DeviceError};
pub use gateway::{DetectorGateway, DeviceHandle};
pub use hub::{EventHub, EventSink, SubscriberId};
pub use router::{EventRouter, SessionEvent};
pub use sim::{GatewayCall, SimConfig, SimDeviceSpec, SimulatedBackend, SimulatedDetector, SimulatedDevice};

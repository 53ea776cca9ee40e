//! Events emitted by the detector gateway and by opened devices.
//!
//! Both enums are tagged by `event` so a backend can forward them over a
//! byte stream unchanged:
//! ```json
//! { "event": "device_arrived", "address": "C4:7F:51:00:00:01" }
//! ```

use serde::{Deserialize, Serialize};

use crate::device::{DeviceDescriptor, DeviceId, DeviceInformation};
use crate::measurement::{MeasurementsStatus, ResultSet};

/// Event raised by a detector gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DetectorEvent {
	/// A device became reachable.
	DeviceArrived(DeviceDescriptor),
	/// A previously reachable device is gone.
	DeviceRemoved(DeviceDescriptor),
	/// The current detection cycle ended on its own.
	DevicesDetectionFinished,
	/// An opened device dropped its link without being closed by the session.
	DeviceDisconnected { device: DeviceId, information: DeviceInformation },
	/// The underlying radio or bus was switched on or off.
	DetectionStateChanged { enabled: bool },
}

impl DetectorEvent {
	/// Stable event name used in log fields.
	pub fn name(&self) -> &'static str {
		match self {
			DetectorEvent::DeviceArrived(_) => "device_arrived",
			DetectorEvent::DeviceRemoved(_) => "device_removed",
			DetectorEvent::DevicesDetectionFinished => "devices_detection_finished",
			DetectorEvent::DeviceDisconnected { .. } => "device_disconnected",
			DetectorEvent::DetectionStateChanged { .. } => "detection_state_changed",
		}
	}
}

/// Event raised by an opened device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DeviceEvent {
	MeasurementsStatusChanged { status: MeasurementsStatus },
	MeasurementArrived(ResultSet),
}

impl DeviceEvent {
	pub fn name(&self) -> &'static str {
		match self {
			DeviceEvent::MeasurementsStatusChanged { .. } => "measurements_status_changed",
			DeviceEvent::MeasurementArrived(_) => "measurement_arrived",
		}
	}
}

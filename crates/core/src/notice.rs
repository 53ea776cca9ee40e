//! User-facing status notifications.
//!
//! The core never prints. Everything the user should learn about goes out as a
//! [`Notice`] through the [`Notifier`] the controller was built with; front ends
//! decide how to render it.

use std::sync::Arc;

use dsc_protocol::{DeviceDescriptor, MeasurementsStatus, TransportKind};
use parking_lot::Mutex;
use serde::Serialize;

use crate::session::{MeasurementRecord, Rejection};

/// A discovered device as listed to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceEntry {
	pub ordinal: usize,
	pub address: String,
}

impl DeviceEntry {
	pub fn list(devices: &[DeviceDescriptor]) -> Vec<DeviceEntry> {
		devices
			.iter()
			.enumerate()
			.map(|(index, descriptor)| DeviceEntry {
				ordinal: index + 1,
				address: descriptor.address.clone(),
			})
			.collect()
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
	/// Outer loop asks which transport to use.
	SelectTransport,
	IllegalSelection { input: String },
	Legend { transport: TransportKind },
	TransportSwitching { from: TransportKind },

	WaitingForDevices { transport: TransportKind },
	DetectionRestarting,
	DeviceArrived { address: String, transport: TransportKind },
	DeviceRemoved { address: String },
	DetectionFinished,
	DetectionStopped,
	DetectionFailed { reason: String },
	DevicesAvailable { devices: Vec<DeviceEntry> },
	NoDevicesRemain,
	RadioEnabled,

	DeviceOpened { serial: String, ordinal: usize, address: String },
	/// Prompt shown while a device is open and not streaming.
	DeviceReady { serial: String },
	DeviceClosed { serial: String },
	ReopenRequired,
	DeviceDisconnected { serial: String },
	ReconnectRequired,

	MeasurementStatus { status: MeasurementsStatus },
	Measurement(MeasurementRecord),
	Battery { percent: u8 },

	CapabilityUnsupported { operation: String },
	OperationFailed { operation: String, reason: String },
	Rejected { command: String, reason: Rejection, message: String },
	IllegalOption { input: String },
}

impl Notice {
	pub fn kind(&self) -> &'static str {
		match self {
			Notice::SelectTransport => "select_transport",
			Notice::IllegalSelection { .. } => "illegal_selection",
			Notice::Legend { .. } => "legend",
			Notice::TransportSwitching { .. } => "transport_switching",
			Notice::WaitingForDevices { .. } => "waiting_for_devices",
			Notice::DetectionRestarting => "detection_restarting",
			Notice::DeviceArrived { .. } => "device_arrived",
			Notice::DeviceRemoved { .. } => "device_removed",
			Notice::DetectionFinished => "detection_finished",
			Notice::DetectionStopped => "detection_stopped",
			Notice::DetectionFailed { .. } => "detection_failed",
			Notice::DevicesAvailable { .. } => "devices_available",
			Notice::NoDevicesRemain => "no_devices_remain",
			Notice::RadioEnabled => "radio_enabled",
			Notice::DeviceOpened { .. } => "device_opened",
			Notice::DeviceReady { .. } => "device_ready",
			Notice::DeviceClosed { .. } => "device_closed",
			Notice::ReopenRequired => "reopen_required",
			Notice::DeviceDisconnected { .. } => "device_disconnected",
			Notice::ReconnectRequired => "reconnect_required",
			Notice::MeasurementStatus { .. } => "measurement_status",
			Notice::Measurement(_) => "measurement",
			Notice::Battery { .. } => "battery",
			Notice::CapabilityUnsupported { .. } => "capability_unsupported",
			Notice::OperationFailed { .. } => "operation_failed",
			Notice::Rejected { .. } => "rejected",
			Notice::IllegalOption { .. } => "illegal_option",
		}
	}
}

/// Sink for session notices.
pub trait Notifier: Send + Sync {
	fn notify(&self, notice: Notice);
}

/// Notifier that keeps every notice in memory.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
	notices: Mutex<Vec<Notice>>,
}

impl CollectingNotifier {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn snapshot(&self) -> Vec<Notice> {
		self.notices.lock().clone()
	}

	/// Removes and returns everything collected so far.
	pub fn take(&self) -> Vec<Notice> {
		std::mem::take(&mut *self.notices.lock())
	}

	pub fn kinds(&self) -> Vec<&'static str> {
		self.notices.lock().iter().map(Notice::kind).collect()
	}

	pub fn contains(&self, predicate: impl Fn(&Notice) -> bool) -> bool {
		self.notices.lock().iter().any(predicate)
	}
}

impl Notifier for CollectingNotifier {
	fn notify(&self, notice: Notice) {
		self.notices.lock().push(notice);
	}
}

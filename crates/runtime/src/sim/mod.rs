//! In-process simulated backend for both transport kinds.
//!
//! Stands in for the USB and BLE driver stacks so the session core can be
//! exercised end to end without hardware. Besides implementing the
//! collaborator contracts, the simulated types expose hooks that let tests
//! inject arrivals, removals, disconnects and measurement data.
//!
//! # Example
//!
//! ```ignore
//! let backend = SimulatedBackend::new(SimConfig { manual_detection: true, ..SimConfig::default() });
//! let detector = backend.open(TransportKind::DiscoverableLink)?;
//!
//! detector.start_detection().await?;
//! detector.arrive(DeviceDescriptor::new("C4:7F:51:00:00:09"));
//! detector.finish_detection();
//! ```

mod detector;
mod device;

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use dsc_protocol::{DeviceDescriptor, DeviceId, TransportKind};
use serde::{Deserialize, Serialize};

pub use detector::SimulatedDetector;
pub use device::SimulatedDevice;

use crate::error::DetectorError;

/// One simulated device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimDeviceSpec {
	pub address: String,
	pub serial_number: String,
	/// Battery charge reported by the device. `None` models a device class without battery support.
	#[serde(default)]
	pub battery_percent: Option<u8>,
}

impl SimDeviceSpec {
	pub fn new(address: impl Into<String>, serial_number: impl Into<String>) -> Self {
		Self {
			address: address.into(),
			serial_number: serial_number.into(),
			battery_percent: None,
		}
	}

	pub fn with_battery(mut self, percent: u8) -> Self {
		self.battery_percent = Some(percent);
		self
	}

	pub fn descriptor(&self) -> DeviceDescriptor {
		DeviceDescriptor::new(self.address.clone())
	}
}

/// Simulator timing and inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimConfig {
	pub devices: Vec<SimDeviceSpec>,
	/// Length of one discoverable-link detection cycle.
	pub detection_window_ms: u64,
	/// Delay between successive arrivals within a cycle.
	pub arrival_spacing_ms: u64,
	pub measurement_interval_ms: u64,
	/// Delay before a closed discoverable-link device reports its own disconnect.
	pub disconnect_ack_ms: u64,
	/// Leave detection cycles open until the test finishes them explicitly.
	pub manual_detection: bool,
	pub unsupported_transports: Vec<TransportKind>,
}

impl Default for SimConfig {
	fn default() -> Self {
		Self {
			devices: vec![
				SimDeviceSpec::new("C4:7F:51:00:00:01", "SN-100231").with_battery(87),
				SimDeviceSpec::new("C4:7F:51:00:00:02", "SN-100457"),
			],
			detection_window_ms: 3000,
			arrival_spacing_ms: 250,
			measurement_interval_ms: 1000,
			disconnect_ack_ms: 500,
			manual_detection: false,
			unsupported_transports: Vec::new(),
		}
	}
}

impl SimConfig {
	/// Default timings with `count` generated devices.
	pub fn with_device_count(count: usize) -> Self {
		let devices = (1..=count)
			.map(|n| {
				let spec = SimDeviceSpec::new(format!("C4:7F:51:00:00:{n:02X}"), format!("SN-{:06}", 100_000 + n * 17));
				if n % 2 == 1 { spec.with_battery(90usize.saturating_sub(n * 3).max(5) as u8) } else { spec }
			})
			.collect();
		Self { devices, ..Self::default() }
	}

	pub(crate) fn detection_window(&self) -> Duration {
		Duration::from_millis(self.detection_window_ms)
	}

	pub(crate) fn arrival_spacing(&self) -> Duration {
		Duration::from_millis(self.arrival_spacing_ms)
	}

	pub(crate) fn measurement_interval(&self) -> Duration {
		Duration::from_millis(self.measurement_interval_ms.max(1))
	}

	pub(crate) fn disconnect_ack(&self) -> Duration {
		Duration::from_millis(self.disconnect_ack_ms)
	}
}

/// Gateway call recorded by [`SimulatedDetector::calls`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
	StartDetection,
	StopDetection,
	OpenDevice(String),
	CloseDevice(DeviceId),
}

/// Factory for simulated detectors sharing one device-id sequence.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
	config: SimConfig,
	next_device: Arc<AtomicU64>,
}

impl SimulatedBackend {
	pub fn new(config: SimConfig) -> Self {
		Self {
			config,
			next_device: Arc::new(AtomicU64::new(1)),
		}
	}

	pub fn config(&self) -> &SimConfig {
		&self.config
	}

	/// Creates the detector for `transport`.
	///
	/// Fails with [`DetectorError::TransportUnsupported`] when the transport is
	/// listed in `unsupported_transports`.
	pub fn open(&self, transport: TransportKind) -> Result<Arc<SimulatedDetector>, DetectorError> {
		if self.config.unsupported_transports.contains(&transport) {
			return Err(DetectorError::TransportUnsupported(transport));
		}
		Ok(Arc::new(SimulatedDetector::new(transport, self.config.clone(), Arc::clone(&self.next_device))))
	}
}

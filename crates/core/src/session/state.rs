//! The session aggregate and its derived state.

use std::fmt;
use std::sync::Arc;

use dsc_protocol::{DeviceDescriptor, DeviceId, TransportKind};
use dsc_runtime::DeviceHandle;
use serde::Serialize;

/// Coarse session state, derived from the [`Session`] fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
	Idle,
	Detecting,
	DevicesAvailable,
	Connected,
	Streaming,
}

impl SessionState {
	pub fn has_device(self) -> bool {
		matches!(self, SessionState::Connected | SessionState::Streaming)
	}
}

impl fmt::Display for SessionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			SessionState::Idle => "idle",
			SessionState::Detecting => "detecting",
			SessionState::DevicesAvailable => "devices_available",
			SessionState::Connected => "connected",
			SessionState::Streaming => "streaming",
		};
		f.write_str(name)
	}
}

/// The open device together with the ordinal it was selected by.
#[derive(Clone)]
pub struct ConnectedDevice {
	pub handle: Arc<dyn DeviceHandle>,
	pub ordinal: usize,
	pub address: String,
}

impl ConnectedDevice {
	pub fn id(&self) -> DeviceId {
		self.handle.id()
	}
}

impl fmt::Debug for ConnectedDevice {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConnectedDevice")
			.field("id", &self.handle.id())
			.field("ordinal", &self.ordinal)
			.field("address", &self.address)
			.finish()
	}
}

/// Mutable session aggregate.
///
/// Only [`SessionController`](super::SessionController) mutates it. The
/// selected ordinal lives inside [`ConnectedDevice`], so it cannot outlive the
/// connection, and `streaming` is cleared whenever the device is released.
#[derive(Debug)]
pub struct Session {
	transport: TransportKind,
	detection_active: bool,
	connected: Option<ConnectedDevice>,
	streaming: bool,
	measurement_seq: u64,
	discovered: Vec<DeviceDescriptor>,
	detection_cycles: u32,
	detection_generation: u64,
}

impl Session {
	pub fn new(transport: TransportKind) -> Self {
		Self {
			transport,
			detection_active: false,
			connected: None,
			streaming: false,
			measurement_seq: 0,
			discovered: Vec::new(),
			detection_cycles: 0,
			detection_generation: 0,
		}
	}

	pub fn transport(&self) -> TransportKind {
		self.transport
	}

	pub fn is_detecting(&self) -> bool {
		self.detection_active
	}

	pub fn connected_device(&self) -> Option<&ConnectedDevice> {
		self.connected.as_ref()
	}

	/// 1-based ordinal of the connected device.
	pub fn selected_device_index(&self) -> Option<usize> {
		self.connected.as_ref().map(|device| device.ordinal)
	}

	pub fn is_streaming(&self) -> bool {
		self.streaming
	}

	pub fn measurement_seq(&self) -> u64 {
		self.measurement_seq
	}

	pub fn discovered(&self) -> &[DeviceDescriptor] {
		&self.discovered
	}

	/// Consecutive detection cycles started since devices were last found.
	pub fn detection_cycles(&self) -> u32 {
		self.detection_cycles
	}

	/// Identifies the current detection cycle. Never reset.
	pub fn detection_generation(&self) -> u64 {
		self.detection_generation
	}

	pub fn state(&self) -> SessionState {
		if self.connected.is_some() {
			if self.streaming { SessionState::Streaming } else { SessionState::Connected }
		} else if self.detection_active {
			SessionState::Detecting
		} else if !self.discovered.is_empty() {
			SessionState::DevicesAvailable
		} else {
			SessionState::Idle
		}
	}

	pub(crate) fn begin_detection_cycle(&mut self) {
		self.detection_active = true;
		self.detection_cycles = self.detection_cycles.saturating_add(1);
		self.detection_generation += 1;
	}

	pub(crate) fn end_detection(&mut self) {
		self.detection_active = false;
	}

	pub(crate) fn reset_detection_cycles(&mut self) {
		self.detection_cycles = 0;
	}

	pub(crate) fn clear_discovered(&mut self) {
		self.discovered.clear();
	}

	/// Appends `descriptor` unless a device with the same address is already listed.
	pub(crate) fn add_discovered(&mut self, descriptor: DeviceDescriptor) -> bool {
		if self.discovered.iter().any(|d| d.address == descriptor.address) {
			return false;
		}
		self.discovered.push(descriptor);
		true
	}

	pub(crate) fn remove_discovered(&mut self, address: &str) -> bool {
		let before = self.discovered.len();
		self.discovered.retain(|d| d.address != address);
		self.discovered.len() != before
	}

	/// Records a freshly opened device. Resets the measurement counter.
	pub(crate) fn connect(&mut self, device: ConnectedDevice) {
		self.connected = Some(device);
		self.streaming = false;
		self.measurement_seq = 0;
	}

	/// Forgets the connected device and clears `streaming`.
	pub(crate) fn release(&mut self) -> Option<ConnectedDevice> {
		self.streaming = false;
		self.connected.take()
	}

	pub(crate) fn set_streaming(&mut self, streaming: bool) {
		self.streaming = streaming && self.connected.is_some();
	}

	pub(crate) fn next_measurement_seq(&mut self) -> u64 {
		self.measurement_seq += 1;
		self.measurement_seq
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn state_prefers_detection_over_listed_devices() {
		let mut session = Session::new(TransportKind::DiscoverableLink);
		assert_eq!(session.state(), SessionState::Idle);

		session.add_discovered(DeviceDescriptor::new("A"));
		assert_eq!(session.state(), SessionState::DevicesAvailable);

		session.begin_detection_cycle();
		assert_eq!(session.state(), SessionState::Detecting);
		assert_eq!(session.detection_cycles(), 1);

		session.end_detection();
		assert_eq!(session.state(), SessionState::DevicesAvailable);
	}

	#[test]
	fn discovered_keeps_net_set_in_arrival_order() {
		let mut session = Session::new(TransportKind::DiscoverableLink);
		assert!(session.add_discovered(DeviceDescriptor::new("A")));
		assert!(session.add_discovered(DeviceDescriptor::new("B")));
		assert!(!session.add_discovered(DeviceDescriptor::new("A")));
		assert!(session.add_discovered(DeviceDescriptor::new("C")));
		assert!(session.remove_discovered("B"));
		assert!(!session.remove_discovered("Z"));

		let addresses: Vec<_> = session.discovered().iter().map(|d| d.address.as_str()).collect();
		assert_eq!(addresses, ["A", "C"]);
	}

	#[test]
	fn streaming_requires_a_device() {
		let mut session = Session::new(TransportKind::ContinuousLink);
		session.set_streaming(true);
		assert!(!session.is_streaming());
		assert_eq!(session.selected_device_index(), None);
	}
}

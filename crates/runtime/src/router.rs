//! Serializes collaborator callbacks onto the session's control task.
//!
//! Detector and device callbacks fire on backend threads. The router hands
//! each collaborator a sink that only pushes onto an unbounded channel, so the
//! owning task sees every event in per-source arrival order and is the only
//! place session state is mutated.
//!
//! # Subscription ledger
//!
//! The router records which sources it is attached to. Attach and detach are
//! idempotent, and the ledger lets callers assert that every exit path left
//! no registration behind (`active_subscriptions() == 0`).

use std::collections::BTreeSet;
use std::sync::Arc;

use dsc_protocol::{DetectorEvent, DeviceEvent, DeviceId};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::gateway::{DetectorGateway, DeviceHandle};
use crate::hub::SubscriberId;

/// Event delivered to the session task.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
	Detector(DetectorEvent),
	/// Event from the opened device identified by `device`.
	Device { device: DeviceId, event: DeviceEvent },
}

/// Channel-backed bridge from collaborator callbacks to one owner task.
pub struct EventRouter {
	subscriber: SubscriberId,
	tx: mpsc::UnboundedSender<SessionEvent>,
	rx: mpsc::UnboundedReceiver<SessionEvent>,
	detector_attached: bool,
	devices: BTreeSet<DeviceId>,
}

impl EventRouter {
	pub fn new() -> Self {
		let (tx, rx) = mpsc::unbounded_channel();
		Self {
			subscriber: SubscriberId::next(),
			tx,
			rx,
			detector_attached: false,
			devices: BTreeSet::new(),
		}
	}

	/// Subscribes to detector events. Returns `true` when a new registration was made.
	pub fn attach_detector(&mut self, gateway: &dyn DetectorGateway) -> bool {
		if self.detector_attached {
			return false;
		}
		let tx = self.tx.clone();
		gateway.subscribe(
			self.subscriber,
			Arc::new(move |event: DetectorEvent| {
				trace!(target: "dsc.router", event = event.name(), "detector event queued");
				let _ = tx.send(SessionEvent::Detector(event));
			}),
		);
		self.detector_attached = true;
		debug!(target: "dsc.router", subscriber = %self.subscriber, transport = %gateway.transport(), "attached to detector");
		true
	}

	/// Removes the detector registration. Returns `true` when one was removed.
	pub fn detach_detector(&mut self, gateway: &dyn DetectorGateway) -> bool {
		if !self.detector_attached {
			return false;
		}
		gateway.unsubscribe(self.subscriber);
		self.detector_attached = false;
		debug!(target: "dsc.router", subscriber = %self.subscriber, "detached from detector");
		true
	}

	/// Subscribes to stream events of `device`.
	pub fn attach_device(&mut self, device: &dyn DeviceHandle) -> bool {
		let id = device.id();
		if self.devices.contains(&id) {
			return false;
		}
		let tx = self.tx.clone();
		device.subscribe(
			self.subscriber,
			Arc::new(move |event: DeviceEvent| {
				trace!(target: "dsc.router", device = %id, event = event.name(), "device event queued");
				let _ = tx.send(SessionEvent::Device { device: id, event });
			}),
		);
		self.devices.insert(id);
		debug!(target: "dsc.router", subscriber = %self.subscriber, device = %id, "attached to device");
		true
	}

	pub fn detach_device(&mut self, device: &dyn DeviceHandle) -> bool {
		let id = device.id();
		if !self.devices.remove(&id) {
			return false;
		}
		device.unsubscribe(self.subscriber);
		debug!(target: "dsc.router", subscriber = %self.subscriber, device = %id, "detached from device");
		true
	}

	/// Number of live registrations held by this router.
	pub fn active_subscriptions(&self) -> usize {
		usize::from(self.detector_attached) + self.devices.len()
	}

	/// Waits for the next queued event.
	///
	/// Never yields `None` while the router is alive since it keeps its own sender.
	pub async fn recv(&mut self) -> Option<SessionEvent> {
		self.rx.recv().await
	}

	/// Takes the next queued event without waiting.
	pub fn try_recv(&mut self) -> Option<SessionEvent> {
		self.rx.try_recv().ok()
	}
}

impl Default for EventRouter {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use dsc_protocol::{ClinicalResult, DeviceDescriptor, ResultSet, TransportKind};

	use super::*;
	use crate::sim::{SimConfig, SimulatedBackend};

	fn manual_backend() -> SimulatedBackend {
		SimulatedBackend::new(SimConfig {
			manual_detection: true,
			..SimConfig::default()
		})
	}

	#[tokio::test]
	async fn detector_events_arrive_in_emission_order() {
		let detector = manual_backend().open(TransportKind::DiscoverableLink).unwrap();
		let mut router = EventRouter::new();
		assert!(router.attach_detector(detector.as_ref()));

		detector.arrive(DeviceDescriptor::new("A"));
		detector.arrive(DeviceDescriptor::new("B"));
		detector.remove("A");

		assert_eq!(router.try_recv(), Some(SessionEvent::Detector(DetectorEvent::DeviceArrived(DeviceDescriptor::new("A")))));
		assert_eq!(router.try_recv(), Some(SessionEvent::Detector(DetectorEvent::DeviceArrived(DeviceDescriptor::new("B")))));
		assert_eq!(router.try_recv(), Some(SessionEvent::Detector(DetectorEvent::DeviceRemoved(DeviceDescriptor::new("A")))));
		assert_eq!(router.try_recv(), None);
	}

	#[tokio::test]
	async fn attach_and_detach_are_idempotent_and_symmetric() {
		let detector = manual_backend().open(TransportKind::ContinuousLink).unwrap();
		let mut router = EventRouter::new();

		assert!(router.attach_detector(detector.as_ref()));
		assert!(!router.attach_detector(detector.as_ref()));
		assert_eq!(detector.subscriber_count(), 1);

		assert!(router.detach_detector(detector.as_ref()));
		assert!(!router.detach_detector(detector.as_ref()));
		assert_eq!(detector.subscriber_count(), 0);
		assert_eq!(router.active_subscriptions(), 0);
	}

	#[tokio::test]
	async fn device_events_are_tagged_with_device_id() {
		let detector = manual_backend().open(TransportKind::ContinuousLink).unwrap();
		let descriptor = detector.devices()[0].clone();
		let device = detector.open_device(&descriptor).await.unwrap();
		let sim_device = detector.open_devices().pop().unwrap();

		let mut router = EventRouter::new();
		assert!(router.attach_device(device.as_ref()));
		assert!(!router.attach_device(device.as_ref()));
		assert_eq!(router.active_subscriptions(), 1);

		let set = ResultSet::new(vec![ClinicalResult::valid("pulse", 64.0)]);
		sim_device.emit_measurement(set.clone());

		assert_eq!(
			router.try_recv(),
			Some(SessionEvent::Device {
				device: device.id(),
				event: DeviceEvent::MeasurementArrived(set),
			})
		);

		assert!(router.detach_device(device.as_ref()));
		assert_eq!(sim_device.subscriber_count(), 0);
		sim_device.emit_measurement(ResultSet::default());
		assert_eq!(router.try_recv(), None);
	}
}

//! Simulated detector gateway.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dsc_protocol::{DetectorEvent, DeviceDescriptor, DeviceId, DeviceInformation, TransportKind};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use super::device::SimulatedDevice;
use super::{GatewayCall, SimConfig, SimDeviceSpec};
use crate::error::{DetectorError, DeviceError};
use crate::gateway::{DetectorGateway, DeviceHandle};
use crate::hub::{EventHub, EventSink, SubscriberId};

#[derive(Default)]
struct DetectorState {
	visible: Vec<DeviceDescriptor>,
	open: Vec<Arc<SimulatedDevice>>,
	scan_task: Option<JoinHandle<()>>,
	calls: Vec<GatewayCall>,
}

/// Detector for one transport kind, created by [`SimulatedBackend::open`](super::SimulatedBackend::open).
pub struct SimulatedDetector {
	transport: TransportKind,
	config: SimConfig,
	hub: Arc<EventHub<DetectorEvent>>,
	state: Arc<Mutex<DetectorState>>,
	detecting: Arc<AtomicBool>,
	radio_enabled: AtomicBool,
	next_device: Arc<AtomicU64>,
}

impl SimulatedDetector {
	pub(crate) fn new(transport: TransportKind, config: SimConfig, next_device: Arc<AtomicU64>) -> Self {
		// A continuous link enumerates attached devices without a scan.
		let visible = match transport {
			TransportKind::ContinuousLink => config.devices.iter().map(SimDeviceSpec::descriptor).collect(),
			TransportKind::DiscoverableLink => Vec::new(),
		};
		Self {
			transport,
			config,
			hub: Arc::new(EventHub::new()),
			state: Arc::new(Mutex::new(DetectorState {
				visible,
				..DetectorState::default()
			})),
			detecting: Arc::new(AtomicBool::new(false)),
			radio_enabled: AtomicBool::new(true),
			next_device,
		}
	}

	/// Gateway calls made so far, oldest first.
	pub fn calls(&self) -> Vec<GatewayCall> {
		self.state.lock().calls.clone()
	}

	pub fn subscriber_count(&self) -> usize {
		self.hub.subscriber_count()
	}

	/// Devices currently open through this detector.
	pub fn open_devices(&self) -> Vec<Arc<SimulatedDevice>> {
		self.state.lock().open.clone()
	}

	/// Makes `descriptor` visible and emits `DeviceArrived`.
	pub fn arrive(&self, descriptor: DeviceDescriptor) {
		{
			let mut state = self.state.lock();
			if !state.visible.contains(&descriptor) {
				state.visible.push(descriptor.clone());
			}
		}
		self.hub.emit(DetectorEvent::DeviceArrived(descriptor));
	}

	/// Removes the device at `address` from the visible set and emits `DeviceRemoved`.
	pub fn remove(&self, address: &str) {
		let removed = {
			let mut state = self.state.lock();
			let position = state.visible.iter().position(|d| d.address == address);
			position.map(|index| state.visible.remove(index))
		};
		let descriptor = removed.unwrap_or_else(|| DeviceDescriptor::new(address));
		self.hub.emit(DetectorEvent::DeviceRemoved(descriptor));
	}

	/// Ends the open detection cycle (manual mode) and emits `DevicesDetectionFinished`.
	pub fn finish_detection(&self) {
		if let Some(task) = self.state.lock().scan_task.take() {
			task.abort();
		}
		self.hub.emit(DetectorEvent::DevicesDetectionFinished);
		self.detecting.store(false, Ordering::SeqCst);
	}

	/// Drops the link of an open device as if it failed unexpectedly.
	///
	/// Returns `false` when no open device has this id.
	pub fn disconnect(&self, device: DeviceId) -> bool {
		let Some(sim) = self.take_open(device) else {
			return false;
		};
		sim.shutdown();
		self.hub.emit(DetectorEvent::DeviceDisconnected {
			device,
			information: sim.information(),
		});
		true
	}

	/// Switches the simulated radio. While off, detection cannot start.
	pub fn set_radio(&self, enabled: bool) {
		self.radio_enabled.store(enabled, Ordering::SeqCst);
		if !enabled {
			if let Some(task) = self.state.lock().scan_task.take() {
				task.abort();
			}
			self.detecting.store(false, Ordering::SeqCst);
		}
		self.hub.emit(DetectorEvent::DetectionStateChanged { enabled });
	}

	/// Emits an arbitrary detector event.
	pub fn emit(&self, event: DetectorEvent) {
		self.hub.emit(event);
	}

	fn record(&self, call: GatewayCall) {
		self.state.lock().calls.push(call);
	}

	fn take_open(&self, device: DeviceId) -> Option<Arc<SimulatedDevice>> {
		let mut state = self.state.lock();
		let index = state.open.iter().position(|d| d.id() == device)?;
		Some(state.open.remove(index))
	}

	fn spec_for(&self, descriptor: &DeviceDescriptor) -> SimDeviceSpec {
		self.config
			.devices
			.iter()
			.find(|spec| spec.address == descriptor.address)
			.cloned()
			.unwrap_or_else(|| SimDeviceSpec::new(descriptor.address.clone(), format!("SN-{}", descriptor.address.replace(':', ""))))
	}
}

impl Drop for SimulatedDetector {
	fn drop(&mut self) {
		if let Some(task) = self.state.lock().scan_task.take() {
			task.abort();
		}
	}
}

struct ScanCycle {
	state: Arc<Mutex<DetectorState>>,
	hub: Arc<EventHub<DetectorEvent>>,
	detecting: Arc<AtomicBool>,
	devices: Vec<SimDeviceSpec>,
	spacing: Duration,
	window: Duration,
}

impl ScanCycle {
	async fn run(self) {
		let started = Instant::now();
		for spec in &self.devices {
			tokio::time::sleep(self.spacing).await;
			if started.elapsed() >= self.window {
				break;
			}
			let descriptor = spec.descriptor();
			self.state.lock().visible.push(descriptor.clone());
			self.hub.emit(DetectorEvent::DeviceArrived(descriptor));
		}
		tokio::time::sleep(self.window.saturating_sub(started.elapsed())).await;

		// Event before flag: a poller that sees the flag cleared finds the event already queued.
		debug!(target: "dsc.sim", "detection cycle finished");
		self.hub.emit(DetectorEvent::DevicesDetectionFinished);
		self.detecting.store(false, Ordering::SeqCst);
	}
}

#[async_trait]
impl DetectorGateway for SimulatedDetector {
	fn transport(&self) -> TransportKind {
		self.transport
	}

	async fn start_detection(&self) -> Result<(), DetectorError> {
		self.record(GatewayCall::StartDetection);
		if !self.radio_enabled.load(Ordering::SeqCst) {
			return Err(DetectorError::RadioUnavailable(format!("{} radio is switched off", self.transport)));
		}
		if self.transport == TransportKind::ContinuousLink {
			debug!(target: "dsc.sim", "hot-plug monitoring enabled");
			return Ok(());
		}

		{
			let mut state = self.state.lock();
			if let Some(task) = state.scan_task.take() {
				task.abort();
			}
			state.visible.clear();
			self.detecting.store(true, Ordering::SeqCst);
			if !self.config.manual_detection {
				let cycle = ScanCycle {
					state: Arc::clone(&self.state),
					hub: Arc::clone(&self.hub),
					detecting: Arc::clone(&self.detecting),
					devices: self.config.devices.clone(),
					spacing: self.config.arrival_spacing(),
					window: self.config.detection_window(),
				};
				state.scan_task = Some(tokio::spawn(cycle.run()));
			}
		}
		debug!(target: "dsc.sim", manual = self.config.manual_detection, "detection cycle started");
		Ok(())
	}

	async fn stop_detection(&self) -> Result<(), DetectorError> {
		self.record(GatewayCall::StopDetection);
		if let Some(task) = self.state.lock().scan_task.take() {
			task.abort();
		}
		self.detecting.store(false, Ordering::SeqCst);
		Ok(())
	}

	fn is_detecting(&self) -> bool {
		self.detecting.load(Ordering::SeqCst)
	}

	fn devices(&self) -> Vec<DeviceDescriptor> {
		self.state.lock().visible.clone()
	}

	async fn open_device(&self, descriptor: &DeviceDescriptor) -> Result<Arc<dyn DeviceHandle>, DetectorError> {
		self.record(GatewayCall::OpenDevice(descriptor.address.clone()));
		if !self.state.lock().visible.contains(descriptor) {
			return Err(DetectorError::DeviceUnreachable {
				address: descriptor.address.clone(),
			});
		}

		let spec = self.spec_for(descriptor);
		let id = DeviceId(self.next_device.fetch_add(1, Ordering::Relaxed));
		let device = Arc::new(SimulatedDevice::new(
			id,
			spec.address.clone(),
			DeviceInformation::with_serial(spec.serial_number.clone()),
			spec.battery_percent,
			self.config.measurement_interval(),
		));
		self.state.lock().open.push(Arc::clone(&device));
		debug!(target: "dsc.sim", device = %id, address = %spec.address, "device opened");
		Ok(device)
	}

	async fn close_device(&self, device: Arc<dyn DeviceHandle>) -> Result<(), DetectorError> {
		let id = device.id();
		self.record(GatewayCall::CloseDevice(id));
		let Some(sim) = self.take_open(id) else {
			return Err(DeviceError::NotOpen.into());
		};
		sim.shutdown();
		debug!(target: "dsc.sim", device = %id, "device closed");

		if self.transport == TransportKind::DiscoverableLink {
			// The peripheral acknowledges the close with its own disconnect indication.
			let hub = Arc::clone(&self.hub);
			let ack = self.config.disconnect_ack();
			let information = sim.information();
			tokio::spawn(async move {
				tokio::time::sleep(ack).await;
				hub.emit(DetectorEvent::DeviceDisconnected { device: id, information });
			});
		}
		Ok(())
	}

	fn subscribe(&self, id: SubscriberId, sink: EventSink<DetectorEvent>) -> bool {
		self.hub.subscribe(id, sink)
	}

	fn unsubscribe(&self, id: SubscriberId) -> bool {
		self.hub.unsubscribe(id)
	}
}

//! Session controller: applies commands and collaborator events to the session.

use std::sync::Arc;

use dsc_protocol::{DetectorEvent, DeviceEvent, DeviceId, DeviceInformation, TransportKind};
use dsc_runtime::{DetectorGateway, DeviceHandle, EventRouter, SessionEvent};
use tracing::{debug, info, warn};

use super::command::Command;
use super::gating::{Rejection, gate};
use super::measurement::MeasurementRecord;
use super::state::{ConnectedDevice, Session, SessionState};
use crate::config::SessionConfig;
use crate::error::{ErrorKind, Result, SessionError};
use crate::notice::{DeviceEntry, Notice, Notifier};

/// What the command loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
	Continue,
	/// The session was torn down; the caller should pick the other transport.
	SwitchTransport,
	/// The session was torn down; the caller should stop.
	Exit,
}

/// Owns one [`Session`] and is the only code that mutates it.
///
/// Commands arrive through [`execute`](Self::execute), collaborator events
/// through [`handle_event`](Self::handle_event) after the router has queued
/// them. Both run on the owning task, so no transition ever interleaves with
/// another.
pub struct SessionController {
	session: Session,
	gateway: Arc<dyn DetectorGateway>,
	router: EventRouter,
	notifier: Arc<dyn Notifier>,
	config: SessionConfig,
}

impl SessionController {
	pub fn new(gateway: Arc<dyn DetectorGateway>, notifier: Arc<dyn Notifier>, config: SessionConfig) -> Self {
		Self {
			session: Session::new(gateway.transport()),
			gateway,
			router: EventRouter::new(),
			notifier,
			config,
		}
	}

	pub fn session(&self) -> &Session {
		&self.session
	}

	pub fn state(&self) -> SessionState {
		self.session.state()
	}

	pub fn transport(&self) -> TransportKind {
		self.session.transport()
	}

	pub fn router(&self) -> &EventRouter {
		&self.router
	}

	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	pub fn notify(&self, notice: Notice) {
		self.notifier.notify(notice);
	}

	/// Subscribes to the detector and runs the first detection.
	pub async fn start(&mut self) {
		self.router.attach_detector(self.gateway.as_ref());
		info!(target: "dsc.session", transport = %self.transport(), "session started");
		self.begin_detection().await;
	}

	/// Runs `command`, reporting any failure as a notice.
	pub async fn execute(&mut self, command: Command) -> LoopControl {
		match self.try_execute(command).await {
			Ok(control) => control,
			Err(err) => {
				self.report(command, err);
				LoopControl::Continue
			}
		}
	}

	/// Runs `command` and returns its failure instead of reporting it.
	pub async fn try_execute(&mut self, command: Command) -> Result<LoopControl> {
		self.reap_closed_device();
		gate(&command, self.transport(), self.state())?;
		debug!(target: "dsc.session", command = %command, state = %self.state(), "executing");

		match command {
			Command::StartScan => {
				self.notify(Notice::DetectionRestarting);
				self.session.reset_detection_cycles();
				self.begin_detection().await;
			}
			Command::StopScan => self.stop_detection().await?,
			Command::SelectDevice(ordinal) => self.connect(ordinal).await?,
			Command::OpenSingleDevice => self.connect(1).await?,
			Command::Close => self.close().await,
			Command::StartMeasuring => self.start_measuring().await?,
			Command::StopMeasuring => self.stop_measuring().await?,
			Command::GetBattery => self.battery().await?,
			Command::Legend => self.notify(Notice::Legend { transport: self.transport() }),
			Command::SwitchTransport => {
				self.shutdown().await;
				self.notify(Notice::TransportSwitching { from: self.transport() });
				return Ok(LoopControl::SwitchTransport);
			}
			Command::Exit => {
				self.shutdown().await;
				return Ok(LoopControl::Exit);
			}
		}
		Ok(LoopControl::Continue)
	}

	fn report(&self, command: Command, err: SessionError) {
		match err.kind() {
			ErrorKind::IllegalCommand => debug!(target: "dsc.session", command = %command, error = %err, "command rejected"),
			ErrorKind::CapabilityUnsupported => info!(target: "dsc.session", command = %command, error = %err, "capability not supported by device"),
			ErrorKind::CollaboratorFailure => warn!(target: "dsc.session", command = %command, error = %err, "command failed"),
		}
		let notice = match err {
			SessionError::Rejected(reason) => Notice::Rejected {
				command: command.name().to_string(),
				message: reason.message(),
				reason,
			},
			SessionError::CapabilityUnsupported { operation } => Notice::CapabilityUnsupported {
				operation: operation.to_string(),
			},
			other => Notice::OperationFailed {
				operation: command.name().to_string(),
				reason: other.to_string(),
			},
		};
		self.notify(notice);
	}

	/// Waits for the next collaborator event.
	pub async fn next_event(&mut self) -> Option<SessionEvent> {
		self.router.recv().await
	}

	/// Handles every event already queued, without waiting.
	pub async fn drain_events(&mut self) {
		while let Some(event) = self.router.try_recv() {
			self.handle_event(event).await;
		}
	}

	/// Completes the detection cycle if the gateway stopped detecting on its own.
	///
	/// The flag is read before the queue is drained, so a finish event emitted
	/// ahead of the flag change is handled first. A cycle re-armed while draining
	/// belongs to a newer generation and is left running.
	pub async fn poll_detection(&mut self) {
		if !self.session.is_detecting() {
			return;
		}
		let generation = self.session.detection_generation();
		let still_detecting = self.gateway.is_detecting();
		self.drain_events().await;
		if self.session.is_detecting() && self.session.detection_generation() == generation && !still_detecting {
			debug!(target: "dsc.session", "detection ended without finish event");
			self.complete_detection().await;
		}
	}

	pub async fn handle_event(&mut self, event: SessionEvent) {
		match event {
			SessionEvent::Detector(event) => self.on_detector_event(event).await,
			SessionEvent::Device { device, event } => self.on_device_event(device, event),
		}
	}

	async fn on_detector_event(&mut self, event: DetectorEvent) {
		match event {
			DetectorEvent::DeviceArrived(descriptor) => {
				if self.session.add_discovered(descriptor.clone()) {
					debug!(target: "dsc.session", address = %descriptor.address, "device arrived");
				}
				self.notify(Notice::DeviceArrived {
					address: descriptor.address,
					transport: self.transport(),
				});
			}
			DetectorEvent::DeviceRemoved(descriptor) => {
				self.session.remove_discovered(&descriptor.address);
				self.notify(Notice::DeviceRemoved { address: descriptor.address });
			}
			DetectorEvent::DevicesDetectionFinished => {
				if self.session.is_detecting() {
					self.complete_detection().await;
				} else {
					debug!(target: "dsc.session", "finish event outside a detection cycle");
				}
			}
			DetectorEvent::DeviceDisconnected { device, information } => self.on_device_lost(device, information),
			DetectorEvent::DetectionStateChanged { enabled } => {
				debug!(target: "dsc.session", enabled, "detection state changed");
				if enabled {
					self.notify(Notice::RadioEnabled);
				}
			}
		}
	}

	fn on_device_event(&mut self, device: DeviceId, event: DeviceEvent) {
		if self.session.connected_device().map(ConnectedDevice::id) != Some(device) {
			debug!(target: "dsc.session", device = %device, event = event.name(), "ignoring event from stale device");
			return;
		}
		match event {
			DeviceEvent::MeasurementsStatusChanged { status } => self.notify(Notice::MeasurementStatus { status }),
			DeviceEvent::MeasurementArrived(results) => {
				if !self.session.is_streaming() {
					debug!(target: "dsc.session", device = %device, "measurement outside streaming dropped");
					return;
				}
				let seq = self.session.next_measurement_seq();
				self.notify(Notice::Measurement(MeasurementRecord::new(seq, &results)));
			}
		}
	}

	/// Treats a connected handle that reports itself closed as lost, even if its
	/// disconnect event is still queued. The queued event is then ignored as stale.
	fn reap_closed_device(&mut self) {
		let Some(device) = self.session.connected_device() else {
			return;
		};
		if device.handle.is_open() {
			return;
		}
		let (id, information) = (device.id(), device.handle.information());
		debug!(target: "dsc.session", device = %id, "connected handle reports closed");
		self.on_device_lost(id, information);
	}

	fn on_device_lost(&mut self, device: DeviceId, information: DeviceInformation) {
		if self.session.connected_device().map(ConnectedDevice::id) != Some(device) {
			debug!(target: "dsc.session", device = %device, "disconnect for a device that is not connected");
			return;
		}
		self.release_device();
		warn!(target: "dsc.session", device = %device, serial = %information.serial_number, "device disconnected unexpectedly");
		self.notify(Notice::DeviceDisconnected {
			serial: information.serial_number,
		});

		match self.transport() {
			TransportKind::ContinuousLink => self.notify(Notice::ReconnectRequired),
			TransportKind::DiscoverableLink => self.announce_devices(),
		}
	}

	/// Starts a detection cycle. Failures are reported, never returned.
	async fn begin_detection(&mut self) {
		self.session.clear_discovered();
		self.notify(Notice::WaitingForDevices { transport: self.transport() });

		if self.transport() == TransportKind::ContinuousLink {
			for descriptor in self.gateway.devices() {
				self.session.add_discovered(descriptor.clone());
				self.notify(Notice::DeviceArrived {
					address: descriptor.address,
					transport: TransportKind::ContinuousLink,
				});
			}
		}

		match self.gateway.start_detection().await {
			Ok(()) => {
				if self.transport().is_discoverable() {
					self.session.begin_detection_cycle();
					debug!(target: "dsc.session", cycle = self.session.detection_cycles(), "detection cycle started");
				}
			}
			Err(err) => {
				warn!(target: "dsc.session", error = %err, "detection failed to start");
				self.notify(Notice::DetectionFailed { reason: err.to_string() });
			}
		}
	}

	async fn complete_detection(&mut self) {
		self.session.end_detection();
		self.notify(Notice::DetectionFinished);

		if !self.session.discovered().is_empty() {
			self.session.reset_detection_cycles();
			self.announce_devices();
			return;
		}

		let within_bound = self.config.max_detection_cycles.is_none_or(|max| self.session.detection_cycles() < max);
		if self.transport().is_discoverable() && self.config.auto_restart_detection && within_bound {
			debug!(target: "dsc.session", "no devices found, re-arming detection");
			self.begin_detection().await;
		} else {
			if !within_bound {
				warn!(target: "dsc.session", cycles = self.session.detection_cycles(), "giving up after empty detection cycles");
			}
			self.notify(Notice::NoDevicesRemain);
		}
	}

	async fn stop_detection(&mut self) -> Result<()> {
		self.gateway.stop_detection().await?;
		self.session.end_detection();
		self.notify(Notice::DetectionStopped);
		if !self.session.discovered().is_empty() {
			self.announce_devices();
		}
		Ok(())
	}

	fn announce_devices(&self) {
		let discovered = self.session.discovered();
		if discovered.is_empty() {
			self.notify(Notice::NoDevicesRemain);
		} else {
			self.notify(Notice::DevicesAvailable {
				devices: DeviceEntry::list(discovered),
			});
		}
	}

	async fn connect(&mut self, ordinal: usize) -> Result<()> {
		let selected = ordinal.checked_sub(1).and_then(|index| self.session.discovered().get(index)).cloned();
		if let Some(device) = self.session.connected_device() {
			let same = selected.as_ref().is_some_and(|descriptor| descriptor.address == device.address);
			return Err(if same { Rejection::AlreadyOpen } else { Rejection::OtherDeviceOpen }.into());
		}
		let available = self.session.discovered().len();
		if available == 0 {
			return Err(Rejection::NoDevicesDetected.into());
		}
		let Some(descriptor) = selected else {
			return Err(Rejection::IndexOutOfRange { ordinal, available }.into());
		};

		let handle = self.gateway.open_device(&descriptor).await?;
		let serial = handle.information().serial_number;
		info!(target: "dsc.session", ordinal, address = %descriptor.address, serial = %serial, device = %handle.id(), "device opened");
		self.session.connect(ConnectedDevice {
			handle,
			ordinal,
			address: descriptor.address.clone(),
		});
		self.notify(Notice::DeviceOpened {
			serial: serial.clone(),
			ordinal,
			address: descriptor.address,
		});
		self.notify(Notice::DeviceReady { serial });
		Ok(())
	}

	async fn start_measuring(&mut self) -> Result<()> {
		let handle = self.connected_handle()?;
		self.router.attach_device(handle.as_ref());
		if let Err(err) = handle.start_measurement().await {
			self.router.detach_device(handle.as_ref());
			return Err(err.into());
		}
		self.session.set_streaming(true);
		info!(target: "dsc.session", device = %handle.id(), "streaming started");
		Ok(())
	}

	/// Always leaves the session connected and unsubscribed, even if the device fails to stop.
	async fn stop_measuring(&mut self) -> Result<()> {
		let handle = self.connected_handle()?;
		let stopped = handle.stop_measurement().await;
		self.router.detach_device(handle.as_ref());
		self.session.set_streaming(false);
		info!(target: "dsc.session", device = %handle.id(), "streaming stopped");
		stopped?;
		self.notify(Notice::DeviceReady {
			serial: handle.information().serial_number,
		});
		Ok(())
	}

	async fn battery(&mut self) -> Result<()> {
		let handle = self.connected_handle()?;
		match handle.battery_status().await {
			Ok(percent) => {
				self.notify(Notice::Battery { percent });
				Ok(())
			}
			Err(err) if err.is_unsupported() => Err(SessionError::CapabilityUnsupported { operation: "get-battery" }),
			Err(err) => Err(err.into()),
		}
	}

	async fn close(&mut self) {
		let Some(device) = self.session.connected_device().cloned() else {
			return;
		};
		let serial = device.handle.information().serial_number;
		self.close_device(&device).await;
		self.release_device();
		info!(target: "dsc.session", serial = %serial, "device closed");
		self.notify(Notice::DeviceClosed { serial });

		match self.transport() {
			TransportKind::ContinuousLink => self.notify(Notice::ReopenRequired),
			TransportKind::DiscoverableLink if self.config.auto_restart_detection => {
				self.notify(Notice::DetectionRestarting);
				self.session.reset_detection_cycles();
				self.begin_detection().await;
			}
			TransportKind::DiscoverableLink => {}
		}
	}

	/// Best-effort close, followed on the discoverable link by the acknowledgment grace wait.
	async fn close_device(&self, device: &ConnectedDevice) {
		if let Err(err) = self.gateway.close_device(Arc::clone(&device.handle)).await {
			warn!(target: "dsc.session", device = %device.id(), error = %err, "close failed, releasing device anyway");
		}
		if self.transport().is_discoverable() {
			tokio::time::sleep(self.config.close_grace()).await;
		}
	}

	fn release_device(&mut self) {
		if let Some(device) = self.session.release() {
			self.router.detach_device(device.handle.as_ref());
		}
	}

	fn connected_handle(&self) -> Result<Arc<dyn DeviceHandle>> {
		self.session
			.connected_device()
			.map(|device| Arc::clone(&device.handle))
			.filter(|handle| handle.is_open())
			.ok_or(SessionError::Rejected(Rejection::NoDeviceOpen))
	}

	/// Releases every resource the session holds. Safe to call more than once.
	pub async fn shutdown(&mut self) {
		if let Some(device) = self.session.connected_device().cloned() {
			self.close_device(&device).await;
			self.release_device();
		}
		if self.session.is_detecting() {
			if let Err(err) = self.gateway.stop_detection().await {
				warn!(target: "dsc.session", error = %err, "failed to stop detection during teardown");
			}
			self.session.end_detection();
		}
		if self.router.detach_detector(self.gateway.as_ref()) {
			info!(target: "dsc.session", transport = %self.transport(), "session torn down");
		}
	}
}

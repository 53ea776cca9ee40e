//! Simulated opened device.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dsc_protocol::{ClinicalResult, DeviceEvent, DeviceId, DeviceInformation, MeasurementsStatus, ResultSet};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::DeviceError;
use crate::gateway::DeviceHandle;
use crate::hub::{EventHub, EventSink, SubscriberId};

/// Device produced by [`SimulatedDetector::open_device`](super::SimulatedDetector).
pub struct SimulatedDevice {
	id: DeviceId,
	address: String,
	information: DeviceInformation,
	battery_percent: Option<u8>,
	interval: Duration,
	open: AtomicBool,
	hub: Arc<EventHub<DeviceEvent>>,
	stream: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedDevice {
	pub(crate) fn new(id: DeviceId, address: String, information: DeviceInformation, battery_percent: Option<u8>, interval: Duration) -> Self {
		Self {
			id,
			address,
			information,
			battery_percent,
			interval,
			open: AtomicBool::new(true),
			hub: Arc::new(EventHub::new()),
			stream: Mutex::new(None),
		}
	}

	pub fn address(&self) -> &str {
		&self.address
	}

	pub fn is_streaming(&self) -> bool {
		self.stream.lock().is_some()
	}

	pub fn subscriber_count(&self) -> usize {
		self.hub.subscriber_count()
	}

	/// Emits a measurement as if the device had produced it.
	pub fn emit_measurement(&self, results: ResultSet) {
		self.hub.emit(DeviceEvent::MeasurementArrived(results));
	}

	/// Emits an arbitrary device event.
	pub fn emit(&self, event: DeviceEvent) {
		self.hub.emit(event);
	}

	/// Marks the device closed and stops its stream.
	pub(crate) fn shutdown(&self) {
		self.open.store(false, Ordering::SeqCst);
		if let Some(task) = self.stream.lock().take() {
			task.abort();
		}
	}

	fn ensure_open(&self) -> Result<(), DeviceError> {
		if self.open.load(Ordering::SeqCst) { Ok(()) } else { Err(DeviceError::NotOpen) }
	}
}

impl Drop for SimulatedDevice {
	fn drop(&mut self) {
		if let Some(task) = self.stream.get_mut().take() {
			task.abort();
		}
	}
}

#[async_trait]
impl DeviceHandle for SimulatedDevice {
	fn id(&self) -> DeviceId {
		self.id
	}

	fn is_open(&self) -> bool {
		self.open.load(Ordering::SeqCst)
	}

	fn information(&self) -> DeviceInformation {
		self.information.clone()
	}

	async fn start_measurement(&self) -> Result<(), DeviceError> {
		self.ensure_open()?;
		{
			let mut stream = self.stream.lock();
			if stream.is_some() {
				return Ok(());
			}
			let hub = Arc::clone(&self.hub);
			let interval = self.interval;
			*stream = Some(tokio::spawn(async move {
				let mut ticker = tokio::time::interval(interval);
				ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
				ticker.tick().await;
				let mut sample = 0u64;
				loop {
					ticker.tick().await;
					sample += 1;
					hub.emit(DeviceEvent::MeasurementArrived(synthetic_results(sample)));
				}
			}));
		}
		debug!(target: "dsc.sim", device = %self.id, "measurement stream started");
		self.hub.emit(DeviceEvent::MeasurementsStatusChanged {
			status: MeasurementsStatus::Started,
		});
		Ok(())
	}

	async fn stop_measurement(&self) -> Result<(), DeviceError> {
		self.ensure_open()?;
		if let Some(task) = self.stream.lock().take() {
			task.abort();
		}
		debug!(target: "dsc.sim", device = %self.id, "measurement stream stopped");
		self.hub.emit(DeviceEvent::MeasurementsStatusChanged {
			status: MeasurementsStatus::Stopped,
		});
		Ok(())
	}

	async fn battery_status(&self) -> Result<u8, DeviceError> {
		self.ensure_open()?;
		self.battery_percent.ok_or(DeviceError::Unsupported { operation: "battery_status" })
	}

	fn subscribe(&self, id: SubscriberId, sink: EventSink<DeviceEvent>) -> bool {
		self.hub.subscribe(id, sink)
	}

	fn unsubscribe(&self, id: SubscriberId) -> bool {
		self.hub.unsubscribe(id)
	}
}

/// Result set for the `sample`-th tick: three valid parameters and one flagged entry.
fn synthetic_results(sample: u64) -> ResultSet {
	ResultSet::new(vec![
		ClinicalResult::valid("pulse_rate", 60.0 + (sample * 7 % 25) as f64),
		ClinicalResult::valid("spo2", 95.0 + (sample % 4) as f64),
		ClinicalResult::not_valid("perfusion_index", f64::NAN),
		ClinicalResult::valid("systolic", 112.0 + (sample % 9) as f64),
	])
}

#[cfg(test)]
mod tests {
	use super::*;

	fn device(battery: Option<u8>) -> SimulatedDevice {
		SimulatedDevice::new(
			DeviceId(1),
			"AA:01".to_string(),
			DeviceInformation::with_serial("SN-1"),
			battery,
			Duration::from_millis(5),
		)
	}

	#[tokio::test]
	async fn battery_without_support_is_unsupported() {
		let device = device(None);
		assert_eq!(device.battery_status().await, Err(DeviceError::Unsupported { operation: "battery_status" }));
		let device = self::device(Some(40));
		assert_eq!(device.battery_status().await, Ok(40));
	}

	#[tokio::test]
	async fn closed_device_rejects_operations() {
		let device = device(Some(40));
		device.shutdown();
		assert!(!device.is_open());
		assert_eq!(device.start_measurement().await, Err(DeviceError::NotOpen));
		assert_eq!(device.battery_status().await, Err(DeviceError::NotOpen));
	}

	#[tokio::test]
	async fn stream_emits_status_then_results() {
		let device = device(None);
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink_seen = Arc::clone(&seen);
		device.subscribe(SubscriberId::next(), Arc::new(move |event| sink_seen.lock().push(event)));

		device.start_measurement().await.unwrap();
		assert!(device.is_streaming());
		tokio::time::sleep(Duration::from_millis(40)).await;
		device.stop_measurement().await.unwrap();
		assert!(!device.is_streaming());

		let seen = seen.lock();
		assert_eq!(
			seen.first(),
			Some(&DeviceEvent::MeasurementsStatusChanged {
				status: MeasurementsStatus::Started
			})
		);
		assert_eq!(
			seen.last(),
			Some(&DeviceEvent::MeasurementsStatusChanged {
				status: MeasurementsStatus::Stopped
			})
		);
		assert!(seen.iter().any(|event| matches!(event, DeviceEvent::MeasurementArrived(_))));
	}

	#[test]
	fn synthetic_results_flag_one_entry() {
		let set = synthetic_results(3);
		assert_eq!(set.results.len(), 4);
		assert_eq!(set.valid().count(), 3);
	}
}

//! Contracts the session core consumes from a transport backend.

use std::sync::Arc;

use async_trait::async_trait;
use dsc_protocol::{DetectorEvent, DeviceDescriptor, DeviceEvent, DeviceId, DeviceInformation, TransportKind};

use crate::error::{DetectorError, DeviceError};
use crate::hub::{EventSink, SubscriberId};

/// Transport-specific device discovery service.
///
/// Detection runs on the backend's own concurrency; `start_detection`
/// returns once the cycle has been started, not when it finishes.
#[async_trait]
pub trait DetectorGateway: Send + Sync {
	fn transport(&self) -> TransportKind;

	async fn start_detection(&self) -> Result<(), DetectorError>;

	async fn stop_detection(&self) -> Result<(), DetectorError>;

	fn is_detecting(&self) -> bool;

	/// Devices currently known to the backend, in discovery order.
	fn devices(&self) -> Vec<DeviceDescriptor>;

	async fn open_device(&self, descriptor: &DeviceDescriptor) -> Result<Arc<dyn DeviceHandle>, DetectorError>;

	async fn close_device(&self, device: Arc<dyn DeviceHandle>) -> Result<(), DetectorError>;

	/// Registers a sink for detector events. Returns `false` if `id` is already registered.
	fn subscribe(&self, id: SubscriberId, sink: EventSink<DetectorEvent>) -> bool;

	/// Removes the sink registered under `id`. Returns `false` if none was registered.
	fn unsubscribe(&self, id: SubscriberId) -> bool;
}

/// An opened device.
#[async_trait]
pub trait DeviceHandle: Send + Sync {
	fn id(&self) -> DeviceId;

	fn is_open(&self) -> bool;

	fn information(&self) -> DeviceInformation;

	async fn start_measurement(&self) -> Result<(), DeviceError>;

	async fn stop_measurement(&self) -> Result<(), DeviceError>;

	/// Battery charge in percent.
	async fn battery_status(&self) -> Result<u8, DeviceError>;

	fn subscribe(&self, id: SubscriberId, sink: EventSink<DeviceEvent>) -> bool;

	fn unsubscribe(&self, id: SubscriberId) -> bool;
}

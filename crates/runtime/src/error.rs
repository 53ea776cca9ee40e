//! Errors reported by detector gateways and device handles.

use std::time::Duration;

use dsc_protocol::TransportKind;
use thiserror::Error;

/// Failure of an operation on an opened device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
	/// The device class does not implement the operation.
	#[error("operation `{operation}` is not supported by this device class")]
	Unsupported { operation: &'static str },

	#[error("device did not answer within {0:?}")]
	Timeout(Duration),

	#[error("device is not open")]
	NotOpen,

	#[error("device link lost: {0}")]
	LinkLost(String),
}

impl DeviceError {
	pub fn is_unsupported(&self) -> bool {
		matches!(self, DeviceError::Unsupported { .. })
	}
}

/// Failure of a detector gateway operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectorError {
	#[error("{0} communication is not supported on this host")]
	TransportUnsupported(TransportKind),

	/// The radio or bus is switched off or unavailable.
	#[error("radio unavailable: {0}")]
	RadioUnavailable(String),

	#[error("device {address} is no longer reachable")]
	DeviceUnreachable { address: String },

	#[error(transparent)]
	Device(#[from] DeviceError),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unsupported_is_discriminated() {
		assert!(DeviceError::Unsupported { operation: "battery_status" }.is_unsupported());
		assert!(!DeviceError::Timeout(Duration::from_secs(1)).is_unsupported());
		assert!(!DeviceError::NotOpen.is_unsupported());
	}

	#[test]
	fn device_error_converts_into_detector_error() {
		let err: DetectorError = DeviceError::NotOpen.into();
		assert_eq!(err.to_string(), "device is not open");
	}
}

//! Transport kinds and device identity types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Link type a session is bound to.
///
/// A session keeps its transport for its whole lifetime; switching transport
/// tears the session down and creates a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
	/// Always-connected link (USB). Device presence is known synchronously.
	ContinuousLink,
	/// Link that needs an explicit, time-bounded scan cycle (BLE).
	DiscoverableLink,
}

impl TransportKind {
	/// Short label used in prompts and log fields.
	pub fn label(self) -> &'static str {
		match self {
			TransportKind::ContinuousLink => "USB",
			TransportKind::DiscoverableLink => "BLE",
		}
	}

	/// Returns the other transport kind.
	pub fn other(self) -> Self {
		match self {
			TransportKind::ContinuousLink => TransportKind::DiscoverableLink,
			TransportKind::DiscoverableLink => TransportKind::ContinuousLink,
		}
	}

	pub fn is_discoverable(self) -> bool {
		self == TransportKind::DiscoverableLink
	}
}

impl fmt::Display for TransportKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

impl FromStr for TransportKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"usb" | "continuous" | "continuous-link" | "continuous_link" => Ok(TransportKind::ContinuousLink),
			"ble" | "discoverable" | "discoverable-link" | "discoverable_link" => Ok(TransportKind::DiscoverableLink),
			_ => Err(format!("unknown transport: {s}")),
		}
	}
}

/// Lightweight record of a discovered device, prior to opening it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
	pub address: String,
}

impl DeviceDescriptor {
	pub fn new(address: impl Into<String>) -> Self {
		Self { address: address.into() }
	}
}

impl fmt::Display for DeviceDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.address)
	}
}

/// Backend-assigned identity of an opened device handle.
///
/// Ids are unique per backend for the process lifetime, so events from a
/// closed handle can never be mistaken for events from a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub u64);

impl fmt::Display for DeviceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "dev-{}", self.0)
	}
}

/// Static information reported by an opened device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInformation {
	pub serial_number: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub model: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub firmware_version: Option<String>,
}

impl DeviceInformation {
	pub fn with_serial(serial_number: impl Into<String>) -> Self {
		Self {
			serial_number: serial_number.into(),
			model: None,
			firmware_version: None,
		}
	}
}

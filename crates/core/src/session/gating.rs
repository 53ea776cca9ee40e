//! Command legality table.
//!
//! Every command is checked once against `(command, transport, state)` before
//! the controller touches a collaborator. Guards that need more than the
//! coarse state (selected ordinal, list bounds) are applied by the controller
//! afterwards and report through the same [`Rejection`] type.

use dsc_protocol::TransportKind;
use serde::Serialize;
use thiserror::Error;

use super::command::Command;
use super::state::SessionState;

/// Why a command was refused. The display text is the guard message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "guard", rename_all = "snake_case")]
pub enum Rejection {
	#[error("Illegal option was selected...")]
	IllegalOption,

	#[error("The detection is already running.")]
	AlreadyDetecting,

	#[error("A device is currently connected. Close it first and then press 's' to rescan.")]
	DeviceOpen,

	#[error("The detection is no longer running.")]
	DetectionNotRunning,

	#[error("Wait for the detection to finish or finish it proactively.")]
	DetectionInProgress,

	#[error("You cannot perform this operation on an unconnected or closed device. Open the device and start over again.")]
	NoDeviceOpen,

	#[error("Measurements are not being received.")]
	NotStreaming,

	#[error("Measurements are already being received.")]
	AlreadyStreaming,

	#[error("You cannot open an already opened device.")]
	AlreadyOpen,

	#[error("Another device is already open. You need to close it first in order to connect to the other device.")]
	OtherDeviceOpen,

	#[error("You cannot open a disconnected device. Reconnect the device and start over again.")]
	NoDevicesDetected,

	#[error("The selected device number {ordinal} does not exist in the detected devices ({available} available).")]
	IndexOutOfRange { ordinal: usize, available: usize },
}

impl Rejection {
	pub fn message(&self) -> String {
		self.to_string()
	}
}

/// Returns whether `command` may run on `transport` in `state`.
pub fn gate(command: &Command, transport: TransportKind, state: SessionState) -> Result<(), Rejection> {
	use Command::*;
	use SessionState::*;

	let discoverable = transport.is_discoverable();
	match command {
		StartScan | StopScan | SelectDevice(_) if !discoverable => Err(Rejection::IllegalOption),
		OpenSingleDevice if discoverable => Err(Rejection::IllegalOption),

		StartScan => match state {
			Detecting => Err(Rejection::AlreadyDetecting),
			Connected | Streaming => Err(Rejection::DeviceOpen),
			Idle | DevicesAvailable => Ok(()),
		},
		StopScan => match state {
			Detecting => Ok(()),
			_ => Err(Rejection::DetectionNotRunning),
		},
		SelectDevice(_) | OpenSingleDevice | SwitchTransport => match state {
			Detecting => Err(Rejection::DetectionInProgress),
			_ => Ok(()),
		},
		Close | GetBattery => match state {
			Detecting => Err(Rejection::DetectionInProgress),
			Idle | DevicesAvailable => Err(Rejection::NoDeviceOpen),
			Connected | Streaming => Ok(()),
		},
		StartMeasuring => match state {
			Detecting => Err(Rejection::DetectionInProgress),
			Idle | DevicesAvailable => Err(Rejection::NoDeviceOpen),
			Streaming => Err(Rejection::AlreadyStreaming),
			Connected => Ok(()),
		},
		StopMeasuring => match state {
			Detecting => Err(Rejection::DetectionInProgress),
			Idle | DevicesAvailable => Err(Rejection::NoDeviceOpen),
			Connected => Err(Rejection::NotStreaming),
			Streaming => Ok(()),
		},
		Legend | Exit => Ok(()),
	}
}

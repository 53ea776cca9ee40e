//! Console rendering of session notices.

use std::io::{IsTerminal, Write};

use colored::Colorize;
use dsc::{Notice, Notifier};
use dsc_protocol::{MeasurementsStatus, TransportKind};

use super::OutputFormat;

/// Prints each notice to stdout in the selected [`OutputFormat`].
#[derive(Debug)]
pub struct ConsoleNotifier {
	format: OutputFormat,
}

impl ConsoleNotifier {
	pub fn new(format: OutputFormat) -> Self {
		if !std::io::stdout().is_terminal() {
			colored::control::set_override(false);
		}
		Self { format }
	}
}

impl Notifier for ConsoleNotifier {
	fn notify(&self, notice: Notice) {
		let mut out = std::io::stdout().lock();
		let _ = match self.format {
			OutputFormat::Text => {
				let lines = render_text(&notice);
				lines.iter().try_for_each(|line| writeln!(out, "{}", paint(&notice, line)))
			}
			OutputFormat::Json => match serde_json::to_string_pretty(&notice) {
				Ok(json) => writeln!(out, "{json}"),
				Err(_) => Ok(()),
			},
			OutputFormat::Ndjson => match serde_json::to_string(&notice) {
				Ok(json) => writeln!(out, "{json}"),
				Err(_) => Ok(()),
			},
		};
	}
}

fn paint(notice: &Notice, line: &str) -> String {
	match notice {
		Notice::Rejected { .. } | Notice::IllegalOption { .. } | Notice::IllegalSelection { .. } | Notice::CapabilityUnsupported { .. } => {
			line.yellow().to_string()
		}
		Notice::DetectionFailed { .. } | Notice::OperationFailed { .. } | Notice::DeviceDisconnected { .. } => line.red().to_string(),
		Notice::Measurement(_) | Notice::Battery { .. } => line.green().to_string(),
		Notice::Legend { .. } | Notice::SelectTransport => line.bold().to_string(),
		_ => line.to_string(),
	}
}

fn legend(transport: TransportKind) -> Vec<String> {
	let mut lines = vec![format!("{} session. Available keys:", transport.label())];
	match transport {
		TransportKind::DiscoverableLink => {
			lines.push("  S - Start scanning for devices".into());
			lines.push("  P - Stop scanning".into());
			lines.push("  1-9 - Open the device with that number".into());
		}
		TransportKind::ContinuousLink => lines.push("  O - Open the attached device".into()),
	}
	lines.extend(
		[
			"  B - Read the battery level",
			"  C - Close the device",
			"  M - Start receiving measurements",
			"  Q - Stop receiving measurements",
			"  E - Switch communication type",
			"  H - Show this legend",
			"  X - Exit",
		]
		.map(String::from),
	);
	lines
}

/// Plain-text lines for `notice`, without styling.
pub fn render_text(notice: &Notice) -> Vec<String> {
	match notice {
		Notice::SelectTransport => vec!["Choose the communication type you want to work with:".into(), "1-BLE".into(), "2-USB".into()],
		Notice::IllegalSelection { .. } => vec!["Illegal selection. Please choose again.".into()],
		Notice::Legend { transport } => legend(*transport),
		Notice::TransportSwitching { from } => vec![format!("Leaving {} communication.", from.label())],
		Notice::WaitingForDevices { .. } => vec!["Waiting for devices...".into()],
		Notice::DetectionRestarting => vec!["Restarting the detection process.".into()],
		Notice::DeviceArrived { address, transport } => {
			let mut lines = vec![format!("Device with address: {address} was detected.")];
			if !transport.is_discoverable() {
				lines.push("Press 'O' to open the device.".into());
			}
			lines
		}
		Notice::DeviceRemoved { address } => vec![format!("Device with address: {address} was undetected.")],
		Notice::DetectionFinished => vec!["Detection operation was finished.".into()],
		Notice::DetectionStopped => vec!["Devices detection was stopped.".into()],
		Notice::DetectionFailed { reason } => vec![format!("Detection could not start: {reason}"), "Enable the radio and press 'S' to rescan.".into()],
		Notice::DevicesAvailable { devices } => {
			let count = devices.len();
			let mut lines = vec![format!(
				"{count} devices are currently detected. Press any number from 1 to {count} to connect to the selected device:"
			)];
			lines.extend(devices.iter().map(|d| format!("Device number: {} -> Device Address: {}", d.ordinal, d.address)));
			lines
		}
		Notice::NoDevicesRemain => vec!["No detected devices have left. Press 'S' to rescan again for devices.".into()],
		Notice::RadioEnabled => vec!["Bluetooth is enabled. Press 'S' to rescan again for devices.".into()],
		Notice::DeviceOpened { ordinal, address, .. } => vec![format!("Device number {ordinal} ({address}) was opened.")],
		Notice::DeviceReady { serial } => vec![
			format!("Device with Serial Number: {serial} is currently connected."),
			"Insert finger into the device and afterwards press 'M' to start receiving measurements results.".into(),
			"Press 'Q' to stop receiving measurements results.".into(),
			"Press 'C' to close the device.".into(),
		],
		Notice::DeviceClosed { serial } => vec![format!("Device with Serial Number: {serial} was closed.")],
		Notice::ReopenRequired => vec!["Reopen the device and start over again.".into()],
		Notice::DeviceDisconnected { serial } => vec![format!("Device with Serial Number: {serial} was suddenly disconnected.")],
		Notice::ReconnectRequired => vec!["Reconnect the device and start over again.".into()],
		Notice::MeasurementStatus { status } => match status {
			MeasurementsStatus::Started => vec!["Measurement started".into()],
			MeasurementsStatus::Stopped => vec!["Measurement stopped".into()],
		},
		Notice::Measurement(record) => vec![record.to_string()],
		Notice::Battery { percent } => vec![format!("Battery status is {percent}%")],
		Notice::CapabilityUnsupported { operation } => vec![format!("The connected device does not support {operation}.")],
		Notice::OperationFailed { operation, reason } => vec![format!("{operation} failed: {reason}")],
		Notice::Rejected { message, .. } => vec![message.clone()],
		Notice::IllegalOption { .. } => vec!["Illegal option was selected...".into()],
	}
}

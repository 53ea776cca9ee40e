use std::path::PathBuf;

use clap::{ArgAction, Parser};
use dsc_protocol::TransportKind;

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "dsc")]
#[command(about = "Drive one measurement device over a USB or BLE link")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = ArgAction::Count)]
	pub verbose: u8,

	/// How notices are written to stdout
	#[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
	pub format: OutputFormat,

	/// Skip the first transport prompt (usb or ble)
	#[arg(short, long, value_name = "KIND")]
	pub transport: Option<TransportKind>,

	/// JSON configuration file (default: <config dir>/dsc/config.json if present)
	#[arg(short, long, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Detection poll interval in milliseconds
	#[arg(long, value_name = "MS")]
	pub poll_interval_ms: Option<u64>,

	/// Wait after closing a BLE device before rescanning
	#[arg(long, value_name = "MS")]
	pub close_grace_ms: Option<u64>,

	/// Stop re-arming an empty BLE scan after this many cycles
	#[arg(long, value_name = "N")]
	pub max_detection_cycles: Option<u32>,

	/// Replace the simulated inventory with N generated devices
	#[arg(long, value_name = "N")]
	pub sim_devices: Option<usize>,

	/// Length of one simulated BLE scan cycle
	#[arg(long, value_name = "MS")]
	pub sim_detection_window_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_transport_and_format() {
		let cli = Cli::try_parse_from(["dsc", "-f", "ndjson", "--transport", "ble", "-vv"]).unwrap();
		assert_eq!(cli.format, OutputFormat::Ndjson);
		assert_eq!(cli.transport, Some(TransportKind::DiscoverableLink));
		assert_eq!(cli.verbose, 2);
	}

	#[test]
	fn rejects_unknown_transport() {
		assert!(Cli::try_parse_from(["dsc", "--transport", "serial"]).is_err());
	}

	#[test]
	fn defaults_to_text_output() {
		let cli = Cli::try_parse_from(["dsc"]).unwrap();
		assert_eq!(cli.format, OutputFormat::Text);
		assert!(cli.transport.is_none());
		assert!(cli.config.is_none());
	}
}

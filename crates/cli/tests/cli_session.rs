use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use serde_json::Value;
use tempfile::TempDir;

fn dsc_binary() -> PathBuf {
	let mut path = std::env::current_exe().expect("current_exe should resolve");
	path.pop();
	path.pop();
	path.push("dsc");
	path
}

fn write_config(dir: &Path, body: &str) -> PathBuf {
	let path = dir.join("config.json");
	std::fs::write(&path, body).expect("write config");
	path
}

fn fast_config(dir: &Path) -> PathBuf {
	write_config(
		dir,
		r#"{
			"session": { "closeGraceMs": 0, "pollIntervalMs": 20 },
			"simulator": { "measurementIntervalMs": 60000, "detectionWindowMs": 60, "arrivalSpacingMs": 5, "disconnectAckMs": 5 }
		}"#,
	)
}

fn run_dsc(args: &[&str], config: &Path, stdin: &str) -> Output {
	let mut child = Command::new(dsc_binary())
		.args(args)
		.arg("--config")
		.arg(config)
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.expect("spawn dsc");

	{
		let child_stdin = child.stdin.as_mut().expect("stdin");
		child_stdin.write_all(stdin.as_bytes()).expect("write stdin");
	}
	child.wait_with_output().expect("wait for dsc")
}

fn notices(output: &Output) -> Vec<Value> {
	String::from_utf8_lossy(&output.stdout)
		.lines()
		.filter(|line| !line.trim().is_empty())
		.map(|line| serde_json::from_str(line).unwrap_or_else(|err| panic!("not json ({err}): {line}")))
		.collect()
}

fn kinds(notices: &[Value]) -> Vec<String> {
	notices.iter().map(|n| n["notice"].as_str().unwrap_or_default().to_string()).collect()
}

#[test]
fn usb_session_opens_reads_battery_and_closes() {
	let dir = TempDir::new().unwrap();
	let config = fast_config(dir.path());
	let output = run_dsc(&["-f", "ndjson", "--transport", "usb"], &config, "o\nb\nzz\nc\nx\n");
	assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

	let notices = notices(&output);
	let kinds = kinds(&notices);
	assert_eq!(kinds.first().map(String::as_str), Some("legend"));
	assert_eq!(notices[0]["transport"], "continuous_link");

	let position = |kind: &str| kinds.iter().position(|k| k == kind).unwrap_or_else(|| panic!("missing {kind}: {kinds:?}"));
	assert!(position("device_opened") < position("battery"));
	assert!(position("battery") < position("illegal_option"));
	assert!(position("illegal_option") < position("device_closed"));
	assert!(position("device_closed") < position("reopen_required"));

	let battery = notices.iter().find(|n| n["notice"] == "battery").unwrap();
	assert_eq!(battery["percent"], 87);
	let illegal = notices.iter().find(|n| n["notice"] == "illegal_option").unwrap();
	assert_eq!(illegal["input"], "zz");
}

#[test]
fn transport_prompt_repeats_on_illegal_selection() {
	let dir = TempDir::new().unwrap();
	let config = fast_config(dir.path());
	let output = run_dsc(&["-f", "ndjson"], &config, "9\n2\nx\n");
	assert!(output.status.success());

	let notices = notices(&output);
	let kinds = kinds(&notices);
	assert_eq!(&kinds[..3], ["select_transport", "illegal_selection", "legend"]);
	assert_eq!(notices[1]["input"], "9");
	assert_eq!(notices[2]["transport"], "continuous_link");
}

#[test]
fn switching_transport_returns_to_the_prompt() {
	let dir = TempDir::new().unwrap();
	let config = fast_config(dir.path());
	let output = run_dsc(&["-f", "ndjson", "--transport", "usb"], &config, "e\n1\nx\n");
	assert!(output.status.success());

	let notices = notices(&output);
	let kinds = kinds(&notices);
	let switching = kinds.iter().position(|k| k == "transport_switching").expect("switch notice");
	let prompt = kinds.iter().position(|k| k == "select_transport").expect("second prompt");
	assert!(switching < prompt);

	let legends: Vec<_> = notices.iter().filter(|n| n["notice"] == "legend").map(|n| n["transport"].clone()).collect();
	assert_eq!(legends, ["continuous_link", "discoverable_link"]);
	assert!(kinds.contains(&"waiting_for_devices".to_string()));
}

#[test]
fn end_of_input_exits_cleanly() {
	let dir = TempDir::new().unwrap();
	let config = fast_config(dir.path());
	let output = run_dsc(&["-f", "ndjson", "--transport", "usb"], &config, "");
	assert!(output.status.success());
	assert_eq!(kinds(&notices(&output)).first().map(String::as_str), Some("legend"));
}

#[test]
fn text_output_uses_console_prompts() {
	let dir = TempDir::new().unwrap();
	let config = fast_config(dir.path());
	let output = run_dsc(&["--transport", "usb"], &config, "o\nx\n");
	assert!(output.status.success());

	let stdout = String::from_utf8_lossy(&output.stdout);
	assert!(stdout.contains("Press 'O' to open the device."));
	assert!(stdout.contains("Device with Serial Number: SN-100231 is currently connected."));
	assert!(!stdout.contains('\u{1b}'), "no ANSI codes when piped");
}

#[test]
fn malformed_config_fails_before_prompting() {
	let dir = TempDir::new().unwrap();
	let config = write_config(dir.path(), "{ session: ");
	let output = run_dsc(&["-f", "ndjson"], &config, "2\n");

	assert!(!output.status.success());
	assert!(output.stdout.is_empty());
	assert!(String::from_utf8_lossy(&output.stderr).contains("invalid configuration"));
}

#[test]
fn unavailable_transport_is_fatal() {
	let dir = TempDir::new().unwrap();
	let config = write_config(dir.path(), r#"{ "simulator": { "unsupportedTransports": ["discoverable_link"] } }"#);
	let output = run_dsc(&["-f", "ndjson", "--transport", "ble"], &config, "");

	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("cannot open BLE communication"));
}

//! Outer transport-selection loop.
//!
//! Each pass picks a transport, opens the simulated detector for it and runs
//! one [`CommandLoop`]. Switching transport comes back here; exit or end of
//! input ends the process. Failing to open a detector is fatal.

use std::sync::Arc;

use anyhow::Context;
use dsc::{CommandLoop, LoopExit, LoopSignal, Notice, Notifier, SessionController};
use dsc_protocol::TransportKind;
use dsc_runtime::{DetectorGateway, SimulatedBackend};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::input;
use crate::output::ConsoleNotifier;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
	let mut config = AppConfig::load(cli.config.as_deref())?;
	config.apply_overrides(&cli);
	debug!(target: "dsc", ?config, format = %cli.format, "configuration resolved");

	let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier::new(cli.format));
	let mut lines = input::spawn_stdin_reader();

	let (signal_tx, signal_rx) = watch::channel(LoopSignal::Running);
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			let _ = signal_tx.send(LoopSignal::Exit);
		}
	});

	let backend = SimulatedBackend::new(config.simulator.clone());
	let mut preselected = cli.transport;

	loop {
		let transport = match preselected.take() {
			Some(transport) => transport,
			None => match select_transport(&mut lines, notifier.as_ref()).await {
				Some(transport) => transport,
				None => return Ok(()),
			},
		};

		let detector = backend
			.open(transport)
			.with_context(|| format!("cannot open {} communication", transport.label()))?;
		let gateway: Arc<dyn DetectorGateway> = detector;
		let controller = SessionController::new(gateway, notifier.clone(), config.session.clone());
		info!(target: "dsc", %transport, "session starting");

		let exit = CommandLoop::new(controller, signal_rx.clone()).run(&mut lines).await;
		info!(target: "dsc", %transport, ?exit, "session ended");
		match exit {
			LoopExit::SwitchTransport => continue,
			LoopExit::Exit | LoopExit::InputClosed => return Ok(()),
		}
	}
}

/// Prompts until a valid transport is chosen. `None` when input ends.
async fn select_transport(lines: &mut mpsc::Receiver<String>, notifier: &dyn Notifier) -> Option<TransportKind> {
	notifier.notify(Notice::SelectTransport);
	loop {
		let line = lines.recv().await?;
		match parse_selection(&line) {
			Some(transport) => return Some(transport),
			None => notifier.notify(Notice::IllegalSelection { input: line.trim().to_string() }),
		}
	}
}

/// `1` is BLE and `2` is USB; transport names are accepted too.
fn parse_selection(line: &str) -> Option<TransportKind> {
	match line.trim() {
		"1" => Some(TransportKind::DiscoverableLink),
		"2" => Some(TransportKind::ContinuousLink),
		"" => None,
		other => other.parse().ok(),
	}
}

#[cfg(test)]
mod tests {
	use dsc::CollectingNotifier;

	use super::*;

	#[test]
	fn selection_accepts_numbers_and_names() {
		assert_eq!(parse_selection("1"), Some(TransportKind::DiscoverableLink));
		assert_eq!(parse_selection(" 2 "), Some(TransportKind::ContinuousLink));
		assert_eq!(parse_selection("usb"), Some(TransportKind::ContinuousLink));
		assert_eq!(parse_selection("3"), None);
		assert_eq!(parse_selection(""), None);
	}

	#[tokio::test]
	async fn selection_reprompts_on_illegal_input() {
		let notices = CollectingNotifier::new();
		let (tx, mut rx) = mpsc::channel(4);
		tx.send("9".to_string()).await.unwrap();
		tx.send("1".to_string()).await.unwrap();

		let chosen = select_transport(&mut rx, notices.as_ref()).await;
		assert_eq!(chosen, Some(TransportKind::DiscoverableLink));
		assert_eq!(notices.kinds(), ["select_transport", "illegal_selection"]);
	}

	#[tokio::test]
	async fn selection_ends_with_input() {
		let notices = CollectingNotifier::new();
		let (tx, mut rx) = mpsc::channel::<String>(1);
		drop(tx);
		assert_eq!(select_transport(&mut rx, notices.as_ref()).await, None);
	}
}

use std::sync::Arc;
use std::time::Duration;

use dsc::{CollectingNotifier, CommandLoop, LoopExit, LoopSignal, Notice, SessionConfig, SessionController};
use dsc_protocol::TransportKind;
use dsc_runtime::{DetectorGateway, SimConfig, SimulatedBackend, SimulatedDetector};
use tokio::sync::{mpsc, watch};

fn session_loop(transport: TransportKind, sim: SimConfig) -> (CommandLoop, Arc<SimulatedDetector>, Arc<CollectingNotifier>, watch::Sender<LoopSignal>) {
	let detector = SimulatedBackend::new(sim).open(transport).unwrap();
	let notices = CollectingNotifier::new();
	let gateway: Arc<dyn DetectorGateway> = detector.clone();
	let config = SessionConfig {
		poll_interval_ms: 10,
		close_grace_ms: 0,
		..SessionConfig::default()
	};
	let (signal_tx, signal_rx) = watch::channel(LoopSignal::Running);
	let controller = SessionController::new(gateway, notices.clone(), config);
	(CommandLoop::new(controller, signal_rx), detector, notices, signal_tx)
}

async fn feed(lines: &[&str]) -> mpsc::Receiver<String> {
	let (tx, rx) = mpsc::channel(16);
	for line in lines {
		tx.send(line.to_string()).await.unwrap();
	}
	rx
}

#[tokio::test]
async fn continuous_session_runs_commands_until_exit() {
	let (mut session, detector, notices, _signal) = session_loop(TransportKind::ContinuousLink, SimConfig::default());
	let mut input = feed(&["o", "zz", "", "b", "s", "x", "c"]).await;

	let exit = tokio::time::timeout(Duration::from_secs(5), session.run(&mut input)).await.unwrap();
	assert_eq!(exit, LoopExit::Exit);

	let kinds = notices.kinds();
	assert_eq!(kinds.first(), Some(&"legend"));
	assert!(kinds.contains(&"device_opened"));
	assert!(kinds.contains(&"battery"));
	assert!(notices.contains(|n| matches!(n, Notice::IllegalOption { input } if input == "zz")));
	assert_eq!(kinds.iter().filter(|k| **k == "illegal_option").count(), 1);
	assert!(kinds.contains(&"rejected"));

	assert_eq!(session.controller().router().active_subscriptions(), 0);
	assert_eq!(detector.subscriber_count(), 0);
	assert!(detector.open_devices().is_empty());
	// Lines after the exit command stay unread for the next session.
	assert_eq!(input.recv().await.as_deref(), Some("c"));
}

#[tokio::test]
async fn discoverable_detection_completes_through_polling() {
	let sim = SimConfig {
		detection_window_ms: 40,
		arrival_spacing_ms: 5,
		..SimConfig::default()
	};
	let (mut session, _detector, notices, _signal) = session_loop(TransportKind::DiscoverableLink, sim);
	let (tx, mut input) = mpsc::channel(4);

	let run = tokio::spawn(async move {
		let exit = session.run(&mut input).await;
		(exit, session)
	});

	tokio::time::sleep(Duration::from_millis(200)).await;
	assert!(notices.contains(|n| matches!(n, Notice::DevicesAvailable { devices } if devices.len() == 2)));

	tx.send("1".into()).await.unwrap();
	tx.send("switch".into()).await.unwrap();
	let (exit, session) = tokio::time::timeout(Duration::from_secs(5), run).await.unwrap().unwrap();

	assert_eq!(exit, LoopExit::SwitchTransport);
	assert!(notices.contains(|n| matches!(n, Notice::DeviceOpened { ordinal: 1, .. })));
	assert!(notices.contains(|n| matches!(n, Notice::TransportSwitching { .. })));
	assert_eq!(session.controller().router().active_subscriptions(), 0);
}

#[tokio::test]
async fn closed_input_tears_down() {
	let (mut session, detector, _notices, _signal) = session_loop(TransportKind::ContinuousLink, SimConfig::default());
	let mut input = feed(&["o", "m"]).await;

	let exit = tokio::time::timeout(Duration::from_secs(5), session.run(&mut input)).await.unwrap();
	assert_eq!(exit, LoopExit::InputClosed);
	assert!(detector.open_devices().is_empty());
	assert_eq!(session.controller().router().active_subscriptions(), 0);
}

#[tokio::test]
async fn external_signal_breaks_an_idle_loop() {
	let (mut session, detector, _notices, signal) = session_loop(TransportKind::ContinuousLink, SimConfig::default());
	let (_tx, mut input) = mpsc::channel::<String>(1);

	tokio::spawn(async move {
		tokio::time::sleep(Duration::from_millis(30)).await;
		let _ = signal.send(LoopSignal::Exit);
	});

	let exit = tokio::time::timeout(Duration::from_secs(5), session.run(&mut input)).await.unwrap();
	assert_eq!(exit, LoopExit::Exit);
	assert_eq!(detector.subscriber_count(), 0);
}

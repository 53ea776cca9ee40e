use std::sync::Arc;
use std::time::Duration;

use dsc::{CollectingNotifier, CommandLoop, LoopExit, LoopSignal, SessionConfig, SessionController};
use dsc_protocol::TransportKind;
use dsc_runtime::{DetectorGateway, SimConfig, SimulatedBackend};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

const SUBSYSTEMS: [&str; 4] = ["dsc.session", "dsc.router", "dsc.sim", "dsc.loop"];

#[derive(Clone, Default)]
struct TargetRecorder(Arc<Mutex<Vec<String>>>);

impl<S: Subscriber> Layer<S> for TargetRecorder {
	fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
		self.0.lock().push(event.metadata().target().to_string());
	}
}

#[tokio::test]
async fn events_carry_subsystem_targets() {
	let recorder = TargetRecorder::default();
	let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(recorder.clone()));

	let detector = SimulatedBackend::new(SimConfig::default()).open(TransportKind::ContinuousLink).unwrap();
	let gateway: Arc<dyn DetectorGateway> = detector;
	let config = SessionConfig {
		close_grace_ms: 0,
		..SessionConfig::default()
	};
	let controller = SessionController::new(gateway, CollectingNotifier::new(), config);
	let (_signal_tx, signal_rx) = watch::channel(LoopSignal::Running);

	let (tx, mut input) = mpsc::channel(8);
	for line in ["o", "m", "q", "x"] {
		tx.send(line.to_string()).await.unwrap();
	}
	let exit = tokio::time::timeout(Duration::from_secs(5), CommandLoop::new(controller, signal_rx).run(&mut input))
		.await
		.unwrap();
	assert_eq!(exit, LoopExit::Exit);

	let targets = recorder.0.lock().clone();
	for subsystem in SUBSYSTEMS {
		assert!(targets.iter().any(|t| t == subsystem), "no event with target {subsystem} in {targets:?}");
	}
	let stray: Vec<_> = targets.iter().filter(|t| t.starts_with("dsc") && !SUBSYSTEMS.contains(&t.as_str())).collect();
	assert!(stray.is_empty(), "module-path targets leaked: {stray:?}");
}

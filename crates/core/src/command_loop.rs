//! Single-task loop that feeds user input and collaborator events to a controller.
//!
//! Each iteration waits for whichever comes first: a queued collaborator event,
//! a line of user input, or the detection poll tick. Events win ties, so state
//! is always current before the next command is judged. The external
//! [`LoopSignal`] is checked after every step; whichever way the loop ends, the
//! session is torn down before [`CommandLoop::run`] returns.

use dsc_runtime::SessionEvent;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::notice::Notice;
use crate::session::{Command, LoopControl, SessionController};

/// Request from outside the loop, e.g. a Ctrl-C handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopSignal {
	#[default]
	Running,
	SwitchTransport,
	Exit,
}

/// Why [`CommandLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
	SwitchTransport,
	Exit,
	/// The input channel closed.
	InputClosed,
}

enum Step {
	Event(SessionEvent),
	Input(Option<String>),
	Tick,
	Signal(bool),
}

pub struct CommandLoop {
	controller: SessionController,
	signal: watch::Receiver<LoopSignal>,
}

impl CommandLoop {
	pub fn new(controller: SessionController, signal: watch::Receiver<LoopSignal>) -> Self {
		Self { controller, signal }
	}

	pub fn controller(&self) -> &SessionController {
		&self.controller
	}

	pub fn into_controller(self) -> SessionController {
		self.controller
	}

	/// Runs the session until a command, the signal or the end of `input` stops it.
	///
	/// `input` is borrowed so the caller can keep reading from it after a transport switch.
	pub async fn run(&mut self, input: &mut mpsc::Receiver<String>) -> LoopExit {
		let transport = self.controller.transport();
		self.controller.notify(Notice::Legend { transport });
		self.controller.start().await;

		let mut ticker = tokio::time::interval(self.controller.config().poll_interval());
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
		let mut signal_open = true;

		let exit = loop {
			let step = tokio::select! {
				biased;
				Some(event) = self.controller.next_event() => Step::Event(event),
				line = input.recv() => Step::Input(line),
				changed = self.signal.changed(), if signal_open => Step::Signal(changed.is_ok()),
				_ = ticker.tick() => Step::Tick,
			};

			match step {
				Step::Event(event) => self.controller.handle_event(event).await,
				Step::Input(None) => break LoopExit::InputClosed,
				Step::Input(Some(line)) => match self.dispatch(&line).await {
					LoopControl::Continue => {}
					LoopControl::SwitchTransport => break LoopExit::SwitchTransport,
					LoopControl::Exit => break LoopExit::Exit,
				},
				Step::Tick => self.controller.poll_detection().await,
				Step::Signal(open) => signal_open = open,
			}

			match *self.signal.borrow() {
				LoopSignal::Running => {}
				LoopSignal::SwitchTransport => break LoopExit::SwitchTransport,
				LoopSignal::Exit => break LoopExit::Exit,
			}
		};

		self.controller.shutdown().await;
		debug!(target: "dsc.loop", exit = ?exit, %transport, "command loop finished");
		exit
	}

	async fn dispatch(&mut self, line: &str) -> LoopControl {
		let line = line.trim();
		if line.is_empty() {
			return LoopControl::Continue;
		}
		match Command::parse(line) {
			Some(command) => self.controller.execute(command).await,
			None => {
				debug!(target: "dsc.loop", input = line, "unrecognized input");
				self.controller.notify(Notice::IllegalOption { input: line.to_string() });
				LoopControl::Continue
			}
		}
	}
}

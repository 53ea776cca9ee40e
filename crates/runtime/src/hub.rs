//! Observer registry keyed by subscriber identity.
//!
//! Collaborators expose `subscribe`/`unsubscribe` in terms of a
//! [`SubscriberId`] rather than by comparing handler references, so
//! registration is idempotent and removal never depends on closure identity.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

static NEXT_SUBSCRIBER: AtomicU64 = AtomicU64::new(1);

/// Identity of one event consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
	/// Allocates a process-unique subscriber id.
	pub fn next() -> Self {
		Self(NEXT_SUBSCRIBER.fetch_add(1, Ordering::Relaxed))
	}
}

impl fmt::Display for SubscriberId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "sub-{}", self.0)
	}
}

/// Callback invoked for every emitted event.
///
/// Sinks run on the emitting thread and must not block; the router's sinks
/// only push onto a channel.
pub type EventSink<E> = Arc<dyn Fn(E) + Send + Sync>;

/// Ordered set of sinks for one event source.
pub struct EventHub<E> {
	sinks: Mutex<Vec<(SubscriberId, EventSink<E>)>>,
}

impl<E: Clone> EventHub<E> {
	pub fn new() -> Self {
		Self { sinks: Mutex::new(Vec::new()) }
	}

	/// Registers `sink` under `id`.
	///
	/// Returns `false` (and keeps the existing sink) when `id` is already registered.
	pub fn subscribe(&self, id: SubscriberId, sink: EventSink<E>) -> bool {
		let mut sinks = self.sinks.lock();
		if sinks.iter().any(|(existing, _)| *existing == id) {
			return false;
		}
		sinks.push((id, sink));
		true
	}

	/// Removes the sink registered under `id`. Returns `false` when none was registered.
	pub fn unsubscribe(&self, id: SubscriberId) -> bool {
		let mut sinks = self.sinks.lock();
		let before = sinks.len();
		sinks.retain(|(existing, _)| *existing != id);
		sinks.len() != before
	}

	pub fn is_subscribed(&self, id: SubscriberId) -> bool {
		self.sinks.lock().iter().any(|(existing, _)| *existing == id)
	}

	pub fn subscriber_count(&self) -> usize {
		self.sinks.lock().len()
	}

	/// Delivers `event` to every sink in registration order.
	pub fn emit(&self, event: E) {
		// Snapshot so a sink may (un)subscribe without deadlocking.
		let sinks: Vec<EventSink<E>> = self.sinks.lock().iter().map(|(_, sink)| Arc::clone(sink)).collect();
		for sink in sinks {
			sink(event.clone());
		}
	}
}

impl<E: Clone> Default for EventHub<E> {
	fn default() -> Self {
		Self::new()
	}
}

//! Session timing and retry configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for [`SessionController`](crate::SessionController) and [`CommandLoop`](crate::CommandLoop).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
	/// Upper bound on how stale the "still detecting" flag may get.
	pub poll_interval_ms: u64,
	/// Wait after closing a discoverable-link device for its own disconnect acknowledgment.
	pub close_grace_ms: u64,
	/// Re-arm detection on empty results and after a close (discoverable link only).
	pub auto_restart_detection: bool,
	/// Consecutive empty detection cycles before giving up. `None` re-arms forever.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_detection_cycles: Option<u32>,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			poll_interval_ms: 200,
			close_grace_ms: 2000,
			auto_restart_detection: true,
			max_detection_cycles: None,
		}
	}
}

impl SessionConfig {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms.max(1))
	}

	pub fn close_grace(&self) -> Duration {
		Duration::from_millis(self.close_grace_ms)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_fields_take_defaults() {
		let config: SessionConfig = serde_json::from_str(r#"{"closeGraceMs": 10}"#).unwrap();
		assert_eq!(config.close_grace(), Duration::from_millis(10));
		assert_eq!(config.poll_interval(), Duration::from_millis(200));
		assert!(config.auto_restart_detection);
		assert_eq!(config.max_detection_cycles, None);
	}

	#[test]
	fn bounded_retry_round_trips_through_json() {
		let config: SessionConfig = serde_json::from_str(r#"{"maxDetectionCycles": 3, "pollIntervalMs": 0}"#).unwrap();
		assert_eq!(config.max_detection_cycles, Some(3));
		assert_eq!(config.poll_interval(), Duration::from_millis(1));

		let value = serde_json::to_value(SessionConfig::default()).unwrap();
		assert!(value.get("maxDetectionCycles").is_none());
		assert_eq!(value["closeGraceMs"], 2000);
	}
}

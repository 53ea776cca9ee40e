//! Layered application configuration: defaults, then a JSON file, then flags.

use std::path::{Path, PathBuf};

use dsc::SessionConfig;
use dsc_runtime::SimConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::cli::Cli;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid configuration in {}: {source}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
}

/// Contents of `config.json`.
///
/// ```json
/// { "session": { "closeGraceMs": 500 }, "simulator": { "detectionWindowMs": 1500 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
	pub session: SessionConfig,
	pub simulator: SimConfig,
}

impl AppConfig {
	/// `<config dir>/dsc/config.json`, if the platform has a config dir.
	pub fn default_path() -> Option<PathBuf> {
		dirs::config_dir().map(|dir| dir.join("dsc").join("config.json"))
	}

	/// Loads `explicit`, which must exist, or the default path when present.
	pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
		match explicit {
			Some(path) => Self::from_file(path),
			None => match Self::default_path() {
				Some(path) if path.is_file() => Self::from_file(&path),
				_ => Ok(Self::default()),
			},
		}
	}

	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		debug!(target: "dsc", path = %path.display(), "loading configuration");
		let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})
	}

	/// Flags win over anything read from disk.
	pub fn apply_overrides(&mut self, cli: &Cli) {
		if let Some(ms) = cli.poll_interval_ms {
			self.session.poll_interval_ms = ms;
		}
		if let Some(ms) = cli.close_grace_ms {
			self.session.close_grace_ms = ms;
		}
		if let Some(max) = cli.max_detection_cycles {
			self.session.max_detection_cycles = Some(max);
		}
		if let Some(count) = cli.sim_devices {
			let generated = SimConfig::with_device_count(count);
			self.simulator.devices = generated.devices;
		}
		if let Some(ms) = cli.sim_detection_window_ms {
			self.simulator.detection_window_ms = ms;
		}
	}
}

//! Session error types.

use dsc_runtime::{DetectorError, DeviceError};
use thiserror::Error;

use crate::session::Rejection;

pub type Result<T> = std::result::Result<T, SessionError>;

/// Failure of a single session command.
///
/// None of these end the session: [`SessionController::execute`](crate::SessionController::execute)
/// turns every variant into a notice and the loop keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
	/// A guard failed for the current transport or state. Nothing was changed.
	#[error(transparent)]
	Rejected(#[from] Rejection),

	#[error("`{operation}` is not supported by the connected device")]
	CapabilityUnsupported { operation: &'static str },

	#[error(transparent)]
	Detector(#[from] DetectorError),

	#[error(transparent)]
	Device(#[from] DeviceError),
}

/// Coarse classification used by front ends and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	IllegalCommand,
	CapabilityUnsupported,
	CollaboratorFailure,
}

impl SessionError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			SessionError::Rejected(_) => ErrorKind::IllegalCommand,
			SessionError::CapabilityUnsupported { .. } => ErrorKind::CapabilityUnsupported,
			SessionError::Detector(_) | SessionError::Device(_) => ErrorKind::CollaboratorFailure,
		}
	}
}

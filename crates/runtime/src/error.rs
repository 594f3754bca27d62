//! Error types for the Snapmaker runtime.

use std::fmt;

use snap_protocol::ModuleDecodeError;
use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Device subsystem a request or response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
	Handshake,
	Tool,
	Enclosure,
	Modules,
	ModuleList,
	Camera,
	Job,
}

impl fmt::Display for Subsystem {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Subsystem::Handshake => "handshake",
			Subsystem::Tool => "tool",
			Subsystem::Enclosure => "enclosure",
			Subsystem::Modules => "modules",
			Subsystem::ModuleList => "module list",
			Subsystem::Camera => "camera",
			Subsystem::Job => "job",
		})
	}
}

/// Errors that can occur while talking to the machine.
#[derive(Debug, Error)]
pub enum Error {
	/// The session is not (or no longer) connected.
	#[error("not connected")]
	NotConnected,

	/// The handshake echoed a different token than the one sent.
	#[error("invalid token")]
	InvalidToken,

	/// The handshake reported a device model other than the supported one.
	#[error("unsupported device series {series:?}")]
	UnsupportedDevice { series: String },

	/// The caller's cancellation signal fired while waiting.
	#[error("operation canceled")]
	Canceled,

	/// Argument outside its accepted range.
	#[error("invalid value: {0}")]
	InvalidArgument(String),

	/// The request never produced an HTTP response.
	#[error("request to {endpoint} failed: {message}")]
	Network { endpoint: String, message: String },

	/// The device answered with a non-success HTTP status.
	#[error("{endpoint} failed with status {status}")]
	Protocol { endpoint: String, status: u16 },

	/// A response body did not have the expected shape.
	#[error("malformed {subsystem} response: {source}")]
	Decode {
		subsystem: Subsystem,
		#[source]
		source: serde_json::Error,
	},

	/// A module record or listing lookup had no usable key.
	#[error("no key found")]
	NoKey,

	/// The mounted tool head has no camera.
	#[error("no camera")]
	NoCamera,
}

impl Error {
	/// Wraps a body decoding failure for `subsystem`.
	pub fn decode(subsystem: Subsystem, source: serde_json::Error) -> Self {
		Error::Decode { subsystem, source }
	}

	/// Returns true if this is a cancellation.
	pub fn is_canceled(&self) -> bool {
		matches!(self, Error::Canceled)
	}

	/// Returns true if the session was not connected.
	pub fn is_not_connected(&self) -> bool {
		matches!(self, Error::NotConnected)
	}

	/// Returns the subsystem of a decode error.
	pub fn subsystem(&self) -> Option<Subsystem> {
		match self {
			Error::Decode { subsystem, .. } => Some(*subsystem),
			_ => None,
		}
	}
}

impl From<ModuleDecodeError> for Error {
	fn from(err: ModuleDecodeError) -> Self {
		match err {
			ModuleDecodeError::NoKey => Error::NoKey,
			ModuleDecodeError::Malformed(source) => Error::decode(Subsystem::Modules, source),
		}
	}
}

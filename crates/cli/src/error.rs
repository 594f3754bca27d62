use std::path::PathBuf;

use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("configuration {}: {message}", path.display())]
	Config { path: PathBuf, message: String },

	#[error("machine is not homed; run `snap home` first")]
	NotHomed,

	#[error("no camera offset recorded for tool head {tool_head}; run `snap set-camera-offset`")]
	NoCameraOffset { tool_head: String },

	#[error("{0}")]
	InvalidInput(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Snap(#[from] snap::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl CliError {
	pub fn to_command_error(&self) -> CommandError {
		let (code, details) = match self {
			CliError::Config { path, .. } => (ErrorCode::ConfigError, Some(serde_json::json!({ "path": path }))),
			CliError::NotHomed => (ErrorCode::NotHomed, None),
			CliError::NoCameraOffset { tool_head } => (
				ErrorCode::ConfigError,
				Some(serde_json::json!({ "toolHead": tool_head })),
			),
			CliError::InvalidInput(_) | CliError::Anyhow(_) => (ErrorCode::InvalidInput, None),
			CliError::Io(_) => (ErrorCode::IoError, None),
			CliError::Json(_) => (ErrorCode::InternalError, None),
			CliError::Snap(err) => classify_snap_error(err),
		};

		CommandError {
			code,
			message: self.to_string(),
			details,
		}
	}
}

fn classify_snap_error(err: &snap::Error) -> (ErrorCode, Option<serde_json::Value>) {
	use snap::Error;

	match err {
		Error::NotConnected => (ErrorCode::NotConnected, None),
		Error::InvalidToken => (ErrorCode::AuthError, None),
		Error::UnsupportedDevice { series } => (
			ErrorCode::UnsupportedDevice,
			Some(serde_json::json!({ "series": series })),
		),
		Error::Canceled => (ErrorCode::Canceled, None),
		Error::InvalidArgument(_) | Error::NoCamera => (ErrorCode::InvalidInput, None),
		Error::Network { endpoint, .. } => (
			ErrorCode::ConnectionFailed,
			Some(serde_json::json!({ "endpoint": endpoint })),
		),
		Error::Protocol { status: 401, .. } => (ErrorCode::AuthError, None),
		Error::Protocol { endpoint, status } => (
			ErrorCode::DeviceError,
			Some(serde_json::json!({ "endpoint": endpoint, "status": status })),
		),
		Error::Decode { subsystem, .. } => (
			ErrorCode::DecodeError,
			Some(serde_json::json!({ "subsystem": subsystem.to_string() })),
		),
		Error::NoKey => (ErrorCode::DecodeError, None),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn device_errors_keep_status() {
		let err = CliError::from(snap::Error::Protocol {
			endpoint: "/api/v1/status".into(),
			status: 503,
		});
		let command_error = err.to_command_error();
		assert_eq!(command_error.code, ErrorCode::DeviceError);
		assert_eq!(command_error.details.unwrap()["status"], 503);
	}

	#[test]
	fn refused_token_is_an_auth_error() {
		let refused = CliError::from(snap::Error::Protocol {
			endpoint: "/api/v1/status".into(),
			status: 401,
		});
		assert_eq!(refused.to_command_error().code, ErrorCode::AuthError);
		assert_eq!(
			CliError::from(snap::Error::InvalidToken).to_command_error().code,
			ErrorCode::AuthError
		);
	}

	#[test]
	fn not_homed_message_points_at_home() {
		let command_error = CliError::NotHomed.to_command_error();
		assert_eq!(command_error.code, ErrorCode::NotHomed);
		assert!(command_error.message.contains("snap home"));
	}
}

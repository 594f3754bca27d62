//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use snap_protocol::endpoints::{DEFAULT_PORT, SUPPORTED_SERIES};

/// Default interval between background status refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Shortest interval the poller waits between refresh rounds.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default per-request timeout; camera captures move the head first, so it is generous.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Options applied by [`SessionManager`](crate::SessionManager) to every session it opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionOptions {
	/// Milliseconds between background refreshes.
	pub poll_interval_ms: u64,
	/// Milliseconds before a single request is abandoned by the HTTP client.
	pub request_timeout_ms: u64,
	/// Device model the handshake must report.
	pub expected_series: String,
	/// Port used when the address is a bare host.
	pub default_port: u16,
}

impl Default for SessionOptions {
	fn default() -> Self {
		Self {
			poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
			request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
			expected_series: SUPPORTED_SERIES.to_string(),
			default_port: DEFAULT_PORT,
		}
	}
}

impl SessionOptions {
	/// Background refresh interval, never below [`MIN_POLL_INTERVAL`].
	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms).max(MIN_POLL_INTERVAL)
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_millis(self.request_timeout_ms)
	}

	/// Sets the background refresh interval.
	pub fn with_poll_interval(mut self, interval: Duration) -> Self {
		self.poll_interval_ms = interval.as_millis() as u64;
		self
	}

	/// Sets the per-request timeout.
	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout_ms = timeout.as_millis() as u64;
		self
	}

	/// Sets the device model the handshake must report.
	pub fn with_expected_series(mut self, series: impl Into<String>) -> Self {
		self.expected_series = series.into();
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_config_falls_back_to_defaults() {
		let options: SessionOptions = serde_json::from_str(r#"{"pollIntervalMs":250}"#).unwrap();
		assert_eq!(options.poll_interval(), Duration::from_millis(250));
		assert_eq!(options.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
		assert_eq!(options.expected_series, "Snapmaker 2.0 A350");
		assert_eq!(options.default_port, 8080);
	}

	#[test]
	fn poll_interval_has_a_floor() {
		let options = SessionOptions::default().with_poll_interval(Duration::ZERO);
		assert_eq!(options.poll_interval(), MIN_POLL_INTERVAL);
		let options = SessionOptions::default().with_poll_interval(Duration::from_millis(25));
		assert_eq!(options.poll_interval(), Duration::from_millis(25));
	}
}

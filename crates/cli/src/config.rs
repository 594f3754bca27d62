//! The `snapmaker.config` file: machine address, token and per-tool camera offsets.
//!
//! ```json
//! {
//!   "Token": "0c5a1e4b-...",
//!   "Address": "192.168.1.20",
//!   "Tools": { "2": { "CameraCoordsDelta": [-31.5, 8.0, 0.0] } }
//! }
//! ```
//!
//! Tool keys are controller module ids; lowercase field names are accepted too.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
	#[serde(rename = "Token", alias = "token", default)]
	pub token: String,

	#[serde(rename = "Address", alias = "address", default)]
	pub address: String,

	#[serde(rename = "Tools", alias = "tools", default, skip_serializing_if = "BTreeMap::is_empty")]
	pub tools: BTreeMap<i64, ToolConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
	/// Head displacement (dx, dy, dz) that centers the camera on the spot
	/// under the tool.
	#[serde(
		rename = "CameraCoordsDelta",
		alias = "camera_delta",
		default,
		skip_serializing_if = "Option::is_none"
	)]
	pub camera_delta: Option<[f64; 3]>,
}

impl Config {
	pub fn load(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path).map_err(|err| config_error(path, format!("read failed: {err}")))?;
		serde_json::from_str(&content).map_err(|err| config_error(path, format!("parse failed: {err}")))
	}

	/// Loads `path`, or starts from an empty config when it does not exist yet.
	pub fn load_or_default(path: &Path) -> Result<Self> {
		if path.exists() {
			Self::load(path)
		} else {
			Ok(Self::default())
		}
	}

	/// Writes the config back, readable by the owner only.
	pub fn save(&self, path: &Path) -> Result<()> {
		if let Some(parent) = path.parent() {
			if !parent.as_os_str().is_empty() {
				fs::create_dir_all(parent)?;
			}
		}
		fs::write(path, serde_json::to_string_pretty(self)?)?;
		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
		}
		Ok(())
	}

	/// Address and token to connect with, command line values first.
	pub fn endpoint(&self, path: &Path, address: Option<&str>, token: Option<&str>) -> Result<(String, String)> {
		let address = address.unwrap_or(&self.address);
		let token = token.unwrap_or(&self.token);
		if address.is_empty() {
			return Err(config_error(path, "no address; pass --address or set \"Address\"".into()));
		}
		if token.is_empty() {
			return Err(config_error(path, "no token; pass --token or set \"Token\"".into()));
		}
		Ok((address.to_string(), token.to_string()))
	}

	pub fn camera_delta(&self, tool: i64) -> Option<[f64; 3]> {
		self.tools.get(&tool).and_then(|t| t.camera_delta)
	}

	pub fn set_camera_delta(&mut self, tool: i64, delta: [f64; 3]) {
		self.tools.entry(tool).or_default().camera_delta = Some(delta);
	}
}

fn config_error(path: &Path, message: String) -> CliError {
	CliError::Config {
		path: path.to_path_buf(),
		message,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn reads_capitalized_file() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("snapmaker.config");
		fs::write(
			&path,
			r#"{"Token":"abc","Address":"10.0.0.7","Tools":{"2":{"CameraCoordsDelta":[-31.5,8,0]}}}"#,
		)
		.unwrap();

		let config = Config::load(&path).unwrap();
		assert_eq!(config.token, "abc");
		assert_eq!(config.address, "10.0.0.7");
		assert_eq!(config.camera_delta(2), Some([-31.5, 8.0, 0.0]));
		assert_eq!(config.camera_delta(1), None);
	}

	#[test]
	fn accepts_lowercase_keys() {
		let config: Config =
			serde_json::from_str(r#"{"token":"t","address":"a","tools":{"23":{"camera_delta":[1,2,3]}}}"#).unwrap();
		assert_eq!(config.camera_delta(23), Some([1.0, 2.0, 3.0]));
	}

	#[test]
	fn save_keeps_other_fields() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("nested").join("snapmaker.config");
		let mut config = Config {
			token: "abc".into(),
			address: "printer.lan".into(),
			..Config::default()
		};
		config.set_camera_delta(2, [1.0, -2.0, 0.5]);
		config.save(&path).unwrap();

		let reloaded = Config::load(&path).unwrap();
		assert_eq!(reloaded, config);

		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			let mode = fs::metadata(&path).unwrap().permissions().mode();
			assert_eq!(mode & 0o777, 0o600);
		}
	}

	#[test]
	fn missing_file_is_a_config_error() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("absent.config");
		assert!(matches!(Config::load(&path), Err(CliError::Config { .. })));
		assert_eq!(Config::load_or_default(&path).unwrap(), Config::default());
	}

	#[test]
	fn flags_override_file_values() {
		let path = Path::new("snapmaker.config");
		let config = Config {
			token: "file-token".into(),
			address: "file-host".into(),
			..Config::default()
		};

		let (address, token) = config.endpoint(path, Some("flag-host"), None).unwrap();
		assert_eq!(address, "flag-host");
		assert_eq!(token, "file-token");

		let empty = Config::default();
		assert!(matches!(empty.endpoint(path, None, Some("t")), Err(CliError::Config { .. })));
	}
}

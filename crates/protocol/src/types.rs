//! Response bodies of the status, enclosure, listing and handshake endpoints.
//!
//! Every field defaults to its zero value when the firmware omits it, which
//! it does depending on the attached tool head.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tool status string reported while nothing is executing.
pub const STATUS_IDLE: &str = "IDLE";
/// Tool status string reported while a job is executing.
pub const STATUS_RUNNING: &str = "RUNNING";
/// Tool status string reported while a job is paused.
pub const STATUS_PAUSED: &str = "PAUSED";

/// Body of a successful `/api/v1/connect` handshake.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectResponse {
	/// Token echoed back by the device; must equal the one sent.
	pub token: String,
	/// Whether this session may only observe.
	#[serde(rename = "readonly")]
	pub read_only: bool,
	/// Device model string, e.g. `"Snapmaker 2.0 A350"`.
	pub series: String,
	/// Numeric code of the mounted head type.
	pub head_type: i32,
	/// Whether an enclosure is attached.
	pub has_enclosure: bool,
}

/// Body of `/api/v1/status`: position, job progress and tool head state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolSnapshot {
	/// Open set of states; see [`STATUS_IDLE`], [`STATUS_RUNNING`], [`STATUS_PAUSED`].
	pub status: String,
	pub x: f64,
	pub y: f64,
	pub z: f64,
	pub homed: bool,
	/// Work origin expressed in machine coordinates.
	pub offset_x: f64,
	pub offset_y: f64,
	pub offset_z: f64,
	/// Tool head identifier, e.g. `TOOLHEAD_3DPRINTING_1` or `TOOLHEAD_CNC_1`.
	pub tool_head: String,
	pub laser_focal_length: f64,
	pub laser_power: f64,
	/// Whether the laser head carries a camera.
	pub laser_camera: bool,
	#[serde(rename = "laser10WErrorState")]
	pub laser_10w_error_state: i32,
	pub work_speed: i32,
	pub print_status: String,
	pub file_name: String,
	pub total_lines: i64,
	pub estimated_time: f64,
	pub current_line: i64,
	pub progress: f64,
	/// Seconds since the job started.
	pub elapsed_time: i64,
	/// Seconds until the job is expected to finish.
	pub remaining_time: i64,
	pub module_list: BTreeMap<String, bool>,
	pub is_enclosure_door_open: bool,
	pub door_switch_count: i32,
}

/// Body of `GET /api/v1/enclosure`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnclosureSnapshot {
	pub is_ready: bool,
	pub is_door_enabled: bool,
	pub is_enclosure_door_open: bool,
	/// LED brightness in percent.
	pub led: i32,
	/// Fan speed in percent.
	pub fan: i32,
}

/// One mount point of the controller and the module plugged into it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleEntry {
	pub key: i64,
	pub module_id: i64,
	pub status: bool,
}

/// Body of `/api/v1/module_list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleListing {
	pub module_list: Vec<ModuleEntry>,
}

impl ModuleListing {
	/// Returns `(module_id, status)` of the module mounted at `key`.
	///
	/// The main tool head is mounted at key 1.
	pub fn tool_head(&self, key: i64) -> Option<(i64, bool)> {
		self.module_list
			.iter()
			.find(|m| m.key == key)
			.map(|m| (m.module_id, m.status))
	}
}

/// Human-readable name of a known module id.
pub fn module_name(module_id: i64) -> Option<&'static str> {
	match module_id {
		1 => Some("standardCNCToolheadForSM2"),
		2 => Some("levelOneLaserToolheadForSM2"),
		23 => Some("2W Laser Module"),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn connect_response_reads_readonly_flag() {
		let body = r#"{"token":"t","readonly":true,"series":"Snapmaker 2.0 A350","headType":2,"hasEnclosure":true}"#;
		let res: ConnectResponse = serde_json::from_str(body).unwrap();
		assert!(res.read_only);
		assert_eq!(res.head_type, 2);
		assert!(res.has_enclosure);
	}

	#[test]
	fn tool_snapshot_tolerates_missing_fields() {
		let body = r#"{"status":"IDLE","x":1.5,"homed":true,"laser10WErrorState":3}"#;
		let tool: ToolSnapshot = serde_json::from_str(body).unwrap();
		assert_eq!(tool.status, STATUS_IDLE);
		assert_eq!(tool.x, 1.5);
		assert_eq!(tool.y, 0.0);
		assert!(tool.homed);
		assert_eq!(tool.laser_10w_error_state, 3);
		assert!(tool.module_list.is_empty());
	}

	#[test]
	fn listing_looks_up_tool_head_by_key() {
		let body = r#"{"moduleList":[{"key":1,"moduleId":2,"status":true},{"key":7,"moduleId":23,"status":false}]}"#;
		let listing: ModuleListing = serde_json::from_str(body).unwrap();
		assert_eq!(listing.tool_head(1), Some((2, true)));
		assert_eq!(listing.tool_head(7), Some((23, false)));
		assert_eq!(listing.tool_head(3), None);
		assert_eq!(module_name(2), Some("levelOneLaserToolheadForSM2"));
		assert_eq!(module_name(99), None);
	}
}

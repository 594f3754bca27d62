//! Untagged module status records from `/api/v1/module_info`.
//!
//! Each record is a flat JSON object `{"key": <int>, ...fields}` with no
//! discriminant. The concrete variant is chosen once, at decode time, by
//! probing for signature fields in the fixed order of [`SIGNATURES`]; the
//! first hit wins. Records that match no signature are kept as
//! [`ModulePayload::Unknown`] so that new hardware never breaks a listing.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Errors produced while decoding module records.
#[derive(Debug, Error)]
pub enum ModuleDecodeError {
	/// The record has no non-negative integer `key`.
	#[error("no key found")]
	NoKey,

	/// The body, or a record whose signature matched, has the wrong shape.
	#[error("malformed module record: {0}")]
	Malformed(#[from] serde_json::Error),
}

/// Concrete variant of a module record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
	Laser,
	Enclosure,
	EmergencyStop,
	QuickSwap,
	BracingKit,
	Cnc,
	Unknown,
}

/// Sniff order: the first field present in a record selects its variant.
pub const SIGNATURES: [(&str, ModuleKind); 6] = [
	("laserPower", ModuleKind::Laser),
	("isEnclosureDoorOpen", ModuleKind::Enclosure),
	("isEmergencyStopped", ModuleKind::EmergencyStop),
	("quickSwapState", ModuleKind::QuickSwap),
	("bracingKitState", ModuleKind::BracingKit),
	("spindleSpeed", ModuleKind::Cnc),
];

impl ModuleKind {
	/// Selects the variant for a record's fields (the `key` already removed).
	pub fn sniff(fields: &Map<String, Value>) -> Self {
		SIGNATURES
			.iter()
			.find(|(field, _)| fields.contains_key(*field))
			.map(|(_, kind)| *kind)
			.unwrap_or(ModuleKind::Unknown)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LaserModule {
	pub laser_focal_length: f64,
	pub laser_power: f64,
	pub laser_camera: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnclosureModule {
	pub is_ready: bool,
	pub led: i32,
	pub fan: i32,
	pub is_door_enabled: bool,
	pub is_enclosure_door_open: bool,
	pub door_switch_count: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmergencyStopModule {
	pub is_emergency_stopped: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuickSwapModule {
	pub quick_swap_state: i32,
	pub quick_swap_type: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BracingKitModule {
	pub bracing_kit_state: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CncModule {
	pub spindle_speed: i32,
}

/// Variant-specific part of a [`ModuleRecord`].
///
/// Serializes as the bare field list of the inner type so that the record
/// can flatten it next to `key`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModulePayload {
	Laser(LaserModule),
	Enclosure(EnclosureModule),
	EmergencyStop(EmergencyStopModule),
	QuickSwap(QuickSwapModule),
	BracingKit(BracingKitModule),
	Cnc(CncModule),
	/// Fields of a record no signature matched, kept verbatim.
	Unknown(Map<String, Value>),
}

impl ModulePayload {
	/// Returns the variant tag.
	pub fn kind(&self) -> ModuleKind {
		match self {
			ModulePayload::Laser(_) => ModuleKind::Laser,
			ModulePayload::Enclosure(_) => ModuleKind::Enclosure,
			ModulePayload::EmergencyStop(_) => ModuleKind::EmergencyStop,
			ModulePayload::QuickSwap(_) => ModuleKind::QuickSwap,
			ModulePayload::BracingKit(_) => ModuleKind::BracingKit,
			ModulePayload::Cnc(_) => ModuleKind::Cnc,
			ModulePayload::Unknown(_) => ModuleKind::Unknown,
		}
	}

	/// Builds the payload for an already-sniffed kind.
	fn from_fields(kind: ModuleKind, fields: Map<String, Value>) -> serde_json::Result<Self> {
		fn typed<T: serde::de::DeserializeOwned>(fields: Map<String, Value>) -> serde_json::Result<T> {
			serde_json::from_value(Value::Object(fields))
		}

		Ok(match kind {
			ModuleKind::Laser => ModulePayload::Laser(typed(fields)?),
			ModuleKind::Enclosure => ModulePayload::Enclosure(typed(fields)?),
			ModuleKind::EmergencyStop => ModulePayload::EmergencyStop(typed(fields)?),
			ModuleKind::QuickSwap => ModulePayload::QuickSwap(typed(fields)?),
			ModuleKind::BracingKit => ModulePayload::BracingKit(typed(fields)?),
			ModuleKind::Cnc => ModulePayload::Cnc(typed(fields)?),
			ModuleKind::Unknown => ModulePayload::Unknown(fields),
		})
	}
}

/// One decoded entry of a `module_info` listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRecord {
	pub key: u32,
	pub payload: ModulePayload,
}

#[derive(Serialize)]
struct WireRecord<'a> {
	key: u32,
	#[serde(flatten)]
	payload: &'a ModulePayload,
}

impl ModuleRecord {
	pub fn new(key: u32, payload: ModulePayload) -> Self {
		Self { key, payload }
	}

	/// Returns the variant tag of the payload.
	pub fn kind(&self) -> ModuleKind {
		self.payload.kind()
	}

	/// Decodes one record from its JSON value.
	///
	/// # Errors
	///
	/// [`ModuleDecodeError::NoKey`] when the value is not an object or has no
	/// non-negative integer `key`; [`ModuleDecodeError::Malformed`] when a
	/// matched signature's fields have the wrong types.
	pub fn decode(value: Value) -> Result<Self, ModuleDecodeError> {
		let Value::Object(mut fields) = value else {
			return Err(ModuleDecodeError::NoKey);
		};
		let key = fields
			.remove("key")
			.as_ref()
			.and_then(Value::as_u64)
			.and_then(|k| u32::try_from(k).ok())
			.ok_or(ModuleDecodeError::NoKey)?;

		let kind = ModuleKind::sniff(&fields);
		if kind == ModuleKind::Unknown {
			debug!(
				target = "snap.protocol",
				key,
				fields = %serde_json::Value::Object(fields.clone()),
				"module record matches no known shape"
			);
		}
		let payload = ModulePayload::from_fields(kind, fields)?;
		Ok(Self { key, payload })
	}

	/// Decodes one record from raw JSON bytes.
	pub fn from_slice(bytes: &[u8]) -> Result<Self, ModuleDecodeError> {
		let value: Value = serde_json::from_slice(bytes)?;
		Self::decode(value)
	}
}

impl Serialize for ModuleRecord {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		WireRecord {
			key: self.key,
			payload: &self.payload,
		}
		.serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for ModuleRecord {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let value = Value::deserialize(deserializer)?;
		ModuleRecord::decode(value).map_err(D::Error::custom)
	}
}

impl fmt::Display for ModuleRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
		f.write_str(&json)
	}
}

/// Body of `/api/v1/module_info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleInfo {
	pub module_info: Vec<ModuleRecord>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawModuleInfo {
	module_info: Vec<Value>,
}

impl ModuleInfo {
	/// Decodes a full `module_info` body, keeping one entry per input record.
	///
	/// Unknown shapes never fail the listing; a record without a key does.
	pub fn from_slice(bytes: &[u8]) -> Result<Self, ModuleDecodeError> {
		let raw: RawModuleInfo = serde_json::from_slice(bytes)?;
		let module_info = raw
			.module_info
			.into_iter()
			.map(ModuleRecord::decode)
			.collect::<Result<Vec<_>, _>>()?;
		Ok(Self { module_info })
	}

	/// Returns the record mounted at `key`.
	pub fn get(&self, key: u32) -> Option<&ModuleRecord> {
		self.module_info.iter().find(|m| m.key == key)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn decodes_laser_record() {
		let record = ModuleRecord::from_slice(
			br#"{"key":1,"laserFocalLength":7.2,"laserPower":50,"laserCamera":true}"#,
		)
		.unwrap();

		assert_eq!(record.key, 1);
		assert_eq!(
			record.payload,
			ModulePayload::Laser(LaserModule {
				laser_focal_length: 7.2,
				laser_power: 50.0,
				laser_camera: true,
			})
		);

		let encoded = serde_json::to_value(&record).unwrap();
		assert_eq!(
			encoded,
			json!({"key":1,"laserFocalLength":7.2,"laserPower":50.0,"laserCamera":true})
		);
	}

	#[test]
	fn every_known_variant_survives_reencoding() {
		let records = vec![
			ModuleRecord::new(
				1,
				ModulePayload::Laser(LaserModule {
					laser_focal_length: 12.25,
					laser_power: 1.5,
					laser_camera: false,
				}),
			),
			ModuleRecord::new(
				2,
				ModulePayload::Enclosure(EnclosureModule {
					is_ready: true,
					led: 80,
					fan: 35,
					is_door_enabled: true,
					is_enclosure_door_open: false,
					door_switch_count: 4,
				}),
			),
			ModuleRecord::new(
				3,
				ModulePayload::EmergencyStop(EmergencyStopModule {
					is_emergency_stopped: true,
				}),
			),
			ModuleRecord::new(
				4,
				ModulePayload::QuickSwap(QuickSwapModule {
					quick_swap_state: 1,
					quick_swap_type: 2,
				}),
			),
			ModuleRecord::new(
				5,
				ModulePayload::BracingKit(BracingKitModule {
					bracing_kit_state: 3,
				}),
			),
			ModuleRecord::new(6, ModulePayload::Cnc(CncModule { spindle_speed: 12000 })),
		];

		for record in records {
			let value = serde_json::to_value(&record).unwrap();
			assert_eq!(value["key"], json!(record.key));
			let decoded = ModuleRecord::decode(value).unwrap();
			assert_eq!(decoded, record);
		}
	}

	#[test]
	fn sniff_order_prefers_earlier_signature() {
		let record = ModuleRecord::decode(json!({"key":9,"spindleSpeed":100,"laserPower":20})).unwrap();
		assert_eq!(record.kind(), ModuleKind::Laser);

		let record = ModuleRecord::decode(json!({"key":9,"bracingKitState":1,"isEmergencyStopped":true})).unwrap();
		assert_eq!(record.kind(), ModuleKind::EmergencyStop);
	}

	#[test]
	fn unknown_shape_keeps_listing_intact() {
		let body = br#"{"moduleInfo":[
			{"key":1,"laserFocalLength":7.2,"laserPower":50,"laserCamera":true},
			{"key":2,"rotaryAngle":90,"firmware":"1.2"},
			{"key":3,"spindleSpeed":9000}
		]}"#;
		let info = ModuleInfo::from_slice(body).unwrap();

		assert_eq!(info.module_info.len(), 3);
		let unknown = info.get(2).unwrap();
		assert_eq!(unknown.kind(), ModuleKind::Unknown);
		assert_eq!(info.get(3).unwrap().kind(), ModuleKind::Cnc);

		let reencoded = serde_json::to_value(unknown).unwrap();
		assert_eq!(reencoded, json!({"key":2,"rotaryAngle":90,"firmware":"1.2"}));
	}

	#[test]
	fn record_without_usable_key_is_rejected() {
		for value in [
			json!({"laserPower": 1}),
			json!({"key": -1, "laserPower": 1}),
			json!({"key": "1", "laserPower": 1}),
			json!({"key": 1.5}),
			json!([1, 2]),
		] {
			assert!(matches!(ModuleRecord::decode(value), Err(ModuleDecodeError::NoKey)));
		}
	}

	#[test]
	fn matched_signature_with_wrong_types_is_malformed() {
		let err = ModuleRecord::decode(json!({"key":1,"laserPower":"high"})).unwrap_err();
		assert!(matches!(err, ModuleDecodeError::Malformed(_)));
	}

	#[test]
	fn record_deserializes_through_serde() {
		let info: ModuleInfo = serde_json::from_str(r#"{"moduleInfo":[{"key":4,"quickSwapState":1,"quickSwapType":0}]}"#).unwrap();
		assert_eq!(info.module_info[0].kind(), ModuleKind::QuickSwap);
		assert_eq!(info.module_info[0].to_string(), r#"{"key":4,"quickSwapState":1,"quickSwapType":0}"#);
	}
}

use serde_json::json;

use super::*;

#[test]
fn result_builder_success() {
	let result = ResultBuilder::new("locate").data(json!({"x": 1.0})).build();

	assert!(result.ok);
	assert_eq!(result.command, "locate");
	assert_eq!(result.schema_version, Some(SCHEMA_VERSION));
	assert!(result.error.is_none());
	assert!(result.timings.is_some());
}

#[test]
fn result_builder_error() {
	let result: CommandResult<()> = ResultBuilder::new("move")
		.error(CommandError {
			code: ErrorCode::NotHomed,
			message: "home the machine first".into(),
			details: None,
		})
		.build();

	assert!(!result.ok);
	assert!(result.data.is_none());
	assert_eq!(result.error.as_ref().unwrap().code, ErrorCode::NotHomed);
}

#[test]
fn error_code_display_matches_serde() {
	for code in [ErrorCode::NotHomed, ErrorCode::ConnectionFailed, ErrorCode::UnsupportedDevice] {
		let serialized = serde_json::to_value(code).unwrap();
		assert_eq!(serialized, json!(code.to_string()));
	}
	assert_eq!(ErrorCode::AuthError.to_string(), "AUTH_ERROR");
}

#[test]
fn output_format_parse() {
	assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
	assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
	assert!("toon".parse::<OutputFormat>().is_err());
}

#[test]
fn envelope_uses_camel_case() {
	let result = ResultBuilder::new("photo")
		.data("saved")
		.artifact(Artifact::new(ArtifactType::Photo, "/tmp/photo.jpg", 2048))
		.build();

	let value = serde_json::to_value(&result).unwrap();
	assert_eq!(value["schemaVersion"], 1);
	assert_eq!(value["artifacts"][0]["type"], "photo");
	assert_eq!(value["artifacts"][0]["sizeBytes"], 2048);
	assert!(value["timings"]["durationMs"].is_u64());
	assert!(value.get("error").is_none());
}

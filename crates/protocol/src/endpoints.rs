//! HTTP endpoint paths exposed by the machine.
//!
//! The device listens on a fixed port; paths are relative to the base URL.

/// Port the control API listens on when only a host is given.
pub const DEFAULT_PORT: u16 = 8080;

/// Device identity reported by the supported model during the handshake.
pub const SUPPORTED_SERIES: &str = "Snapmaker 2.0 A350";

pub const CONNECT: &str = "/api/v1/connect";
pub const DISCONNECT: &str = "/api/v1/disconnect";
pub const STATUS: &str = "/api/v1/status";
pub const ENCLOSURE: &str = "/api/v1/enclosure";
pub const MODULE_INFO: &str = "/api/v1/module_info";
pub const MODULE_LIST: &str = "/api/v1/module_list";
pub const EXECUTE_CODE: &str = "/api/v1/execute_code";
pub const REQUEST_CAPTURE_PHOTO: &str = "/api/request_capture_photo";
pub const GET_CAMERA_IMAGE: &str = "/api/get_camera_image";
pub const PREPARE_PRINT: &str = "/api/v1/prepare_print";
pub const START_PRINT: &str = "/api/v1/start_print";
pub const PAUSE_PRINT: &str = "/api/v1/pause_print";
pub const RESUME_PRINT: &str = "/api/v1/resume_print";
pub const STOP_PRINT: &str = "/api/v1/stop_print";

//! Scripted in-memory device used by unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::{Value, json};
use snap_protocol::endpoints;
use snap_runtime::{Channel, Error, Params, Result, Transport, Upload};

use crate::options::SessionOptions;
use crate::session::{Session, SessionManager};
use crate::state::{DeviceInfo, Shared};

pub(crate) const TOKEN: &str = "0c5a1e4b";

#[derive(Debug, Clone)]
pub(crate) enum Reply {
	Body(Vec<u8>),
	Status(u16),
	Offline,
}

#[derive(Debug, Clone)]
pub(crate) struct Call {
	pub(crate) method: &'static str,
	pub(crate) endpoint: &'static str,
	pub(crate) params: Params,
	pub(crate) upload: Option<Upload>,
}

impl Call {
	pub(crate) fn param(&self, name: &str) -> Option<&str> {
		self.params
			.iter()
			.find(|(key, _)| *key == name)
			.map(|(_, value)| value.as_str())
	}
}

/// Answers each endpoint with a fixed reply and records every call.
///
/// Endpoints without a scripted reply answer with an empty 200 body. The
/// reply is picked when the request arrives, before any scripted delay.
#[derive(Default)]
pub(crate) struct FakeDevice {
	replies: Mutex<HashMap<&'static str, Reply>>,
	delays: Mutex<HashMap<&'static str, Duration>>,
	calls: Mutex<Vec<Call>>,
}

impl FakeDevice {
	/// An idle, homed A350 with an enclosure and a camera-equipped laser head.
	pub(crate) fn a350() -> Arc<Self> {
		let device = Arc::new(Self::default());
		device.reply_json(
			endpoints::CONNECT,
			json!({
				"token": TOKEN,
				"readonly": false,
				"series": "Snapmaker 2.0 A350",
				"headType": 2,
				"hasEnclosure": true,
			}),
		);
		device.reply_json(
			endpoints::STATUS,
			json!({
				"status": "IDLE",
				"x": 10.0, "y": 20.0, "z": 5.0,
				"homed": true,
				"offsetX": 1.0, "offsetY": 2.0, "offsetZ": 3.0,
				"toolHead": "TOOLHEAD_LASER_1",
				"laserCamera": true,
			}),
		);
		device.reply_json(
			endpoints::ENCLOSURE,
			json!({"isReady": true, "isDoorEnabled": false, "isEnclosureDoorOpen": false, "led": 100, "fan": 0}),
		);
		device.reply_json(
			endpoints::MODULE_INFO,
			json!({"moduleInfo": [
				{"key": 1, "laserFocalLength": 7.2, "laserPower": 50.0, "laserCamera": true},
				{"key": 3, "isReady": true, "led": 100, "fan": 0, "isDoorEnabled": false, "isEnclosureDoorOpen": false, "doorSwitchCount": 4},
			]}),
		);
		device.reply_json(
			endpoints::MODULE_LIST,
			json!({"moduleList": [{"key": 1, "moduleId": 2, "status": true}]}),
		);
		device
	}

	pub(crate) fn reply(&self, endpoint: &'static str, reply: Reply) {
		self.replies.lock().insert(endpoint, reply);
	}

	pub(crate) fn reply_json(&self, endpoint: &'static str, body: Value) {
		self.reply(endpoint, Reply::Body(body.to_string().into_bytes()));
	}

	/// Merges `patch` into the scripted JSON object of `endpoint`.
	pub(crate) fn patch_json(&self, endpoint: &'static str, patch: Value) {
		let mut replies = self.replies.lock();
		let mut body: Value = match replies.get(endpoint) {
			Some(Reply::Body(bytes)) => serde_json::from_slice(bytes).unwrap_or_else(|_| json!({})),
			_ => json!({}),
		};
		if let (Some(body), Value::Object(patch)) = (body.as_object_mut(), patch) {
			body.extend(patch);
		}
		replies.insert(endpoint, Reply::Body(body.to_string().into_bytes()));
	}

	pub(crate) fn delay(&self, endpoint: &'static str, delay: Duration) {
		self.delays.lock().insert(endpoint, delay);
	}

	pub(crate) fn calls(&self) -> Vec<Call> {
		self.calls.lock().clone()
	}

	pub(crate) fn calls_to(&self, endpoint: &str) -> Vec<Call> {
		self.calls
			.lock()
			.iter()
			.filter(|call| call.endpoint == endpoint)
			.cloned()
			.collect()
	}

	/// G-code lines sent to `execute_code`, in order.
	pub(crate) fn codes(&self) -> Vec<String> {
		self.calls_to(endpoints::EXECUTE_CODE)
			.iter()
			.filter_map(|call| call.param("code").map(str::to_string))
			.collect()
	}

	pub(crate) fn clear_calls(&self) {
		self.calls.lock().clear();
	}

	async fn respond(
		&self,
		method: &'static str,
		endpoint: &'static str,
		params: Params,
		upload: Option<Upload>,
	) -> Result<Vec<u8>> {
		self.calls.lock().push(Call {
			method,
			endpoint,
			params,
			upload,
		});
		let reply = self.replies.lock().get(endpoint).cloned();
		let delay = self.delays.lock().get(endpoint).copied();
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		match reply {
			None => Ok(Vec::new()),
			Some(Reply::Body(body)) => Ok(body),
			Some(Reply::Status(status)) => Err(Error::Protocol {
				endpoint: endpoint.to_string(),
				status,
			}),
			Some(Reply::Offline) => Err(Error::Network {
				endpoint: endpoint.to_string(),
				message: "connection refused".into(),
			}),
		}
	}
}

impl Transport for FakeDevice {
	fn get(&self, endpoint: &'static str, query: Params) -> BoxFuture<'_, Result<Vec<u8>>> {
		Box::pin(self.respond("GET", endpoint, query, None))
	}

	fn post_form(&self, endpoint: &'static str, form: Params) -> BoxFuture<'_, Result<Vec<u8>>> {
		Box::pin(self.respond("POST", endpoint, form, None))
	}

	fn post_multipart(
		&self,
		endpoint: &'static str,
		fields: Params,
		upload: Upload,
	) -> BoxFuture<'_, Result<Vec<u8>>> {
		Box::pin(self.respond("POST", endpoint, fields, Some(upload)))
	}
}

/// Connected session state over `device`, without a poller.
pub(crate) fn shared(device: &Arc<FakeDevice>, has_enclosure: bool) -> Arc<Shared> {
	let channel = Channel::new(device.clone(), TOKEN);
	Arc::new(Shared::new(
		channel,
		DeviceInfo {
			series: "Snapmaker 2.0 A350".into(),
			read_only: false,
			head_type: 2,
			has_enclosure,
		},
	))
}

/// Connects a session to `device` with the default poll interval.
pub(crate) async fn connect(device: &Arc<FakeDevice>) -> Session {
	connect_with(device, SessionOptions::default()).await
}

pub(crate) async fn connect_with(device: &Arc<FakeDevice>, options: SessionOptions) -> Session {
	SessionManager::new(options)
		.with_transport(device.clone())
		.connect("printer.lan", TOKEN)
		.await
		.expect("connect to fake device")
}

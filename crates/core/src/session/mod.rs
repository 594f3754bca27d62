//! Session lifecycle and the read side of the cached machine state.
//!
//! [`SessionManager::connect`] performs the handshake, fetches the module
//! listing, starts the background poller and waits for its first refresh.
//! The returned [`Session`] owns the poller; [`Session::disconnect`] (or
//! dropping the session) stops it.

use std::sync::Arc;

use snap_protocol::{ConnectResponse, ModuleInfo, ModuleListing, endpoints};
use snap_runtime::{Channel, Error, HttpTransport, Result, Subsystem, Transport, base_url_for};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregator;
use crate::gate::MotionGate;
use crate::options::SessionOptions;
use crate::poller::BackgroundPoller;
use crate::state::{DeviceInfo, JobProgress, Location, SessionSnapshot, Shared};


/// Opens sessions with a fixed set of [`SessionOptions`].
#[derive(Clone, Default)]
pub struct SessionManager {
	options: SessionOptions,
	transport: Option<Arc<dyn Transport>>,
}

impl SessionManager {
	pub fn new(options: SessionOptions) -> Self {
		Self {
			options,
			transport: None,
		}
	}

	/// Routes every session through `transport` instead of a new HTTP client.
	pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	pub fn options(&self) -> &SessionOptions {
		&self.options
	}

	fn transport_for(&self, address: &str) -> Result<Arc<dyn Transport>> {
		if let Some(transport) = &self.transport {
			return Ok(Arc::clone(transport));
		}
		let base_url = base_url_for(address, self.options.default_port);
		Ok(Arc::new(HttpTransport::new(base_url, self.options.request_timeout())?))
	}

	/// Connects to the machine at `address` and authenticates with `token`.
	///
	/// `address` is a bare host (the default port is appended) or a full
	/// `http(s)://` base URL.
	///
	/// # Errors
	///
	/// - [`Error::InvalidToken`] if the device echoes a different token
	/// - [`Error::UnsupportedDevice`] if the device is not the expected model
	/// - the error of the module listing or of the first refresh round; the
	///   half-open session is disconnected before returning
	pub async fn connect(&self, address: &str, token: &str) -> Result<Session> {
		let channel = Channel::new(self.transport_for(address)?, token);
		debug!(target = "snap.session", address, "handshake");

		let response: ConnectResponse = channel
			.send_decoded(endpoints::CONNECT, Subsystem::Handshake, Vec::new())
			.await?;
		if response.token != token {
			warn!(target = "snap.session", address, "device echoed a different token");
			return Err(Error::InvalidToken);
		}
		if response.series != self.options.expected_series {
			return Err(Error::UnsupportedDevice {
				series: response.series,
			});
		}

		let shared = Arc::new(Shared::new(
			channel,
			DeviceInfo {
				series: response.series,
				read_only: response.read_only,
				head_type: response.head_type,
				has_enclosure: response.has_enclosure,
			},
		));

		if let Err(e) = aggregator::refresh_module_list(&shared).await {
			abandon(&shared).await;
			return Err(e);
		}

		let (poller, first) = BackgroundPoller::spawn(Arc::clone(&shared), self.options.poll_interval());
		let session = Session {
			gate: MotionGate::new(Arc::clone(&shared)),
			shared,
			poller,
		};

		let first = first.await.unwrap_or(Err(Error::NotConnected));
		if let Err(e) = first {
			session.poller.stop().await;
			abandon(&session.shared).await;
			return Err(e);
		}

		let device = session.device();
		info!(
			target = "snap.session",
			address,
			read_only = device.read_only,
			head_type = device.head_type,
			has_enclosure = device.has_enclosure,
			"connected"
		);
		Ok(session)
	}
}

impl std::fmt::Debug for SessionManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionManager")
			.field("options", &self.options)
			.field("custom_transport", &self.transport.is_some())
			.finish()
	}
}

/// Tears down a session that never finished connecting.
async fn abandon(shared: &Shared) {
	shared.mark_disconnected();
	if let Err(e) = shared.channel.send(endpoints::DISCONNECT, Vec::new()).await {
		debug!(target = "snap.session", error = %e, "disconnect after failed connect");
	}
}

/// One authenticated session with a machine.
///
/// Motion operations live in [`crate::motion`], camera capture in
/// [`crate::camera`], job control in [`crate::job`].
pub struct Session {
	pub(crate) shared: Arc<Shared>,
	pub(crate) gate: MotionGate,
	poller: BackgroundPoller,
}

impl Session {
	/// Ends the session.
	///
	/// Waiters on the motion gate and on [`await_status`](Self::await_status)
	/// fail with [`Error::NotConnected`], the poller is stopped, then the
	/// device is told. The local session is gone even if that last call fails.
	pub async fn disconnect(&self) -> Result<()> {
		if !self.shared.mark_disconnected() {
			return Err(Error::NotConnected);
		}
		self.poller.stop().await;
		self.shared.channel.send(endpoints::DISCONNECT, Vec::new()).await?;
		info!(target = "snap.session", "disconnected");
		Ok(())
	}

	pub fn is_connected(&self) -> bool {
		self.shared.is_connected()
	}

	/// Handshake facts.
	pub fn device(&self) -> &DeviceInfo {
		&self.shared.device
	}

	/// The gate motion operations go through.
	pub fn gate(&self) -> &MotionGate {
		&self.gate
	}

	/// Runs one refresh round now instead of waiting for the poller.
	pub async fn refresh(&self) -> Result<()> {
		aggregator::refresh(&self.shared).await
	}

	/// Copies the cached state.
	pub fn snapshot(&self) -> SessionSnapshot {
		self.shared.snapshot()
	}

	/// Whether the machine considers itself homed.
	pub fn homed(&self) -> bool {
		self.shared.lock().tool.homed
	}

	pub fn current_location(&self) -> Location {
		Location::of(&self.shared.lock().tool)
	}

	/// Progress of the loaded job, or `None` when nothing is loaded.
	pub fn running(&self) -> Option<JobProgress> {
		JobProgress::of(&self.shared.lock().tool)
	}

	/// True only when an enclosure is ready and its fan is stopped.
	pub fn enclosure_fan_not_running(&self) -> bool {
		let state = self.shared.lock();
		state.enclosure.is_ready && state.enclosure.fan == 0
	}

	/// Returns `(module_id, status)` of the module mounted at `key`.
	///
	/// The main tool head is mounted at key 1.
	pub fn tool_head(&self, key: i64) -> Result<(i64, bool)> {
		self.shared.lock().module_list.tool_head(key).ok_or(Error::NoKey)
	}

	pub fn module_list(&self) -> ModuleListing {
		self.shared.lock().module_list.clone()
	}

	pub fn modules(&self) -> ModuleInfo {
		self.shared.lock().modules.clone()
	}

	/// Logs every cached snapshot at info level.
	pub fn dump_state(&self) {
		let snapshot = self.snapshot();
		info!(target = "snap.session", device = ?snapshot.device, "device");
		info!(target = "snap.session", enclosure = ?snapshot.enclosure, "enclosure");
		for record in &snapshot.modules.module_info {
			info!(target = "snap.session", kind = ?record.kind(), %record, "module");
		}
		info!(target = "snap.session", module_list = ?snapshot.module_list.module_list, "module list");
		info!(target = "snap.session", tool = ?snapshot.tool, "tool");
		match JobProgress::of(&snapshot.tool) {
			Some(job) => info!(target = "snap.session", printing = job.is_printing(), "{job}"),
			None => info!(target = "snap.session", "nothing running"),
		}
	}

	/// Waits until the cached tool status equals `status`.
	///
	/// Re-checks after every refresh round.
	pub async fn await_status(&self, cancel: &CancellationToken, status: &str) -> Result<()> {
		loop {
			let refreshed = self.shared.refreshed.notified();
			{
				let state = self.shared.lock();
				if !state.connected {
					return Err(Error::NotConnected);
				}
				if state.tool.status == status {
					return Ok(());
				}
			}
			tokio::select! {
				biased;
				_ = cancel.cancelled() => return Err(Error::Canceled),
				_ = refreshed => {}
			}
		}
	}
}

impl Drop for Session {
	fn drop(&mut self) {
		if self.shared.mark_disconnected() {
			debug!(target = "snap.session", "session dropped without disconnect");
		}
	}
}

impl std::fmt::Debug for Session {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Session")
			.field("device", &self.shared.device)
			.field("connected", &self.is_connected())
			.finish_non_exhaustive()
	}
}

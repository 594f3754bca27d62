//! Shared session state and the read-side views over it.
//!
//! Every mutable field lives in one [`SessionState`] behind one
//! `parking_lot` mutex. The lock is only ever held for field reads and
//! writes, never across an `.await`.

use std::fmt;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use snap_protocol::{EnclosureSnapshot, ModuleInfo, ModuleListing, ToolSnapshot};
use snap_runtime::{Channel, Error, Result};
use tokio::sync::Notify;

/// Facts reported by the handshake; fixed for the life of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
	pub series: String,
	pub read_only: bool,
	pub head_type: i32,
	pub has_enclosure: bool,
}

/// Mutable part of a session.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
	pub(crate) connected: bool,
	pub(crate) busy: bool,
	/// Incremented on every gate grant so a stale permit cannot clear a newer one.
	pub(crate) grant: u64,
	pub(crate) tool: ToolSnapshot,
	pub(crate) enclosure: EnclosureSnapshot,
	pub(crate) modules: ModuleInfo,
	pub(crate) module_list: ModuleListing,
}

/// State shared between the session handle, the poller and gate permits.
pub(crate) struct Shared {
	pub(crate) channel: Channel,
	pub(crate) device: DeviceInfo,
	state: Mutex<SessionState>,
	/// Signaled when the motion gate is released or the session goes away.
	pub(crate) released: Notify,
	/// Signaled after every refresh round and when the session goes away.
	pub(crate) refreshed: Notify,
	/// Held for a whole refresh round, and by anything else that writes the
	/// tool snapshot, so an older round never lands over a newer write.
	pub(crate) rounds: tokio::sync::Mutex<()>,
}

impl Shared {
	pub(crate) fn new(channel: Channel, device: DeviceInfo) -> Self {
		Self {
			channel,
			device,
			state: Mutex::new(SessionState {
				connected: true,
				..SessionState::default()
			}),
			released: Notify::new(),
			refreshed: Notify::new(),
			rounds: tokio::sync::Mutex::new(()),
		}
	}

	pub(crate) fn lock(&self) -> MutexGuard<'_, SessionState> {
		self.state.lock()
	}

	pub(crate) fn is_connected(&self) -> bool {
		self.lock().connected
	}

	pub(crate) fn ensure_connected(&self) -> Result<()> {
		if self.is_connected() {
			Ok(())
		} else {
			Err(Error::NotConnected)
		}
	}

	/// Marks the session disconnected and wakes every waiter.
	///
	/// Returns false if it was already disconnected.
	pub(crate) fn mark_disconnected(&self) -> bool {
		let was_connected = std::mem::replace(&mut self.lock().connected, false);
		self.released.notify_waiters();
		self.refreshed.notify_waiters();
		was_connected
	}

	pub(crate) fn snapshot(&self) -> SessionSnapshot {
		let state = self.lock();
		SessionSnapshot {
			connected: state.connected,
			busy: state.busy,
			device: self.device.clone(),
			tool: state.tool.clone(),
			enclosure: state.enclosure.clone(),
			modules: state.modules.clone(),
			module_list: state.module_list.clone(),
		}
	}
}

/// Copy of every cached field, taken under the session lock.
///
/// Fields of different subsystems may come from different refresh rounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
	pub connected: bool,
	pub busy: bool,
	pub device: DeviceInfo,
	pub tool: ToolSnapshot,
	pub enclosure: EnclosureSnapshot,
	pub modules: ModuleInfo,
	pub module_list: ModuleListing,
}

/// Tool position and work offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Location {
	pub x: f64,
	pub y: f64,
	pub z: f64,
	pub offset_x: f64,
	pub offset_y: f64,
	pub offset_z: f64,
}

impl Location {
	pub(crate) fn of(tool: &ToolSnapshot) -> Self {
		Self {
			x: tool.x,
			y: tool.y,
			z: tool.z,
			offset_x: tool.offset_x,
			offset_y: tool.offset_y,
			offset_z: tool.offset_z,
		}
	}
}

impl fmt::Display for Location {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"({:.2},{:.2},{:.2}) offset=({:.2},{:.2},{:.2})",
			self.x, self.y, self.z, self.offset_x, self.offset_y, self.offset_z
		)
	}
}

/// Print status reported while a job is actively executing.
pub const PRINT_STATUS_PRINTING: &str = "Printing";

/// Progress of the job currently loaded on the machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobProgress {
	pub status: String,
	pub file_name: String,
	pub print_status: String,
	pub current_line: i64,
	pub total_lines: i64,
	pub elapsed: Duration,
	pub remaining: Duration,
}

impl JobProgress {
	/// Returns `None` when no job is loaded (`totalLines == 0`).
	pub(crate) fn of(tool: &ToolSnapshot) -> Option<Self> {
		if tool.total_lines == 0 {
			return None;
		}
		Some(Self {
			status: tool.status.clone(),
			file_name: tool.file_name.clone(),
			print_status: tool.print_status.clone(),
			current_line: tool.current_line,
			total_lines: tool.total_lines,
			elapsed: Duration::from_secs(tool.elapsed_time.max(0) as u64),
			remaining: Duration::from_secs(tool.remaining_time.max(0) as u64),
		})
	}

	/// Whole-number percentage of lines executed; 0 without a line count.
	pub fn percent(&self) -> i64 {
		(100 * self.current_line).checked_div(self.total_lines).unwrap_or(0)
	}

	pub fn is_printing(&self) -> bool {
		self.print_status == PRINT_STATUS_PRINTING
	}
}

/// Formats a duration as `1h02m03s`, dropping leading zero units.
pub fn format_duration(duration: Duration) -> String {
	let secs = duration.as_secs();
	let (h, m, s) = (secs / 3600, (secs / 60) % 60, secs % 60);
	match (h, m) {
		(0, 0) => format!("{s}s"),
		(0, _) => format!("{m}m{s:02}s"),
		_ => format!("{h}h{m:02}m{s:02}s"),
	}
}

impl fmt::Display for JobProgress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} {:?} {} {}/{} ({}%) {} elapsed, {} remaining",
			self.status,
			self.file_name,
			self.print_status,
			self.current_line,
			self.total_lines,
			self.percent(),
			format_duration(self.elapsed),
			format_duration(self.remaining),
		)
	}
}

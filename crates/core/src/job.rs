//! Job lifecycle: upload and start a program, pause, resume, stop.

use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use snap_protocol::endpoints;
use snap_runtime::{Result, Upload};
use tracing::info;

use crate::session::Session;

/// Tool head identifiers containing this marker carry a spindle.
const CNC_MARKER: &str = "_CNC_";

static ESTIMATE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?m)^;\s*estimated_time\(s\):\s*([0-9]+(?:\.[0-9]+)?)").unwrap());

/// Reads the run time a slicer recorded in a program header.
pub fn program_estimate(program: &str) -> Option<Duration> {
	let caps = ESTIMATE.captures(program)?;
	let secs: f64 = caps[1].parse().ok()?;
	Some(Duration::from_secs_f64(secs))
}

/// Program type the controller expects for a tool head identifier.
pub fn program_type(tool_head: &str) -> &'static str {
	if tool_head.contains(CNC_MARKER) { "CNC" } else { "Laser" }
}

impl Session {
	/// Uploads `program` and starts it.
	///
	/// Only the base name of `name` is sent. The job can then be paused,
	/// resumed or stopped.
	pub async fn run_program(&self, name: &str, program: Vec<u8>) -> Result<()> {
		self.shared.ensure_connected()?;
		let kind = program_type(&self.shared.lock().tool.tool_head);
		let file_name = Path::new(name)
			.file_name()
			.map(|n| n.to_string_lossy().into_owned())
			.unwrap_or_else(|| name.to_string());

		info!(target = "snap.session", file = %file_name, kind, bytes = program.len(), "uploading program");
		self.shared
			.channel
			.upload(
				endpoints::PREPARE_PRINT,
				vec![("type", kind.to_string())],
				Upload {
					field: "file",
					file_name: file_name.clone(),
					content_type: "application/octet-stream",
					bytes: program,
				},
			)
			.await?;

		self.shared.channel.send(endpoints::START_PRINT, Vec::new()).await?;
		info!(target = "snap.session", file = %file_name, "program started");
		Ok(())
	}

	pub async fn pause_program(&self) -> Result<()> {
		self.shared.ensure_connected()?;
		self.shared.channel.send(endpoints::PAUSE_PRINT, Vec::new()).await
	}

	/// Resumes a paused program where it stopped.
	pub async fn resume_program(&self) -> Result<()> {
		self.shared.ensure_connected()?;
		self.shared.channel.send(endpoints::RESUME_PRINT, Vec::new()).await
	}

	/// Terminates the current job.
	///
	/// The machine is left wherever the job stopped; re-home before moving.
	pub async fn stop_program(&self) -> Result<()> {
		self.shared.ensure_connected()?;
		self.shared.channel.send(endpoints::STOP_PRINT, Vec::new()).await
	}
}

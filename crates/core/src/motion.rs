//! Motion and laser operations.
//!
//! Each operation claims the motion gate for the whole G-code sequence it
//! sends, and gives it back on every exit path. Nothing is retried: the first
//! failed line ends the sequence.

use snap_protocol::endpoints;
use snap_runtime::{Error, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::gate::MotionPermit;
use crate::gcode;
use crate::session::Session;

impl Session {
	/// Sends one line of G-code outside the motion gate.
	pub async fn execute_code(&self, code: &str) -> Result<()> {
		self.shared.ensure_connected()?;
		debug!(target = "snap.session", code, "execute");
		self.shared
			.channel
			.send(endpoints::EXECUTE_CODE, vec![("code", code.to_string())])
			.await
	}

	/// Sends `codes` in order while `_permit` is held.
	async fn run_codes<S: AsRef<str>>(&self, _permit: &MotionPermit, codes: &[S]) -> Result<()> {
		for code in codes {
			self.execute_code(code.as_ref()).await?;
		}
		Ok(())
	}

	/// Homes all axes.
	pub async fn home(&self, cancel: &CancellationToken) -> Result<()> {
		let permit = self.gate.acquire(cancel).await?;
		self.run_codes(&permit, &gcode::HOME).await
	}

	/// Makes the current position the work origin.
	///
	/// The machine origin then shows up as the offset of
	/// [`current_location`](Session::current_location).
	pub async fn set_origin(&self, cancel: &CancellationToken) -> Result<()> {
		let permit = self.gate.acquire(cancel).await?;
		self.run_codes(&permit, &[gcode::SET_ORIGIN]).await
	}

	/// Moves the tool to the work origin.
	pub async fn go_to_origin(&self, cancel: &CancellationToken) -> Result<()> {
		let permit = self.gate.acquire(cancel).await?;
		let z = self.shared.lock().tool.z;
		self.run_codes(&permit, &gcode::go_to_origin(z)).await
	}

	/// Moves to an absolute position in work coordinates.
	///
	/// On success the cached position is updated without waiting for the
	/// next refresh. A round already in flight lands first.
	pub async fn move_to(&self, cancel: &CancellationToken, x: f64, y: f64, z: f64) -> Result<()> {
		let permit = self.gate.acquire(cancel).await?;
		self.run_codes(&permit, &[gcode::move_to(x, y, z)]).await?;
		let _round = self.shared.rounds.lock().await;
		let mut state = self.shared.lock();
		state.tool.x = x;
		state.tool.y = y;
		state.tool.z = z;
		Ok(())
	}

	/// Moves by a relative offset, then refreshes the cached state.
	///
	/// A failed refresh is logged; the move itself already succeeded.
	pub async fn step(&self, cancel: &CancellationToken, dx: f64, dy: f64, dz: f64) -> Result<()> {
		let permit = self.gate.acquire(cancel).await?;
		self.run_codes(&permit, &gcode::step(dx, dy, dz)).await?;
		if let Err(e) = self.refresh().await {
			warn!(target = "snap.session", error = %e, "refresh after step failed");
		}
		Ok(())
	}

	/// Turns the laser on at `power` percent as a low-power targeting spot.
	///
	/// `power` must lie in `0.0..=1.5`; zero turns the spot off.
	pub async fn laser_spot(&self, cancel: &CancellationToken, power: f64) -> Result<()> {
		if !(0.0..=gcode::MAX_SPOT_POWER).contains(&power) {
			return Err(Error::InvalidArgument(format!(
				"laser spot power {power} outside 0..={}",
				gcode::MAX_SPOT_POWER
			)));
		}
		let permit = self.gate.acquire(cancel).await?;
		self.run_codes(&permit, &[gcode::laser_spot(power)]).await
	}

	/// Switches the targeting cross hairs.
	pub async fn laser_cross_hairs(&self, cancel: &CancellationToken, enable: bool) -> Result<()> {
		let permit = self.gate.acquire(cancel).await?;
		self.run_codes(&permit, &[gcode::cross_hairs(enable)]).await
	}
}

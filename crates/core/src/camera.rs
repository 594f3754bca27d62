//! Camera capture on laser heads that carry one.
//!
//! Capturing moves the head to the capture position, so the request runs
//! under the motion gate. Fetching the stored image afterwards does not.

use snap_protocol::endpoints;
use snap_runtime::{Error, Result};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::session::Session;

/// Highest photo slot the controller stores.
pub const MAX_PHOTO_INDEX: u8 = 8;

/// Feed rate of the move to the capture position, in mm/min.
pub const CAPTURE_FEED_RATE: u32 = 3000;

/// JPEG quality requested from the controller.
pub const PHOTO_QUALITY: u32 = 31;

impl Session {
	/// Takes photo `index` at absolute position `(x, y, z)` and returns the JPEG.
	///
	/// # Errors
	///
	/// [`Error::NoCamera`] unless the tool head reports a camera,
	/// [`Error::InvalidArgument`] for an index above [`MAX_PHOTO_INDEX`].
	pub async fn snap_at_jpeg(
		&self,
		cancel: &CancellationToken,
		index: u8,
		x: f64,
		y: f64,
		z: f64,
	) -> Result<Vec<u8>> {
		if !self.shared.lock().tool.laser_camera {
			return Err(Error::NoCamera);
		}
		if index > MAX_PHOTO_INDEX {
			return Err(Error::InvalidArgument(format!(
				"photo index {index} outside 0..={MAX_PHOTO_INDEX}"
			)));
		}

		let permit = self.gate.acquire(cancel).await?;
		debug!(target = "snap.session", index, x, y, z, "capture");
		self.shared
			.channel
			.fetch(
				endpoints::REQUEST_CAPTURE_PHOTO,
				vec![
					("index", index.to_string()),
					("x", format!("{x:.3}")),
					("y", format!("{y:.3}")),
					("z", format!("{z:.3}")),
					("feedRate", CAPTURE_FEED_RATE.to_string()),
					("photoQuality", PHOTO_QUALITY.to_string()),
				],
			)
			.await?;
		permit.release();

		self.shared
			.channel
			.fetch(endpoints::GET_CAMERA_IMAGE, vec![("index", index.to_string())])
			.await
	}

	/// Takes photo `index` at the cached position.
	pub async fn snap_jpeg(&self, cancel: &CancellationToken, index: u8) -> Result<Vec<u8>> {
		let location = self.current_location();
		self.snap_at_jpeg(cancel, index, location.x, location.y, location.z)
			.await
	}
}

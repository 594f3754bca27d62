//! Enclosure fan and LED setters.

use snap_protocol::endpoints;
use snap_runtime::{Error, Result};
use tracing::debug;

use crate::session::Session;

fn percent(what: &str, value: i32) -> Result<String> {
	if (0..=100).contains(&value) {
		Ok(value.to_string())
	} else {
		Err(Error::InvalidArgument(format!("{what} {value}% outside 0..=100")))
	}
}

impl Session {
	/// Sets the enclosure fan to `speed` percent of its rated speed.
	pub async fn set_enclosure_fan(&self, speed: i32) -> Result<()> {
		let speed = percent("enclosure fan", speed)?;
		self.shared.ensure_connected()?;
		debug!(target = "snap.session", %speed, "enclosure fan");
		self.shared
			.channel
			.send(endpoints::ENCLOSURE, vec![("fan", speed)])
			.await
	}

	/// Sets the enclosure LED to `brightness` percent.
	pub async fn set_enclosure_led(&self, brightness: i32) -> Result<()> {
		let brightness = percent("enclosure LED", brightness)?;
		self.shared.ensure_connected()?;
		debug!(target = "snap.session", %brightness, "enclosure LED");
		self.shared
			.channel
			.send(endpoints::ENCLOSURE, vec![("led", brightness)])
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{FakeDevice, connect};

	#[tokio::test]
	async fn setters_post_percentages() {
		let device = FakeDevice::a350();
		let session = connect(&device).await;

		session.set_enclosure_fan(100).await.unwrap();
		session.set_enclosure_led(0).await.unwrap();

		let posts: Vec<_> = device
			.calls_to(endpoints::ENCLOSURE)
			.into_iter()
			.filter(|c| c.method == "POST")
			.collect();
		assert_eq!(posts.len(), 2);
		assert_eq!(posts[0].param("fan"), Some("100"));
		assert_eq!(posts[1].param("led"), Some("0"));
	}

	#[tokio::test]
	async fn out_of_range_is_rejected_locally() {
		let device = FakeDevice::a350();
		let session = connect(&device).await;
		device.clear_calls();

		assert!(matches!(session.set_enclosure_fan(101).await, Err(Error::InvalidArgument(_))));
		assert!(matches!(session.set_enclosure_led(-1).await, Err(Error::InvalidArgument(_))));
		assert!(device.calls().iter().all(|c| c.method == "GET"));
	}
}

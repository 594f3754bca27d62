//! Background refresh loop.
//!
//! One task per session runs a refresh round, then sleeps for the poll
//! interval, until its cancellation token fires. The result of the first
//! round is handed back to whoever spawned the poller; later failures are
//! logged and the last good snapshot stays in place.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use snap_runtime::{Error, Result};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregator;
use crate::state::Shared;

/// Handle to a session's refresh task. Dropping it cancels the task.
pub(crate) struct BackgroundPoller {
	cancel: CancellationToken,
	handle: Mutex<Option<JoinHandle<()>>>,
}

impl BackgroundPoller {
	/// Starts polling; the receiver yields the outcome of the first round.
	pub(crate) fn spawn(shared: Arc<Shared>, interval: Duration) -> (Self, oneshot::Receiver<Result<()>>) {
		let cancel = CancellationToken::new();
		let (first_tx, first_rx) = oneshot::channel();
		let handle = tokio::spawn(run(shared, interval, cancel.clone(), first_tx));
		let poller = Self {
			cancel,
			handle: Mutex::new(Some(handle)),
		};
		(poller, first_rx)
	}

	/// Cancels the task and waits for it to exit.
	///
	/// A round already in flight finishes its requests first.
	pub(crate) async fn stop(&self) {
		self.cancel.cancel();
		let handle = self.handle.lock().take();
		let Some(handle) = handle else {
			return;
		};
		if let Err(e) = handle.await {
			if e.is_panic() {
				warn!(target = "snap.poller", error = %e, "poller task panicked");
			}
		}
	}

	pub(crate) fn is_stopped(&self) -> bool {
		self.cancel.is_cancelled()
	}
}

impl Drop for BackgroundPoller {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}

async fn run(
	shared: Arc<Shared>,
	interval: Duration,
	cancel: CancellationToken,
	first: oneshot::Sender<Result<()>>,
) {
	let mut first = Some(first);
	let mut failures: u32 = 0;
	debug!(target = "snap.poller", interval_ms = interval.as_millis() as u64, "poller started");

	loop {
		let result = aggregator::refresh(&shared).await;

		if let Some(first) = first.take() {
			let _ = first.send(result);
		} else {
			match result {
				Ok(()) => {
					if failures > 0 {
						info!(target = "snap.poller", failures, "status refresh recovered");
						failures = 0;
					}
				}
				Err(Error::NotConnected) => break,
				Err(e) => {
					failures += 1;
					warn!(target = "snap.poller", failures, error = %e, "status refresh failed; keeping last snapshot");
				}
			}
		}

		tokio::select! {
			biased;
			_ = cancel.cancelled() => break,
			_ = tokio::time::sleep(interval) => {}
		}
	}

	debug!(target = "snap.poller", "poller stopped");
}

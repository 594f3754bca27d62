//! Motion admission gate.
//!
//! The machine has no command queue, so at most one motion or laser sequence
//! may be in flight per session. [`MotionGate::acquire`] grants a
//! [`MotionPermit`]; the gate stays busy until the permit is released or
//! dropped.

use std::sync::Arc;

use snap_runtime::{Error, Result};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::state::Shared;

/// Serializes actuation requests of one session.
#[derive(Clone)]
pub struct MotionGate {
	shared: Arc<Shared>,
}

impl MotionGate {
	pub(crate) fn new(shared: Arc<Shared>) -> Self {
		Self { shared }
	}

	/// Waits until the gate is free and claims it.
	///
	/// Fails with [`Error::Canceled`] without touching the gate when `cancel`
	/// has already fired, and with [`Error::NotConnected`] when the session
	/// is (or becomes) disconnected while waiting.
	pub async fn acquire(&self, cancel: &CancellationToken) -> Result<MotionPermit> {
		if cancel.is_cancelled() {
			return Err(Error::Canceled);
		}

		loop {
			// Registered before the check so a release in between is not lost.
			let released = self.shared.released.notified();

			{
				let mut state = self.shared.lock();
				if !state.connected {
					return Err(Error::NotConnected);
				}
				if !state.busy {
					state.busy = true;
					state.grant = state.grant.wrapping_add(1);
					trace!(target = "snap.gate", grant = state.grant, "acquired");
					return Ok(MotionPermit {
						shared: Arc::clone(&self.shared),
						grant: state.grant,
						released: false,
					});
				}
			}

			tokio::select! {
				biased;
				_ = cancel.cancelled() => return Err(Error::Canceled),
				_ = released => {}
			}
		}
	}

	/// Clears the busy flag regardless of who holds the gate.
	///
	/// Permits granted before this call become inert.
	pub fn release(&self) {
		let mut state = self.shared.lock();
		state.busy = false;
		state.grant = state.grant.wrapping_add(1);
		drop(state);
		self.shared.released.notify_waiters();
	}

	pub fn is_busy(&self) -> bool {
		self.shared.lock().busy
	}
}

impl std::fmt::Debug for MotionGate {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MotionGate")
			.field("busy", &self.is_busy())
			.finish()
	}
}

/// Exclusive right to actuate the machine; frees the gate on drop.
#[must_use = "the gate is released as soon as the permit is dropped"]
pub struct MotionPermit {
	shared: Arc<Shared>,
	grant: u64,
	released: bool,
}

impl MotionPermit {
	/// Frees the gate now rather than at the end of the scope.
	pub fn release(mut self) {
		self.release_inner();
	}

	fn release_inner(&mut self) {
		if std::mem::replace(&mut self.released, true) {
			return;
		}
		let mut state = self.shared.lock();
		if state.grant != self.grant {
			return;
		}
		state.busy = false;
		drop(state);
		trace!(target = "snap.gate", grant = self.grant, "released");
		self.shared.released.notify_waiters();
	}
}

impl Drop for MotionPermit {
	fn drop(&mut self) {
		self.release_inner();
	}
}

impl std::fmt::Debug for MotionPermit {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MotionPermit").field("grant", &self.grant).finish()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;

	use tokio::time::timeout;

	use super::*;
	use crate::testing::{FakeDevice, shared};

	fn gate() -> MotionGate {
		MotionGate::new(shared(&FakeDevice::a350(), true))
	}

	#[tokio::test]
	async fn second_acquire_waits_for_release() {
		let gate = gate();
		let cancel = CancellationToken::new();
		let permit = gate.acquire(&cancel).await.unwrap();
		assert!(gate.is_busy());

		let waiter = {
			let gate = gate.clone();
			let cancel = cancel.clone();
			tokio::spawn(async move { gate.acquire(&cancel).await })
		};
		tokio::time::sleep(Duration::from_millis(20)).await;
		assert!(!waiter.is_finished());

		permit.release();
		let second = timeout(Duration::from_millis(200), waiter)
			.await
			.expect("waiter should resume promptly")
			.unwrap()
			.unwrap();
		assert!(gate.is_busy());
		drop(second);
		assert!(!gate.is_busy());
	}

	#[tokio::test]
	async fn fired_cancel_leaves_gate_untouched() {
		let gate = gate();
		let cancel = CancellationToken::new();
		cancel.cancel();

		let err = gate.acquire(&cancel).await.unwrap_err();
		assert!(err.is_canceled());
		assert!(!gate.is_busy());
	}

	#[tokio::test]
	async fn cancel_while_waiting() {
		let gate = gate();
		let _held = gate.acquire(&CancellationToken::new()).await.unwrap();

		let cancel = CancellationToken::new();
		let waiter = {
			let gate = gate.clone();
			let cancel = cancel.clone();
			tokio::spawn(async move { gate.acquire(&cancel).await })
		};
		tokio::time::sleep(Duration::from_millis(10)).await;
		cancel.cancel();

		let err = waiter.await.unwrap().unwrap_err();
		assert!(err.is_canceled());
		assert!(gate.is_busy());
	}

	#[tokio::test]
	async fn disconnect_wakes_waiters() {
		let shared = shared(&FakeDevice::a350(), true);
		let gate = MotionGate::new(shared.clone());
		let _held = gate.acquire(&CancellationToken::new()).await.unwrap();

		let waiter = {
			let gate = gate.clone();
			tokio::spawn(async move { gate.acquire(&CancellationToken::new()).await })
		};
		tokio::time::sleep(Duration::from_millis(10)).await;
		shared.mark_disconnected();

		let err = timeout(Duration::from_millis(200), waiter)
			.await
			.unwrap()
			.unwrap()
			.unwrap_err();
		assert!(err.is_not_connected());
	}

	#[tokio::test]
	async fn forced_release_makes_old_permit_inert() {
		let gate = gate();
		let cancel = CancellationToken::new();
		let stale = gate.acquire(&cancel).await.unwrap();

		gate.release();
		let current = gate.acquire(&cancel).await.unwrap();
		drop(stale);
		assert!(gate.is_busy(), "stale permit must not free the newer grant");
		drop(current);
		assert!(!gate.is_busy());
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn permits_are_mutually_exclusive() {
		let gate = gate();
		let inside = Arc::new(AtomicUsize::new(0));
		let overlaps = Arc::new(AtomicUsize::new(0));

		let tasks: Vec<_> = (0..16)
			.map(|_| {
				let gate = gate.clone();
				let inside = inside.clone();
				let overlaps = overlaps.clone();
				tokio::spawn(async move {
					for _ in 0..10 {
						let permit = gate.acquire(&CancellationToken::new()).await.unwrap();
						if inside.fetch_add(1, Ordering::SeqCst) != 0 {
							overlaps.fetch_add(1, Ordering::SeqCst);
						}
						tokio::task::yield_now().await;
						inside.fetch_sub(1, Ordering::SeqCst);
						drop(permit);
					}
				})
			})
			.collect();
		for task in tasks {
			task.await.unwrap();
		}

		assert_eq!(overlaps.load(Ordering::SeqCst), 0);
		assert!(!gate.is_busy());
	}
}

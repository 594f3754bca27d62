//! snap: client sessions for a Snapmaker 2.0 A350 over its HTTP control API
//!
//! A [`Session`] keeps one authenticated connection to the machine, a cached
//! view of its state refreshed in the background, and a [`MotionGate`] that
//! lets at most one motion or laser sequence reach the hardware at a time.
//!
//! # Example
//!
//! ```ignore
//! use snap::{CancellationToken, SessionManager, SessionOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = SessionManager::new(SessionOptions::default())
//!         .connect("192.168.1.20", "0c5a1e4b")
//!         .await?;
//!
//!     let cancel = CancellationToken::new();
//!     if !session.homed() {
//!         session.home(&cancel).await?;
//!     }
//!     session.move_to(&cancel, 100.0, 80.0, 20.0).await?;
//!     println!("at {}", session.current_location());
//!
//!     session.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Layout
//!
//! - [`session`]: connect, disconnect and the readers over the cached state
//! - [`gate`]: motion admission
//! - [`aggregator`]: one concurrent refresh round over every subsystem
//! - [`motion`], [`camera`], [`job`], [`enclosure`]: operations on a session
//! - [`gcode`]: the G-code lines those operations send

pub mod aggregator;
pub mod camera;
pub mod enclosure;
pub mod gate;
pub mod gcode;
pub mod job;
pub mod motion;
pub mod options;
mod poller;
pub mod session;
mod state;

#[cfg(test)]
mod testing;

pub use aggregator::ESCALATION_ORDER;
pub use gate::{MotionGate, MotionPermit};
pub use job::program_estimate;
pub use options::SessionOptions;
pub use session::{Session, SessionManager};
pub use state::{DeviceInfo, JobProgress, Location, PRINT_STATUS_PRINTING, SessionSnapshot, format_duration};

pub use snap_protocol as protocol;
pub use snap_runtime::{Error, HttpTransport, Result, Subsystem, Transport};
pub use tokio_util::sync::CancellationToken;

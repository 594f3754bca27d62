//! Status aggregation: one refresh round over every reporting subsystem.
//!
//! The tool and module queries always run; the enclosure query only when the
//! handshake reported an enclosure. The queries run concurrently and are all
//! joined before [`refresh`] returns. Each one writes only its own snapshot,
//! so a failure in one subsystem never discards fresh data from another.
//!
//! Rounds never overlap: each holds [`Shared::rounds`] from its first request
//! to its last write.

use snap_protocol::{EnclosureSnapshot, ModuleInfo, ModuleListing, ToolSnapshot, endpoints};
use snap_runtime::{Error, Result, Subsystem};
use tracing::debug;

use crate::state::Shared;

/// Order in which failures of one round are reported; the first failed
/// subsystem in this list wins.
pub const ESCALATION_ORDER: [Subsystem; 3] = [Subsystem::Enclosure, Subsystem::Modules, Subsystem::Tool];

/// Runs one refresh round and signals waiters on [`Shared::refreshed`].
pub(crate) async fn refresh(shared: &Shared) -> Result<()> {
	let _round = shared.rounds.lock().await;
	shared.ensure_connected()?;

	let (tool, modules, enclosure) = tokio::join!(
		refresh_tool(shared),
		refresh_modules(shared),
		refresh_enclosure(shared),
	);
	shared.refreshed.notify_waiters();

	escalate([
		(Subsystem::Tool, tool),
		(Subsystem::Modules, modules),
		(Subsystem::Enclosure, enclosure),
	])
}

/// Fetches the mount-point listing; only done once per session.
pub(crate) async fn refresh_module_list(shared: &Shared) -> Result<()> {
	let listing: ModuleListing = shared
		.channel
		.query(endpoints::MODULE_LIST, Subsystem::ModuleList, Vec::new())
		.await?;
	shared.lock().module_list = listing;
	Ok(())
}

async fn refresh_tool(shared: &Shared) -> Result<()> {
	let tool: ToolSnapshot = shared
		.channel
		.query(endpoints::STATUS, Subsystem::Tool, Vec::new())
		.await?;
	shared.lock().tool = tool;
	Ok(())
}

async fn refresh_modules(shared: &Shared) -> Result<()> {
	let body = shared.channel.fetch(endpoints::MODULE_INFO, Vec::new()).await?;
	let modules = ModuleInfo::from_slice(&body)?;
	shared.lock().modules = modules;
	Ok(())
}

async fn refresh_enclosure(shared: &Shared) -> Result<()> {
	if !shared.device.has_enclosure {
		return Ok(());
	}
	let enclosure: EnclosureSnapshot = shared
		.channel
		.query(endpoints::ENCLOSURE, Subsystem::Enclosure, Vec::new())
		.await?;
	shared.lock().enclosure = enclosure;
	Ok(())
}

fn rank(subsystem: Subsystem) -> usize {
	ESCALATION_ORDER
		.iter()
		.position(|s| *s == subsystem)
		.unwrap_or(ESCALATION_ORDER.len())
}

fn escalate(results: [(Subsystem, Result<()>); 3]) -> Result<()> {
	let mut failures: Vec<(Subsystem, Error)> = results
		.into_iter()
		.filter_map(|(subsystem, result)| result.err().map(|e| (subsystem, e)))
		.collect();
	for (subsystem, error) in &failures {
		debug!(target = "snap.session", %subsystem, %error, "refresh query failed");
	}
	failures.sort_by_key(|(subsystem, _)| rank(*subsystem));
	match failures.into_iter().next() {
		Some((_, error)) => Err(error),
		None => Ok(()),
	}
}

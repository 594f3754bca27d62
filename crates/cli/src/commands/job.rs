use std::fs;
use std::path::Path;
use std::time::Duration;

use snap::protocol::{STATUS_IDLE, STATUS_RUNNING};
use snap::{JobProgress, format_duration, program_estimate};
use tracing::info;

use super::{CommandContext, Outcome};
use crate::error::Result;
use crate::output::{Artifact, ArtifactType, OutputFormat};
use crate::program;

/// How often `poll` reports progress.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(3);

pub async fn run(ctx: &CommandContext, file: &Path, poll: bool) -> Result<Outcome> {
	let data = fs::read(file)?;
	match program_estimate(&String::from_utf8_lossy(&data)) {
		Some(estimate) => info!(target = "snap.cli", estimate = %format_duration(estimate), "estimated run time"),
		None => info!(target = "snap.cli", "program carries no time estimate"),
	}

	ctx.session.run_program(&file.to_string_lossy(), data).await?;
	if !poll {
		return Ok(Outcome::message(format!("started {}", file.display())));
	}

	info!(target = "snap.cli", "waiting to start");
	ctx.session.await_status(&ctx.cancel, STATUS_RUNNING).await?;
	follow(ctx).await
}

/// Reports progress until the machine is idle again.
pub async fn follow(ctx: &CommandContext) -> Result<Outcome> {
	info!(target = "snap.cli", "waiting for idle");
	let idle = ctx.session.await_status(&ctx.cancel, STATUS_IDLE);
	tokio::pin!(idle);

	let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
	ticker.tick().await;
	let mut last: Option<JobProgress> = None;
	loop {
		tokio::select! {
			result = &mut idle => {
				result?;
				break;
			}
			_ = ticker.tick() => {
				let Some(job) = ctx.session.running() else { continue };
				report(ctx.format, &job);
				last = Some(job);
			}
		}
	}
	if last.is_some() && ctx.format == OutputFormat::Text {
		eprintln!();
	}

	info!(target = "snap.cli", "machine is idle");
	match last {
		Some(job) => Ok(Outcome::message(format!("idle after {job}"))),
		None => Ok(Outcome::message("idle")),
	}
}

fn report(format: OutputFormat, job: &JobProgress) {
	match format {
		OutputFormat::Text => eprint!("\r{job}\x1b[0K"),
		OutputFormat::Json => info!(target = "snap.cli", progress = %job, "running"),
	}
}

pub async fn pause(ctx: &CommandContext) -> Result<Outcome> {
	ctx.session.pause_program().await?;
	Ok(Outcome::message("paused"))
}

pub async fn resume(ctx: &CommandContext) -> Result<Outcome> {
	ctx.session.resume_program().await?;
	Ok(Outcome::message("resumed"))
}

pub async fn stop(ctx: &CommandContext) -> Result<Outcome> {
	ctx.session.stop_program().await?;
	Ok(Outcome::message("stopped"))
}

pub fn edit(file: &Path, ranges: &str) -> Result<Outcome> {
	let source = fs::read_to_string(file)?;
	let edited = program::comment_out(&source, ranges)?;
	let out = program::edited_name(file);
	fs::write(&out, &edited)?;
	info!(target = "snap.cli", from = %file.display(), to = %out.display(), ranges, "program edited");

	Ok(Outcome::message(format!("wrote {}", out.display()))
		.with_artifact(Artifact::new(ArtifactType::Program, out, edited.len())))
}

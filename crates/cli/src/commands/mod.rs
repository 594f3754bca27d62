mod camera;
mod job;
mod machine;
mod motion;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;
use snap::{CancellationToken, Location, Session, SessionManager, SessionOptions};
use tracing::{debug, info, warn};

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::{Artifact, OutputFormat, ResultBuilder, print_result};

/// What a command hands back for printing.
pub struct Outcome {
	pub data: serde_json::Value,
	pub artifacts: Vec<Artifact>,
}

impl Outcome {
	pub fn new(data: impl Serialize) -> Result<Self> {
		Ok(Self {
			data: serde_json::to_value(data)?,
			artifacts: Vec::new(),
		})
	}

	pub fn message(text: impl Into<String>) -> Self {
		Self {
			data: serde_json::Value::String(text.into()),
			artifacts: Vec::new(),
		}
	}

	pub fn with_artifact(mut self, artifact: Artifact) -> Self {
		self.artifacts.push(artifact);
		self
	}
}

/// Everything a connected command needs.
pub struct CommandContext {
	pub session: Session,
	pub cancel: CancellationToken,
	pub config: Config,
	pub config_path: PathBuf,
	pub format: OutputFormat,
}

pub async fn dispatch(cli: Cli) -> Result<()> {
	let started = Instant::now();
	let format = cli.format;
	let name = cli.command.name();

	if cli.command.is_offline() {
		let outcome = offline(cli.command)?;
		emit(name, outcome, format, started);
		return Ok(());
	}

	// Both flags make the config file optional.
	let config = if cli.address.is_some() && cli.token.is_some() {
		Config::load_or_default(&cli.config)?
	} else {
		Config::load(&cli.config)?
	};
	let (address, token) = config.endpoint(&cli.config, cli.address.as_deref(), cli.token.as_deref())?;

	let mut options = SessionOptions::default();
	if let Some(ms) = cli.poll_ms {
		options = options.with_poll_interval(Duration::from_millis(ms));
	}
	debug!(target = "snap.cli", %address, command = name, "connecting");
	let session = SessionManager::new(options).connect(&address, &token).await?;

	let cancel = CancellationToken::new();
	let interrupt = tokio::spawn({
		let cancel = cancel.clone();
		async move {
			if tokio::signal::ctrl_c().await.is_ok() {
				warn!(target = "snap.cli", "interrupted");
				cancel.cancel();
			}
		}
	});

	let ctx = CommandContext {
		session,
		cancel,
		config,
		config_path: cli.config,
		format,
	};
	let result = run(&ctx, cli.command).await;
	interrupt.abort();

	if let Err(err) = ctx.session.disconnect().await {
		warn!(target = "snap.cli", error = %err, "disconnect failed");
	}

	let outcome = result?;
	emit(name, outcome, format, started);
	Ok(())
}

fn offline(command: Commands) -> Result<Outcome> {
	match command {
		Commands::Edit { file, ranges } => job::edit(&file, &ranges),
		other => Err(CliError::InvalidInput(format!("{} needs a machine", other.name()))),
	}
}

async fn run(ctx: &CommandContext, command: Commands) -> Result<Outcome> {
	if command.needs_homing() && !ctx.session.homed() {
		return Err(CliError::NotHomed);
	}
	info!(target = "snap.cli", command = command.name(), "running");

	match command {
		Commands::Dump => machine::dump(ctx),
		Commands::Locate => machine::locate(ctx),
		Commands::Home => machine::home(ctx).await,
		Commands::Fan { percent } => machine::fan(ctx, percent).await,
		Commands::Led { percent } => machine::led(ctx, percent).await,
		Commands::Move { x, y, z } => motion::move_to(ctx, x, y, z).await,
		Commands::Nudge { dx, dy, dz } => motion::nudge(ctx, dx, dy, dz).await,
		Commands::Park => motion::park(ctx).await,
		Commands::Origin { action } => motion::origin(ctx, action).await,
		Commands::Spot { state, power } => motion::spot(ctx, state, power).await,
		Commands::Cross { state } => motion::cross(ctx, state).await,
		Commands::Photo { out } => camera::photo(ctx, &out).await,
		Commands::Snap { out } => camera::snap(ctx, &out).await,
		Commands::Circle {
			center,
			radius,
			count,
			prefix,
		} => camera::circle(ctx, center, radius, count, &prefix).await,
		Commands::Zoom {
			center,
			zd,
			count,
			prefix,
		} => camera::zoom(ctx, center, zd, count, &prefix).await,
		Commands::SetCameraOffset { x, y, z } => camera::set_camera_offset(ctx, [x, y, z]),
		Commands::Run { file, poll } => job::run(ctx, &file, poll).await,
		Commands::Poll => job::follow(ctx).await,
		Commands::Pause => job::pause(ctx).await,
		Commands::Resume => job::resume(ctx).await,
		Commands::Stop => job::stop(ctx).await,
		Commands::Edit { file, ranges } => job::edit(&file, &ranges),
	}
}

fn emit(command: &str, outcome: Outcome, format: OutputFormat, started: Instant) {
	let result = ResultBuilder::new(command)
		.started_at(started)
		.data(outcome.data)
		.artifacts(outcome.artifacts)
		.build();
	print_result(&result, format);
}

/// Reports a position: `at (x,y,z) offset=(..)` in text, the fields in JSON.
fn at(ctx: &CommandContext, location: Location) -> Result<Outcome> {
	match ctx.format {
		OutputFormat::Text => Ok(Outcome::message(format!("at {location}"))),
		OutputFormat::Json => Outcome::new(location),
	}
}

/// Mounted tool head as reported by the controller module list.
fn tool_head(ctx: &CommandContext) -> Result<(i64, &'static str)> {
	let (id, ok) = ctx.session.tool_head(1)?;
	if !ok {
		warn!(target = "snap.cli", tool = id, "tool head reports a fault");
	}
	Ok((id, snap::protocol::module_name(id).unwrap_or("unknown")))
}

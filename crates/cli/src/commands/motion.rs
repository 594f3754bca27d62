use snap::Location;
use snap::protocol::STATUS_IDLE;
use tracing::info;

use super::{CommandContext, Outcome, at};
use crate::cli::{OriginAction, Switch};
use crate::error::{CliError, Result};

/// Tool change position, relative to the work origin offset.
const PARK_FROM_OFFSET: [f64; 3] = [179.0, 327.0, 156.5];

pub async fn move_to(ctx: &CommandContext, x: Option<f64>, y: Option<f64>, z: Option<f64>) -> Result<Outcome> {
	let here = ctx.session.current_location();
	let (x, y, z) = (x.unwrap_or(here.x), y.unwrap_or(here.y), z.unwrap_or(here.z));
	ctx.session.move_to(&ctx.cancel, x, y, z).await?;
	at(ctx, ctx.session.current_location())
}

pub async fn nudge(ctx: &CommandContext, dx: f64, dy: f64, dz: f64) -> Result<Outcome> {
	if dx == 0.0 && dy == 0.0 && dz == 0.0 {
		return Err(CliError::InvalidInput("nothing to nudge; pass --dx, --dy or --dz".into()));
	}
	ctx.session.step(&ctx.cancel, dx, dy, dz).await?;
	at(ctx, ctx.session.current_location())
}

/// Target for `park`, or `None` when it would put the head below zero.
pub(crate) fn park_position(location: &Location) -> Option<(f64, f64, f64)> {
	let [px, py, pz] = PARK_FROM_OFFSET;
	let target = (location.offset_x + px, location.offset_y + py, location.offset_z + pz);
	(target.2 >= 0.0).then_some(target)
}

pub async fn park(ctx: &CommandContext) -> Result<Outcome> {
	let here = ctx.session.current_location();
	let Some((x, y, z)) = park_position(&here) else {
		return Err(CliError::InvalidInput(format!(
			"parking from offset z={:.2} would go below zero; use `snap nudge` instead",
			here.offset_z
		)));
	};
	info!(target = "snap.cli", x, y, z, "parking");
	ctx.session.move_to(&ctx.cancel, x, y, z).await?;
	at(ctx, ctx.session.current_location())
}

pub async fn origin(ctx: &CommandContext, action: OriginAction) -> Result<Outcome> {
	match action {
		OriginAction::Set => {
			info!(target = "snap.cli", was = %ctx.session.current_location(), "setting origin");
			ctx.session.set_origin(&ctx.cancel).await?;
			ctx.session.await_status(&ctx.cancel, STATUS_IDLE).await?;
			ctx.session.refresh().await?;
		}
		OriginAction::Goto => ctx.session.go_to_origin(&ctx.cancel).await?,
	}
	at(ctx, ctx.session.current_location())
}

pub async fn spot(ctx: &CommandContext, state: Switch, power: f64) -> Result<Outcome> {
	let power = if state.is_on() { power } else { 0.0 };
	ctx.session.laser_spot(&ctx.cancel, power).await?;
	Ok(Outcome::message(if state.is_on() {
		format!("laser spot on at {power}%")
	} else {
		"laser spot off".to_string()
	}))
}

pub async fn cross(ctx: &CommandContext, state: Switch) -> Result<Outcome> {
	ctx.session.laser_cross_hairs(&ctx.cancel, state.is_on()).await?;
	Ok(Outcome::message(if state.is_on() {
		"cross hairs on"
	} else {
		"cross hairs off"
	}))
}

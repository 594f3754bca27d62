use serde_json::json;
use tracing::{info, warn};

use super::{CommandContext, Outcome, at, tool_head};
use crate::error::Result;

pub fn dump(ctx: &CommandContext) -> Result<Outcome> {
	ctx.session.dump_state();
	let (id, name) = tool_head(ctx)?;
	let tool_config = ctx.config.tools.get(&id).copied().unwrap_or_default();
	info!(target = "snap.cli", tool = id, tool_name = name, ?tool_config, "tool head");

	Outcome::new(json!({
		"snapshot": ctx.session.snapshot(),
		"toolHead": { "id": id, "name": name },
		"toolConfig": tool_config.camera_delta.map(|d| json!({ "cameraDelta": d })),
	}))
}

pub fn locate(ctx: &CommandContext) -> Result<Outcome> {
	at(ctx, ctx.session.current_location())
}

pub async fn home(ctx: &CommandContext) -> Result<Outcome> {
	ctx.session.home(&ctx.cancel).await?;
	if ctx.session.enclosure_fan_not_running() {
		warn!(target = "snap.cli", "homed, but the enclosure fan is off; start it with `snap fan`");
	}
	Ok(Outcome::message("homed"))
}

pub async fn fan(ctx: &CommandContext, percent: i32) -> Result<Outcome> {
	ctx.session.set_enclosure_fan(percent).await?;
	Ok(Outcome::message(format!("enclosure fan at {percent}%")))
}

pub async fn led(ctx: &CommandContext, percent: i32) -> Result<Outcome> {
	ctx.session.set_enclosure_led(percent).await?;
	Ok(Outcome::message(format!("enclosure LED at {percent}%")))
}

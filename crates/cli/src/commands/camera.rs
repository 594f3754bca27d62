use std::f64::consts::TAU;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::{CommandContext, Outcome, tool_head};
use crate::cli::Center;
use crate::error::{CliError, Result};
use crate::output::{Artifact, ArtifactType};

/// Tool heads whose camera offset can be recorded.
const CAMERA_TOOL_HEADS: [i64; 1] = [2];

fn save_photo(path: &Path, jpeg: &[u8]) -> Result<Artifact> {
	fs::write(path, jpeg)?;
	info!(target = "snap.cli", path = %path.display(), bytes = jpeg.len(), "photo saved");
	Ok(Artifact::new(ArtifactType::Photo, path, jpeg.len()))
}

pub async fn photo(ctx: &CommandContext, out: &Path) -> Result<Outcome> {
	let jpeg = ctx.session.snap_jpeg(&ctx.cancel, 0).await?;
	let artifact = save_photo(out, &jpeg)?;
	Ok(Outcome::message(format!("photo at {}", ctx.session.current_location())).with_artifact(artifact))
}

/// Moves the camera over the spot under the tool, photographs it and moves
/// the head back.
pub async fn snap(ctx: &CommandContext, out: &Path) -> Result<Outcome> {
	let (tool, name) = tool_head(ctx)?;
	let [dx, dy, dz] = ctx
		.config
		.camera_delta(tool)
		.ok_or_else(|| CliError::NoCameraOffset {
			tool_head: format!("{tool} ({name})"),
		})?;

	let here = ctx.session.current_location();
	let (x, y, z) = (here.x + dx, here.y + dy, here.z + dz);
	let jpeg = ctx.session.snap_at_jpeg(&ctx.cancel, 0, x, y, z).await?;
	let artifact = save_photo(out, &jpeg)?;
	ctx.session.move_to(&ctx.cancel, here.x, here.y, here.z).await?;

	Ok(Outcome::message(format!("snapped ({x:.2},{y:.2},{z:.2}), back at {here}")).with_artifact(artifact))
}

/// Capture points spaced evenly on a circle in the XY plane.
pub(crate) fn circle_points(center: (f64, f64, f64), radius: f64, count: u8) -> Vec<(f64, f64, f64)> {
	let (cx, cy, cz) = center;
	(0..count)
		.map(|i| {
			let theta = f64::from(i) / f64::from(count) * TAU;
			(cx + radius * theta.cos(), cy + radius * theta.sin(), cz)
		})
		.collect()
}

/// Capture points lowered by `zd` per shot, starting at `center`.
pub(crate) fn zoom_points(center: (f64, f64, f64), zd: f64, count: u8) -> Vec<(f64, f64, f64)> {
	let (cx, cy, cz) = center;
	(0..count).map(|i| (cx, cy, cz - f64::from(i) * zd)).collect()
}

fn resolve(ctx: &CommandContext, center: Center) -> (f64, f64, f64) {
	let here = ctx.session.current_location();
	(
		center.x.unwrap_or(here.x),
		center.y.unwrap_or(here.y),
		center.z.unwrap_or(here.z),
	)
}

async fn series(ctx: &CommandContext, points: Vec<(f64, f64, f64)>, prefix: &str) -> Result<Outcome> {
	let mut outcome = Outcome::message(format!("{} photos", points.len()));
	for (index, (x, y, z)) in (0u8..).zip(points) {
		info!(target = "snap.cli", index, x, y, z, "taking photo");
		let jpeg = ctx.session.snap_at_jpeg(&ctx.cancel, index, x, y, z).await?;
		let path = PathBuf::from(format!("{prefix}{index}.jpg"));
		outcome = outcome.with_artifact(save_photo(&path, &jpeg)?);
	}
	Ok(outcome)
}

pub async fn circle(ctx: &CommandContext, center: Center, radius: f64, count: u8, prefix: &str) -> Result<Outcome> {
	let points = circle_points(resolve(ctx, center), radius, count);
	series(ctx, points, prefix).await
}

pub async fn zoom(ctx: &CommandContext, center: Center, zd: f64, count: u8, prefix: &str) -> Result<Outcome> {
	let points = zoom_points(resolve(ctx, center), zd, count);
	series(ctx, points, prefix).await
}

/// Records the head displacement that centers the camera for the mounted tool.
pub fn set_camera_offset(ctx: &CommandContext, delta: [f64; 3]) -> Result<Outcome> {
	let (tool, name) = tool_head(ctx)?;
	if !CAMERA_TOOL_HEADS.contains(&tool) {
		return Err(CliError::InvalidInput(format!("tool head {tool} ({name}) has no supported camera")));
	}

	let mut config = ctx.config.clone();
	config.set_camera_delta(tool, delta);
	config.save(&ctx.config_path)?;
	info!(target = "snap.cli", tool, ?delta, config = %ctx.config_path.display(), "camera offset saved");

	let size = fs::metadata(&ctx.config_path).map(|m| m.len() as usize).unwrap_or_default();
	Ok(
		Outcome::message(format!("camera offset for {name} set to {delta:?}"))
			.with_artifact(Artifact::new(ArtifactType::Config, &ctx.config_path, size)),
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn close(a: (f64, f64, f64), b: (f64, f64, f64)) -> bool {
		(a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9 && (a.2 - b.2).abs() < 1e-9
	}

	#[test]
	fn circle_starts_on_positive_x() {
		let points = circle_points((100.0, 50.0, 20.0), 15.0, 4);
		assert_eq!(points.len(), 4);
		assert!(close(points[0], (115.0, 50.0, 20.0)));
		assert!(close(points[1], (100.0, 65.0, 20.0)));
		assert!(close(points[2], (85.0, 50.0, 20.0)));
		assert!(close(points[3], (100.0, 35.0, 20.0)));
	}

	#[test]
	fn zoom_lowers_each_shot() {
		let points = zoom_points((1.0, 2.0, 10.0), 2.5, 3);
		assert_eq!(points, vec![(1.0, 2.0, 10.0), (1.0, 2.0, 7.5), (1.0, 2.0, 5.0)]);
	}
}

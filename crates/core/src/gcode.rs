//! G-code lines for the motions a session issues.
//!
//! Coordinates are formatted with two decimals; the controller accepts
//! nothing finer for rapid moves.

/// Feed rate of every rapid move, in mm/min.
pub const RAPID_FEED_RATE: u32 = 1500;

/// Highest laser power, in percent, accepted for a targeting spot.
pub const MAX_SPOT_POWER: f64 = 1.5;

/// Select machine coordinates, then home all axes.
pub const HOME: [&str; 2] = ["G53", "G28"];

/// Make the current position the work origin.
pub const SET_ORIGIN: &str = "G92 X0 Y0 Z0";

/// Return to the work origin without dragging the tool across the work.
///
/// Below the origin plane Z is raised first, otherwise XY move first.
pub fn go_to_origin(z: f64) -> [String; 2] {
	if z < 0.0 {
		[format!("G0 F{RAPID_FEED_RATE} Z0"), "G0 X0 Y0".to_string()]
	} else {
		[format!("G0 F{RAPID_FEED_RATE} X0 Y0"), "G0 Z0".to_string()]
	}
}

/// Rapid move to an absolute position.
pub fn move_to(x: f64, y: f64, z: f64) -> String {
	format!("G0 F{RAPID_FEED_RATE} X{x:.2} Y{y:.2} Z{z:.2}")
}

/// Relative rapid move, wrapped in relative/absolute mode switches.
pub fn step(dx: f64, dy: f64, dz: f64) -> [String; 3] {
	["G91".to_string(), move_to(dx, dy, dz), "G90".to_string()]
}

/// Laser on at `power` percent, as an 8-bit PWM value.
pub fn laser_spot(power: f64) -> String {
	format!("M3 P{} S{:.2}", power.trunc() as i64, 255.0 * (power / 100.0))
}

/// Toggle the targeting cross hairs.
pub fn cross_hairs(enable: bool) -> String {
	format!("M2002 T3 P{}", u8::from(enable))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn origin_order_depends_on_depth() {
		assert_eq!(go_to_origin(-2.0), ["G0 F1500 Z0", "G0 X0 Y0"]);
		assert_eq!(go_to_origin(0.0), ["G0 F1500 X0 Y0", "G0 Z0"]);
	}

	#[test]
	fn moves_use_two_decimals() {
		assert_eq!(move_to(10.0, -3.456, 0.5), "G0 F1500 X10.00 Y-3.46 Z0.50");
		assert_eq!(step(1.0, 0.0, -0.25), ["G91", "G0 F1500 X1.00 Y0.00 Z-0.25", "G90"]);
	}

	#[test]
	fn laser_codes() {
		assert_eq!(laser_spot(1.0), "M3 P1 S2.55");
		assert_eq!(laser_spot(1.2), "M3 P1 S3.06");
		assert_eq!(laser_spot(0.0), "M3 P0 S0.00");
		assert_eq!(cross_hairs(true), "M2002 T3 P1");
		assert_eq!(cross_hairs(false), "M2002 T3 P0");
	}
}

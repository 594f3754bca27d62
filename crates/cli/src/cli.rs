use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::output::OutputFormat;

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG: &str = "snapmaker.config";

#[derive(Parser, Debug)]
#[command(name = "snap")]
#[command(about = "Drive a Snapmaker 2.0 A350 over its network API")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: text (default) or json
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Configuration file holding the address, token and camera offsets
	#[arg(long, global = true, value_name = "FILE", default_value = DEFAULT_CONFIG)]
	pub config: PathBuf,

	/// Machine address (host or http:// URL); overrides the config file
	#[arg(long, global = true, value_name = "ADDR")]
	pub address: Option<String>,

	/// Access token; overrides the config file
	#[arg(long, global = true, value_name = "TOKEN")]
	pub token: Option<String>,

	/// Milliseconds between status refreshes (at least 10)
	#[arg(long, global = true, value_name = "MS", value_parser = clap::value_parser!(u64).range(10..))]
	pub poll_ms: Option<u64>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Switch {
	On,
	Off,
}

impl Switch {
	pub fn is_on(self) -> bool {
		self == Switch::On
	}
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginAction {
	/// Make the current position the work origin
	Set,
	/// Move to the work origin
	Goto,
}

/// Position for multi-photo commands; omitted axes use the current position.
#[derive(Args, Debug, Clone, Copy, Default, PartialEq)]
pub struct Center {
	#[arg(long, allow_hyphen_values = true)]
	pub x: Option<f64>,
	#[arg(long, allow_hyphen_values = true)]
	pub y: Option<f64>,
	#[arg(long, allow_hyphen_values = true)]
	pub z: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Log every cached snapshot and print the session state
	Dump,

	/// Print the current position and work offset
	Locate,

	/// Home all axes
	Home,

	/// Set the enclosure fan speed in percent
	Fan {
		#[arg(value_parser = clap::value_parser!(i32).range(0..=100))]
		percent: i32,
	},

	/// Set the enclosure LED brightness in percent
	Led {
		#[arg(value_parser = clap::value_parser!(i32).range(0..=100))]
		percent: i32,
	},

	/// Move to an absolute position; omitted axes keep their value
	#[command(alias = "mv")]
	Move {
		#[arg(long, allow_hyphen_values = true)]
		x: Option<f64>,
		#[arg(long, allow_hyphen_values = true)]
		y: Option<f64>,
		#[arg(long, allow_hyphen_values = true)]
		z: Option<f64>,
	},

	/// Move by a relative offset
	Nudge {
		#[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
		dx: f64,
		#[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
		dy: f64,
		#[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
		dz: f64,
	},

	/// Move the head to the tool change position relative to the work origin
	Park,

	/// Set or go to the work origin
	Origin {
		#[command(subcommand)]
		action: OriginAction,
	},

	/// Switch the low-power laser targeting spot
	Spot {
		#[arg(value_enum)]
		state: Switch,
		/// Laser power in percent (at most 1.5)
		#[arg(long, default_value_t = 1.0)]
		power: f64,
	},

	/// Switch the targeting cross hairs
	Cross {
		#[arg(value_enum)]
		state: Switch,
	},

	/// Photograph the work at the current head position
	Photo {
		#[arg(short, long, value_name = "FILE", default_value = "photo.jpg")]
		out: PathBuf,
	},

	/// Photograph the spot under the tool using the configured camera offset, then return
	Snap {
		#[arg(short, long, value_name = "FILE", default_value = "photo.jpg")]
		out: PathBuf,
	},

	/// Photograph points on a circle around a center position
	Circle {
		#[command(flatten)]
		center: Center,
		#[arg(long, default_value_t = 15.0)]
		radius: f64,
		/// Number of photos (at most 9)
		#[arg(long, default_value_t = 9, value_parser = clap::value_parser!(u8).range(1..=9))]
		count: u8,
		/// Output file prefix; photos are written as PREFIXN.jpg
		#[arg(long, default_value = "photo")]
		prefix: String,
	},

	/// Photograph a position from a series of heights, lowering by --zd each shot
	Zoom {
		#[command(flatten)]
		center: Center,
		#[arg(long, default_value_t = 1.0)]
		zd: f64,
		/// Number of photos (at most 9)
		#[arg(long, default_value_t = 9, value_parser = clap::value_parser!(u8).range(1..=9))]
		count: u8,
		/// Output file prefix; photos are written as PREFIXN.jpg
		#[arg(long, default_value = "photo")]
		prefix: String,
	},

	/// Record the camera offset of the mounted tool head in the config file
	SetCameraOffset {
		#[arg(long, allow_hyphen_values = true)]
		x: f64,
		#[arg(long, allow_hyphen_values = true)]
		y: f64,
		#[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
		z: f64,
	},

	/// Upload a program and start it
	Run {
		file: PathBuf,
		/// Follow progress until the job finishes
		#[arg(long)]
		poll: bool,
	},

	/// Follow progress of the running job
	Poll,

	/// Pause the running job
	Pause,

	/// Resume a paused job
	Resume,

	/// Stop the running job
	Stop,

	/// Comment out line ranges of a program into edited-<name>
	Edit {
		file: PathBuf,
		/// Comma separated 1-based ranges: `n`, `n-m` or `n-`
		ranges: String,
	},
}

impl Commands {
	/// Name used in output envelopes.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Dump => "dump",
			Commands::Locate => "locate",
			Commands::Home => "home",
			Commands::Fan { .. } => "fan",
			Commands::Led { .. } => "led",
			Commands::Move { .. } => "move",
			Commands::Nudge { .. } => "nudge",
			Commands::Park => "park",
			Commands::Origin { .. } => "origin",
			Commands::Spot { .. } => "spot",
			Commands::Cross { .. } => "cross",
			Commands::Photo { .. } => "photo",
			Commands::Snap { .. } => "snap",
			Commands::Circle { .. } => "circle",
			Commands::Zoom { .. } => "zoom",
			Commands::SetCameraOffset { .. } => "set-camera-offset",
			Commands::Run { .. } => "run",
			Commands::Poll => "poll",
			Commands::Pause => "pause",
			Commands::Resume => "resume",
			Commands::Stop => "stop",
			Commands::Edit { .. } => "edit",
		}
	}

	/// Commands that move the head or fire the laser refuse to run unhomed.
	pub fn needs_homing(&self) -> bool {
		matches!(
			self,
			Commands::Move { .. }
				| Commands::Nudge { .. }
				| Commands::Park
				| Commands::Origin { .. }
				| Commands::Spot { .. }
				| Commands::Cross { .. }
				| Commands::Photo { .. }
				| Commands::Snap { .. }
				| Commands::Circle { .. }
				| Commands::Zoom { .. }
		)
	}

	/// Commands that work on local files only.
	pub fn is_offline(&self) -> bool {
		matches!(self, Commands::Edit { .. })
	}
}

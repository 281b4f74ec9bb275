//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use heading_core::CommandKind;
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "heading", version, about = "Marker-approach robot navigation hub")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/heading.toml")]
    pub config: PathBuf,

    /// Persisted operator settings (overlay on top of the config)
    #[arg(long, value_name = "FILE", default_value = "etc/settings.toml")]
    pub settings: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

fn parse_command(s: &str) -> Result<CommandKind, String> {
    s.parse()
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the approach-and-align loop against recorded detections
    Run {
        /// JSON-lines detection file, one frame per line
        #[arg(long, value_name = "FILE")]
        replay: PathBuf,
        /// Override vision.fps for replay pacing
        #[arg(long, value_name = "FPS")]
        fps: Option<u32>,
        /// Stop after this many completed approach+align cycles
        #[arg(long, value_name = "N")]
        cycles: Option<u64>,
        /// Use the simulated robot instead of HTTP
        #[arg(long, action = ArgAction::SetTrue)]
        simulate: bool,
        /// Restart the replay file when it ends
        #[arg(long = "loop", action = ArgAction::SetTrue)]
        looping: bool,
    },
    /// Send one motor command and print the robot's reply
    Send {
        /// FORWARD | BACKWARD | LEFT | RIGHT | STOP
        #[arg(value_parser = parse_command, value_name = "COMMAND")]
        command: CommandKind,
        /// Left motor power override (0-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        left: Option<u8>,
        /// Right motor power override (0-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        right: Option<u8>,
        /// Use the simulated robot instead of HTTP
        #[arg(long, action = ArgAction::SetTrue)]
        simulate: bool,
    },
    /// Show how long the robot would drive forward for a distance
    Duration {
        /// Distance in meters
        #[arg(long, value_name = "METERS", allow_negative_numbers = true)]
        distance: f64,
    },
    /// Inspect or change operator settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Validate configuration and settings
    SelfCheck,
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Print every setting
    List,
    /// Print one setting
    Get { key: String },
    /// Change one setting and persist it
    Set {
        key: String,
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
}

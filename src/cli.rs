//! Command-line interface for the `keyheat` binary.

use crate::logging::Verbosity;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// keyheat - Keypress heatmaps for ZMK split keyboards
///
/// Collects key presses from the firmware's USB debug log, aggregates them
/// per key position and renders the counts onto the physical layout.
#[derive(Debug, Parser)]
#[command(name = "keyheat")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the layout config from a ZMK keymap
    Layout(LayoutCommand),

    /// Record key presses from the keyboard's serial log
    Collect(CollectCommand),

    /// Aggregate a saved debug log instead of a live device
    Replay(ReplayCommand),

    /// Render a session data file to PNG
    Render(RenderCommand),

    /// Generate a synthetic session
    Demo(DemoCommand),
}

#[derive(Debug, Args)]
pub struct LayoutCommand {
    /// ZMK .keymap file to read
    #[arg(short, long, value_name = "FILE")]
    pub keymap: Option<PathBuf>,

    /// Where to write the layout config JSON
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CollectCommand {
    /// Serial device the keyboard logs to
    #[arg(short, long, value_name = "PATH")]
    pub device: Option<PathBuf>,

    /// Where to write the session data
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Stop after this many seconds
    #[arg(long, value_name = "SECS")]
    pub duration: Option<u64>,

    /// Serial line speed
    #[arg(short, long)]
    pub baud_rate: Option<u32>,
}

#[derive(Debug, Args)]
pub struct ReplayCommand {
    /// Log file to read, or `-` for stdin
    #[arg(short, long, value_name = "FILE")]
    pub log: PathBuf,

    /// Where to write the session data
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RenderCommand {
    /// Session data JSON
    #[arg(short, long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Layout config JSON
    #[arg(short, long, value_name = "FILE")]
    pub layout: Option<PathBuf>,

    /// Output PNG
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Colormap name
    #[arg(long)]
    pub colormap: Option<String>,

    /// Image title
    #[arg(short, long)]
    pub title: Option<String>,
}

#[derive(Debug, Args)]
pub struct DemoCommand {
    /// Where to write the generated session data
    #[arg(short, long, value_name = "FILE", default_value = "data/demo_keypress_data.json")]
    pub output: PathBuf,

    /// Number of simulated key presses
    #[arg(short, long, default_value_t = crate::demo::DEFAULT_KEYPRESSES)]
    pub keypresses: u64,

    /// Random seed; defaults to a time-based seed
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Also render the generated session
    #[arg(short, long)]
    pub render: bool,
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

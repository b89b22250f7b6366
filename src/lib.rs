//! Keyboard Heatmap - keypress heatmaps for ZMK split keyboards
//!
//! Reads the firmware's USB debug log, counts presses per key position and
//! renders the counts onto the keyboard's physical layout as a PNG.
//!
//! The pipeline has three stages:
//! - [`keyboard`]: physical layout, keymap parsing and log line decoding
//! - [`collector`]: turning a stream of log lines into a [`report::SessionSummary`]
//! - [`heatmap`]: placing a session on the layout grid and drawing it

pub mod cli;
pub mod collector;
pub mod config;
pub mod demo;
pub mod error;
pub mod heatmap;
pub mod keyboard;
pub mod logging;
pub mod report;

pub use config::Config;
pub use error::{HeatmapError, Result};

//! Error types for keyboard heatmap operations

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, HeatmapError>;

/// The main error type for layout, collection and rendering operations.
#[derive(Error, Debug)]
pub enum HeatmapError {
    /// A referenced file or device does not exist.
    #[error("{kind} not found: {}", path.display())]
    InputMissing {
        /// What was being looked for ("keymap file", "device", ...)
        kind: &'static str,
        /// Path that was checked
        path: PathBuf,
    },

    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Encoding or writing the heatmap image failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The requested colormap name is not known.
    #[error("unknown colormap '{name}' (available: {available})")]
    UnknownColormap {
        /// Name that was requested
        name: String,
        /// Comma-separated list of valid names
        available: String,
    },

    /// The serial device could not be opened or configured.
    #[error("device error on {}: {message}", path.display())]
    Device {
        /// Device path
        path: PathBuf,
        /// Description of what went wrong
        message: String,
    },

    /// Demo key weights could not form a distribution.
    #[error("demo weights: {0}")]
    Weights(#[from] rand::distributions::WeightedError),

    /// Configuration could not be loaded or saved.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl HeatmapError {
    /// Build an input-missing error.
    pub fn missing(kind: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::InputMissing {
            kind,
            path: path.into(),
        }
    }

    /// Whether this error means a referenced input was absent
    pub fn is_input_missing(&self) -> bool {
        matches!(self, Self::InputMissing { .. })
    }
}

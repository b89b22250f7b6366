//! Configuration management for Keyboard Heatmap
//!
//! Default paths and collection/rendering settings live in a TOML file that
//! is loaded at startup. Command line flags override whatever is set here.
//!
//! The file lives under the platform config directory:
//!
//! | OS | Location |
//! |----|----------|
//! | Linux | `~/.config/keyboard-heatmap/config.toml` |
//! | macOS | `~/Library/Application Support/keyboard-heatmap/config.toml` |
//! | Windows | `%APPDATA%\keyboard-heatmap\config.toml` |
//!
//! ```no_run
//! use keyboard_heatmap::Config;
//!
//! let mut config = Config::load().unwrap_or_default();
//! config.collector.baud_rate = 9600;
//! config.save()?;
//! # Ok::<(), keyboard_heatmap::config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Failures while locating, reading or writing the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform has no config directory
    #[error("Could not determine config directory")]
    NoConfigDir,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// The file is not valid TOML for [`Config`]
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Location of the user's config file. Nothing is created on disk.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("keyboard-heatmap").join("config.toml"))
        .ok_or(ConfigError::NoConfigDir)
}

/// Settings for every subcommand, one TOML table each
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Serial collection settings
    #[serde(default)]
    pub collector: CollectorConfig,
    /// Layout config and keymap locations
    #[serde(default)]
    pub layout: LayoutPaths,
    /// Heatmap image settings
    #[serde(default)]
    pub render: RenderConfig,
}

/// Serial collection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Serial device exposed by the keyboard's USB logging
    pub device: PathBuf,
    /// Serial baud rate
    pub baud_rate: u32,
    /// How long a single read may block before the loop checks for a stop
    pub read_timeout_ms: u64,
    /// Where the session summary is written
    pub output: PathBuf,
    /// Stop automatically after this many seconds
    pub duration_secs: Option<u64>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/ttyACM0"),
            baud_rate: 115_200,
            read_timeout_ms: 1000,
            output: PathBuf::from("data/keypress_data.json"),
            duration_secs: None,
        }
    }
}

/// Locations of the layout config and the keymap it is generated from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutPaths {
    /// Generated layout config (JSON)
    pub config_path: PathBuf,
    /// ZMK keymap source
    pub keymap_path: PathBuf,
}

impl Default for LayoutPaths {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("config/eyelash_sofle_layout.json"),
            keymap_path: PathBuf::from("config/eyelash_sofle.keymap"),
        }
    }
}

/// Heatmap rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output image path
    pub output: PathBuf,
    /// Colormap name
    pub colormap: String,
    /// Side length of a key in pixels
    pub key_size_px: u32,
    /// Gap between neighbouring keys in pixels
    pub key_gap_px: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("data/heatmaps/heatmap.png"),
            colormap: "keyboard_heat".to_string(),
            key_size_px: 64,
            key_gap_px: 8,
        }
    }
}

impl Config {
    /// Read the user's config file, falling back to defaults when there is none.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Read a config file that must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Write to the user's config file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path()?;
        self.save_to(&path)
    }

    /// Write to `path`, creating its directory.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Serial read timeout as Duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.collector.read_timeout_ms)
    }

    /// Collection ceiling, if one is configured
    pub fn duration_limit(&self) -> Option<Duration> {
        self.collector.duration_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = Config::default();
        assert_eq!(config.collector.device, PathBuf::from("/dev/ttyACM0"));
        assert_eq!(config.collector.baud_rate, 115_200);
        assert_eq!(config.collector.read_timeout_ms, 1000);
        assert_eq!(config.collector.duration_secs, None);
        assert_eq!(config.render.colormap, "keyboard_heat");
        assert_eq!(
            config.layout.config_path,
            PathBuf::from("config/eyelash_sofle_layout.json")
        );
    }

    #[test]
    fn config_read_timeout() {
        let mut config = Config::default();
        assert_eq!(config.read_timeout(), Duration::from_secs(1));
        config.collector.read_timeout_ms = 250;
        assert_eq!(config.read_timeout().as_millis(), 250);
    }

    #[test]
    fn config_duration_limit() {
        let mut config = Config::default();
        assert!(config.duration_limit().is_none());
        config.collector.duration_secs = Some(90);
        assert_eq!(config.duration_limit(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn config_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.collector.baud_rate = 9600;
        config.render.colormap = "viridis".to_string();
        config.collector.duration_secs = Some(600);

        config.save_to(&path).expect("Failed to save config");
        let loaded = Config::load_from(&path).expect("Failed to load config");

        assert_eq!(loaded.collector.baud_rate, 9600);
        assert_eq!(loaded.render.colormap, "viridis");
        assert_eq!(loaded.collector.duration_secs, Some(600));
    }

    #[test]
    fn config_load_missing_file_is_error() {
        let result = Config::load_from(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn config_partial_file_fills_defaults() {
        let toml_str = r#"
[render]
output = "out/map.png"
colormap = "plasma"
key_size_px = 48
key_gap_px = 4
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to deserialize");

        assert_eq!(config.render.colormap, "plasma");
        assert_eq!(config.render.key_size_px, 48);
        assert_eq!(config.collector.baud_rate, 115_200);
        assert_eq!(
            config.layout.keymap_path,
            PathBuf::from("config/eyelash_sofle.keymap")
        );
    }

    #[test]
    fn config_serializes_to_toml() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).expect("Failed to serialize");

        assert!(toml_str.contains("[collector]"));
        assert!(toml_str.contains("[layout]"));
        assert!(toml_str.contains("[render]"));
        assert!(toml_str.contains("baud_rate = 115200"));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::NoConfigDir;
        assert_eq!(err.to_string(), "Could not determine config directory");

        let io_err = ConfigError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        assert!(io_err.to_string().contains("IO error"));
    }
}

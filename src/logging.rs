//! Logging setup for the `keyheat` binary.
//!
//! Uses the `log` facade with an `env_logger` backend. `RUST_LOG` takes
//! precedence over the verbosity chosen on the command line.

use log::LevelFilter;

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Only errors.
    Quiet,
    /// Info and above.
    #[default]
    Normal,
    /// Debug and above (per-key press logging).
    Verbose,
    /// Everything.
    Trace,
}

impl Verbosity {
    /// Map command line flags to a verbosity level.
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Trace,
        }
    }

    pub fn level_filter(&self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::Error,
            Self::Normal => LevelFilter::Info,
            Self::Verbose => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

/// Initialize the logger. Safe to call more than once; later calls are no-ops.
pub fn init_logging(verbosity: Verbosity) {
    let env = env_logger::Env::default().default_filter_or(verbosity.level_filter().as_str());
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .format_target(false)
        .try_init();
}

//! Keypress collection: pulls log lines from a source and aggregates them
//!
//! The loop is single threaded. Cancellation is cooperative through a shared
//! stop flag, normally set by a Ctrl+C handler.

mod aggregator;
mod source;

pub use aggregator::Aggregator;
pub use source::{LineSource, LogReader, ReadOutcome, SerialDevice};

use crate::error::Result;
use crate::keyboard::{parse_line, KeypressEvent};
use crate::report::SessionSummary;
use chrono::{DateTime, Local};
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Why a collection run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The stop flag was raised
    Interrupted,
    /// The configured duration ceiling passed
    DurationReached,
    /// The source has no more lines
    SourceClosed,
}

impl StopReason {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Interrupted => "stopped by user",
            Self::DurationReached => "time limit reached",
            Self::SourceClosed => "input ended",
        }
    }
}

/// Where press times come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clock {
    /// Wall time when the line is read (live collection)
    Wall,
    /// Device uptime printed in each line, offset from the first event
    Device {
        first: Option<Duration>,
        latest: Duration,
    },
}

/// Drives a [`LineSource`] into an [`Aggregator`]
#[derive(Debug)]
pub struct Collector {
    aggregator: Aggregator,
    duration_limit: Option<Duration>,
    lines_read: u64,
    clock: Clock,
}

impl Collector {
    pub fn new(duration_limit: Option<Duration>) -> Self {
        Self::with_aggregator(Aggregator::new(), duration_limit)
    }

    pub fn with_aggregator(aggregator: Aggregator, duration_limit: Option<Duration>) -> Self {
        Self {
            aggregator,
            duration_limit,
            lines_read: 0,
            clock: Clock::Wall,
        }
    }

    /// Collector for a captured log.
    ///
    /// Press times and the session duration follow the device uptime stamps
    /// in the log, counted from the first event, rather than how fast the
    /// log happens to be read.
    pub fn replay(aggregator: Aggregator) -> Self {
        Self {
            clock: Clock::Device {
                first: None,
                latest: Duration::ZERO,
            },
            ..Self::with_aggregator(aggregator, None)
        }
    }

    /// Read from `source` until stopped, out of time, or the source closes.
    ///
    /// Source errors other than timeouts abort the run; whatever was
    /// aggregated up to that point stays available through [`Collector::summary`].
    pub fn run<S: LineSource>(&mut self, source: &mut S, stop: &AtomicBool) -> Result<StopReason> {
        let started = Instant::now();

        loop {
            if stop.load(Ordering::SeqCst) {
                return Ok(StopReason::Interrupted);
            }
            if let Some(limit) = self.duration_limit {
                if started.elapsed() > limit {
                    info!("Collection time limit of {}s reached", limit.as_secs());
                    return Ok(StopReason::DurationReached);
                }
            }

            match source.next_line()? {
                ReadOutcome::Line(line) => {
                    self.lines_read += 1;
                    self.process_line(&line);
                }
                ReadOutcome::Idle => continue,
                ReadOutcome::Closed => return Ok(StopReason::SourceClosed),
            }
        }
    }

    fn process_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        let Some(event) = parse_line(line) else {
            return;
        };
        let at = self.event_time(&event);
        if self.aggregator.record_at(&event, at) {
            debug!(
                "Key press: pos={} row={} col={}",
                event.position, event.row, event.col
            );
        }
    }

    fn event_time(&mut self, event: &KeypressEvent) -> DateTime<Local> {
        match &mut self.clock {
            Clock::Wall => Local::now(),
            Clock::Device { first, latest } => {
                if let Some(uptime) = event.uptime() {
                    let origin = *first.get_or_insert(uptime);
                    // A device reset restarts uptime; never move backwards
                    *latest = (*latest).max(uptime.saturating_sub(origin));
                }
                let offset = *latest;
                self.device_time(offset)
            }
        }
    }

    fn device_time(&self, offset: Duration) -> DateTime<Local> {
        let offset =
            chrono::Duration::from_std(offset).unwrap_or_else(|_| chrono::Duration::zero());
        self.aggregator.session_start() + offset
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Raw lines seen, matching or not
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Current session snapshot
    pub fn summary(&self) -> SessionSummary {
        match self.clock {
            Clock::Wall => self.aggregator.summary(),
            Clock::Device { latest, .. } => self.aggregator.summary_at(self.device_time(latest)),
        }
    }
}

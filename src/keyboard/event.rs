//! Keypress events parsed from ZMK USB log output

use super::layout::KeyPosition;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

/// Matches the kscan debug line ZMK emits for every key transition, e.g.
/// `[00:01:02.123,456] <dbg> zmk: zmk_physical_layouts_kscan_process_msgq: Row: 1, col: 2, position: 14, pressed: true`
static KEYPRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[(\d+:\d+:\d+\.\d+),\d+\]\s*<dbg>.*?Row: (\d+), col: (\d+), position: (\d+), pressed: (true|false)",
    )
    .expect("keypress pattern is valid")
});

/// Type of key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventType {
    /// Key was pressed down
    Press,
    /// Key was released
    Release,
}

/// A single key transition reported by the firmware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeypressEvent {
    /// Device uptime stamp as printed in the log (`HH:MM:SS.mmm`)
    pub timestamp: String,
    pub row: u32,
    pub col: u32,
    pub position: KeyPosition,
    pub event_type: KeyEventType,
}

impl KeypressEvent {
    pub fn new(position: KeyPosition, row: u32, col: u32, event_type: KeyEventType) -> Self {
        Self {
            timestamp: String::new(),
            row,
            col,
            position,
            event_type,
        }
    }

    pub fn press(position: KeyPosition, row: u32, col: u32) -> Self {
        Self::new(position, row, col, KeyEventType::Press)
    }

    pub fn release(position: KeyPosition, row: u32, col: u32) -> Self {
        Self::new(position, row, col, KeyEventType::Release)
    }

    pub fn is_press(&self) -> bool {
        self.event_type == KeyEventType::Press
    }

    /// Device uptime parsed from `timestamp`
    pub fn uptime(&self) -> Option<Duration> {
        let mut parts = self.timestamp.splitn(3, ':');
        let hours: u64 = parts.next()?.parse().ok()?;
        let minutes: u64 = parts.next()?.parse().ok()?;
        let (secs, millis) = parts.next()?.split_once('.')?;
        let secs: u64 = secs.parse().ok()?;
        let millis: u64 = millis.parse().ok()?;
        Some(Duration::from_millis(
            ((hours * 60 + minutes) * 60 + secs) * 1000 + millis,
        ))
    }
}

/// Parse one log line into a keypress event.
///
/// Lines that are not kscan events, or are missing any field, yield `None`.
pub fn parse_line(line: &str) -> Option<KeypressEvent> {
    let caps = KEYPRESS_RE.captures(line)?;

    let event_type = match &caps[5] {
        "true" => KeyEventType::Press,
        _ => KeyEventType::Release,
    };

    Some(KeypressEvent {
        timestamp: caps[1].to_string(),
        row: caps[2].parse().ok()?,
        col: caps[3].parse().ok()?,
        position: caps[4].parse().ok()?,
        event_type,
    })
}

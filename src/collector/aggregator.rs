//! Folds keypress events into per-position statistics

use crate::keyboard::{parse_line, KeyPosition, KeypressEvent};
use crate::report::{KeyStat, SessionSummary};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;

/// Running keypress table for one collection session.
///
/// Only press transitions are counted; releases are parsed but leave the
/// table untouched.
#[derive(Debug, Clone)]
pub struct Aggregator {
    session_start: DateTime<Local>,
    stats: BTreeMap<KeyPosition, KeyStat>,
}

impl Aggregator {
    /// Start a session now
    pub fn new() -> Self {
        Self::started_at(Local::now())
    }

    /// Start a session at a fixed time
    pub fn started_at(session_start: DateTime<Local>) -> Self {
        Self {
            session_start,
            stats: BTreeMap::new(),
        }
    }

    pub fn session_start(&self) -> DateTime<Local> {
        self.session_start
    }

    /// Record an event at the current time. Returns true if a press was counted.
    pub fn record(&mut self, event: &KeypressEvent) -> bool {
        self.record_at(event, Local::now())
    }

    /// Record an event observed at `now`. Returns true if a press was counted.
    pub fn record_at(&mut self, event: &KeypressEvent, now: DateTime<Local>) -> bool {
        if !event.is_press() {
            return false;
        }

        let stat = self.stats.entry(event.position).or_insert_with(|| KeyStat {
            count: 0,
            row: event.row,
            col: event.col,
            position: event.position,
            first_press: now,
            last_press: now,
        });
        stat.count += 1;
        stat.last_press = now;
        true
    }

    /// Parse a raw log line and record it if it is a keypress event.
    ///
    /// Returns the parsed event, pressed or released; lines that are not
    /// events are discarded.
    pub fn feed_line(&mut self, line: &str) -> Option<KeypressEvent> {
        let event = parse_line(line)?;
        self.record(&event);
        Some(event)
    }

    /// Stats for a single position
    pub fn key_stat(&self, position: KeyPosition) -> Option<&KeyStat> {
        self.stats.get(&position)
    }

    /// Total presses recorded so far
    pub fn total_keypresses(&self) -> u64 {
        self.stats.values().map(|s| s.count).sum()
    }

    /// Number of distinct positions pressed
    pub fn unique_keys(&self) -> usize {
        self.stats.len()
    }

    /// Snapshot with the duration measured up to now
    pub fn summary(&self) -> SessionSummary {
        self.summary_at(Local::now())
    }

    /// Snapshot with the duration measured up to `now`
    pub fn summary_at(&self, now: DateTime<Local>) -> SessionSummary {
        let elapsed = now.signed_duration_since(self.session_start);
        let minutes = elapsed.num_milliseconds().max(0) as f64 / 60_000.0;
        SessionSummary::from_stats(self.session_start, minutes, self.stats.clone())
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn line(position: u32, pressed: bool) -> String {
        format!(
            "[00:00:01.000,000] <dbg> zmk: zmk_physical_layouts_kscan_process_msgq: Row: {}, col: {}, position: {}, pressed: {}",
            position / 12,
            position % 12,
            position,
            pressed
        )
    }

    #[test]
    fn press_creates_and_increments() {
        let mut agg = Aggregator::started_at(t0());
        let ev = KeypressEvent::press(14, 2, 2);

        assert!(agg.record_at(&ev, t0() + Duration::seconds(1)));
        assert!(agg.record_at(&ev, t0() + Duration::seconds(5)));

        let stat = agg.key_stat(14).expect("stat exists");
        assert_eq!(stat.count, 2);
        assert_eq!(stat.row, 2);
        assert_eq!(stat.col, 2);
        assert_eq!(stat.first_press, t0() + Duration::seconds(1));
        assert_eq!(stat.last_press, t0() + Duration::seconds(5));
    }

    #[test]
    fn release_changes_nothing() {
        let mut agg = Aggregator::started_at(t0());
        assert!(!agg.record_at(&KeypressEvent::release(3, 0, 3), t0()));
        assert!(agg.key_stat(3).is_none());
        assert_eq!(agg.total_keypresses(), 0);

        agg.record_at(&KeypressEvent::press(3, 0, 3), t0());
        agg.record_at(&KeypressEvent::release(3, 0, 3), t0() + Duration::seconds(9));
        let stat = agg.key_stat(3).expect("stat exists");
        assert_eq!(stat.count, 1);
        assert_eq!(stat.last_press, t0());
    }

    #[test]
    fn total_equals_number_of_presses() {
        let mut agg = Aggregator::started_at(t0());
        let events = [
            KeypressEvent::press(1, 0, 1),
            KeypressEvent::release(1, 0, 1),
            KeypressEvent::press(2, 0, 2),
            KeypressEvent::press(1, 0, 1),
            KeypressEvent::release(2, 0, 2),
            KeypressEvent::press(40, 3, 4),
            KeypressEvent::release(40, 3, 4),
        ];
        for ev in &events {
            agg.record_at(ev, t0());
        }

        let presses = events.iter().filter(|e| e.is_press()).count() as u64;
        let summary = agg.summary_at(t0());
        assert_eq!(summary.total_keypresses, presses);
        assert_eq!(summary.unique_keys, 3);
        assert!(summary.is_consistent());
    }

    #[test]
    fn feed_line_discards_noise() {
        let mut agg = Aggregator::started_at(t0());

        assert!(agg.feed_line("[00:00:00.500,000] <inf> zmk: welcome").is_none());
        assert!(agg.feed_line("Row: 1, col: 2, position: 14").is_none());
        assert_eq!(agg.unique_keys(), 0);

        let ev = agg.feed_line(&line(14, true)).expect("event");
        assert!(ev.is_press());
        let ev = agg.feed_line(&line(14, false)).expect("event");
        assert!(!ev.is_press());

        assert_eq!(agg.total_keypresses(), 1);
    }

    #[test]
    fn duration_tracks_requested_time() {
        let mut agg = Aggregator::started_at(t0());
        agg.record_at(&KeypressEvent::press(0, 0, 0), t0());

        let early = agg.summary_at(t0() + Duration::seconds(90));
        let late = agg.summary_at(t0() + Duration::minutes(10));

        assert!((early.session_duration_minutes - 1.5).abs() < 1e-9);
        assert!((late.session_duration_minutes - 10.0).abs() < 1e-9);
        assert_eq!(early.session_start, late.session_start);
        assert_eq!(early.keypress_data, late.keypress_data);
    }

    #[test]
    fn clock_before_start_clamps_to_zero() {
        let agg = Aggregator::started_at(t0());
        let summary = agg.summary_at(t0() - Duration::seconds(30));
        assert_eq!(summary.session_duration_minutes, 0.0);
    }

    #[test]
    fn empty_session_summary() {
        let agg = Aggregator::new();
        let summary = agg.summary();
        assert_eq!(summary.total_keypresses, 0);
        assert_eq!(summary.unique_keys, 0);
        assert!(summary.keypress_data.is_empty());
        assert!(summary.session_duration_minutes >= 0.0);
    }
}

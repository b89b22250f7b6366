//! Summary statistics shown next to the heatmap

use crate::keyboard::KeyPosition;
use crate::report::SessionSummary;

/// Figures derived from a session at render time
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapStats {
    pub total_presses: u64,
    pub unique_keys: usize,
    pub duration_minutes: f64,
    /// Presses per minute, zero for a zero-length session
    pub presses_per_minute: f64,
    /// Most pressed position and its count
    pub most_used: Option<(KeyPosition, u64)>,
}

impl HeatmapStats {
    pub fn from_summary(summary: &SessionSummary) -> Self {
        let duration = summary.session_duration_minutes;
        let presses_per_minute = if duration > 0.0 {
            summary.total_keypresses as f64 / duration
        } else {
            0.0
        };

        // Ties go to the key pressed first
        let most_used = summary
            .keypress_data
            .values()
            .filter(|stat| stat.count > 0)
            .min_by_key(|stat| stat.rank())
            .map(|stat| (stat.position, stat.count));

        Self {
            total_presses: summary.total_keypresses,
            unique_keys: summary.unique_keys,
            duration_minutes: duration,
            presses_per_minute,
            most_used,
        }
    }

    /// Statistics block, one entry per line
    pub fn to_lines(&self) -> Vec<String> {
        let most_used = match self.most_used {
            Some((position, count)) => format!("Position {position} ({count} times)"),
            None => "None (0 times)".to_string(),
        };
        vec![
            format!("Total Keypresses: {}", self.total_presses),
            format!("Unique Keys Used: {}", self.unique_keys),
            format!("Session Duration: {:.1} min", self.duration_minutes),
            format!("Average Rate: {:.1} keys/min", self.presses_per_minute),
            format!("Most Used Key: {most_used}"),
        ]
    }
}

/// Title used when none is given
pub fn default_title(summary: &SessionSummary) -> String {
    format!(
        "Keyboard Heatmap - {} keypresses in {:.1} minutes",
        summary.total_keypresses, summary.session_duration_minutes
    )
}

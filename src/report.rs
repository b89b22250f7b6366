//! Session summary and its JSON persistence

use crate::error::{HeatmapError, Result};
use crate::keyboard::KeyPosition;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Press statistics for one key position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyStat {
    /// Number of presses recorded
    pub count: u64,
    /// Matrix row reported by the firmware
    pub row: u32,
    /// Matrix column reported by the firmware
    pub col: u32,
    pub position: KeyPosition,
    /// When the key was first pressed this session
    #[serde(deserialize_with = "local_time::deserialize")]
    pub first_press: DateTime<Local>,
    /// When the key was most recently pressed
    #[serde(deserialize_with = "local_time::deserialize")]
    pub last_press: DateTime<Local>,
}

impl KeyStat {
    /// Sort key placing busier keys first, then earlier first presses
    pub fn rank(&self) -> (Reverse<u64>, DateTime<Local>, KeyPosition) {
        (Reverse(self.count), self.first_press, self.position)
    }
}

/// Snapshot of a collection session, as written to the session data file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    #[serde(deserialize_with = "local_time::deserialize")]
    pub session_start: DateTime<Local>,
    pub session_duration_minutes: f64,
    pub total_keypresses: u64,
    pub unique_keys: usize,
    /// Stats per position, serialized as `"pos_<id>"` keys
    #[serde(with = "pos_map")]
    pub keypress_data: BTreeMap<KeyPosition, KeyStat>,
}

impl SessionSummary {
    /// Build a summary from per-key stats, deriving the totals.
    pub fn from_stats(
        session_start: DateTime<Local>,
        session_duration_minutes: f64,
        keypress_data: BTreeMap<KeyPosition, KeyStat>,
    ) -> Self {
        Self {
            session_start,
            session_duration_minutes,
            total_keypresses: keypress_data.values().map(|s| s.count).sum(),
            unique_keys: keypress_data.len(),
            keypress_data,
        }
    }

    /// Whether the stored totals agree with the per-key data
    pub fn is_consistent(&self) -> bool {
        self.total_keypresses == self.keypress_data.values().map(|s| s.count).sum::<u64>()
            && self.unique_keys == self.keypress_data.len()
    }

    /// The `n` most pressed keys, highest first. Ties go to the key pressed
    /// first, then to the lower position.
    pub fn top_keys(&self, n: usize) -> Vec<&KeyStat> {
        let mut stats: Vec<&KeyStat> = self.keypress_data.values().collect();
        stats.sort_by_key(|s| s.rank());
        stats.truncate(n);
        stats
    }

    /// Export summary to a pretty JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the summary to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a session data file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(HeatmapError::missing("data file", path));
        }
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Timestamps are written as RFC 3339. On read, ISO 8601 without an offset
/// is accepted too and taken as local time.
mod local_time {
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    pub fn parse(text: &str) -> Option<DateTime<Local>> {
        if let Ok(time) = DateTime::parse_from_rfc3339(text) {
            return Some(time.with_timezone(&Local));
        }
        let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()?;
        Local.from_local_datetime(&naive).earliest()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Local>, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).ok_or_else(|| D::Error::custom(format!("invalid timestamp '{text}'")))
    }
}

/// `BTreeMap<KeyPosition, _>` as a JSON object keyed `"pos_<id>"`.
/// Keys that do not follow that form fall back to the stat's own position.
mod pos_map {
    use super::KeyStat;
    use crate::keyboard::KeyPosition;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::collections::BTreeMap;
    use std::fmt;

    const PREFIX: &str = "pos_";

    pub fn serialize<S: Serializer>(
        data: &BTreeMap<KeyPosition, KeyStat>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(data.len()))?;
        for (position, stat) in data {
            map.serialize_entry(&format!("{PREFIX}{position}"), stat)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<KeyPosition, KeyStat>, D::Error> {
        struct PosVisitor;

        impl<'de> Visitor<'de> for PosVisitor {
            type Value = BTreeMap<KeyPosition, KeyStat>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of pos_<id> keys to key stats")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut data = BTreeMap::new();
                while let Some((key, stat)) = access.next_entry::<String, KeyStat>()? {
                    let position = key
                        .strip_prefix(PREFIX)
                        .and_then(|id| id.parse().ok())
                        .unwrap_or(stat.position);
                    data.insert(position, stat);
                }
                Ok(data)
            }
        }

        deserializer.deserialize_map(PosVisitor)
    }
}

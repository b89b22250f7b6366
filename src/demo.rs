//! Synthetic session data for trying the renderer without hardware
//!
//! Presses are drawn from a weighted distribution over the 58 Sofle
//! positions: home row, vowels, space and enter are common, the remaining
//! letter area is normal and the outer thumb keys are rare.

use crate::error::Result;
use crate::keyboard::KeyPosition;
use crate::report::{KeyStat, SessionSummary};
use chrono::{DateTime, Duration, Local};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// Positions the demo favours (home row, vowels, space and enter)
const COMMON_POSITIONS: [KeyPosition; 13] = [12, 13, 14, 15, 41, 42, 43, 44, 20, 16, 39, 37, 32];
/// Positions below this are treated as letter keys
const LETTER_LIMIT: KeyPosition = 50;
const TOTAL_POSITIONS: KeyPosition = 58;
/// Length of a generated session
pub const DEMO_SESSION_MINUTES: i64 = 30;
pub const DEFAULT_KEYPRESSES: u64 = 1500;

fn weight(position: KeyPosition) -> f64 {
    if COMMON_POSITIONS.contains(&position) {
        5.0
    } else if position < LETTER_LIMIT {
        1.0
    } else {
        0.2
    }
}

/// Generate a demo session ending now.
pub fn generate_demo(num_keypresses: u64, seed: u64) -> Result<SessionSummary> {
    generate_demo_at(Local::now(), num_keypresses, seed)
}

/// Generate a demo session ending at `now`. The same inputs always give
/// the same session.
pub fn generate_demo_at(
    now: DateTime<Local>,
    num_keypresses: u64,
    seed: u64,
) -> Result<SessionSummary> {
    let mut rng = StdRng::seed_from_u64(seed);
    let positions = WeightedIndex::new((0..TOTAL_POSITIONS).map(weight))?;
    let session_start = now - Duration::minutes(DEMO_SESSION_MINUTES);
    let session_secs = DEMO_SESSION_MINUTES * 60;

    let mut data: BTreeMap<KeyPosition, KeyStat> = BTreeMap::new();
    for _ in 0..num_keypresses {
        let position = positions.sample(&mut rng) as KeyPosition;
        let stat = data.entry(position).or_insert_with(|| KeyStat {
            count: 0,
            row: position / 12,
            col: position % 12,
            position,
            first_press: session_start,
            last_press: session_start,
        });
        stat.count += 1;
        stat.last_press = session_start + Duration::seconds(rng.gen_range(0..=session_secs));
    }

    Ok(SessionSummary::from_stats(
        session_start,
        DEMO_SESSION_MINUTES as f64,
        data,
    ))
}

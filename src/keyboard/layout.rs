//! Physical keyboard geometry
//!
//! Maps every key position reported by the firmware to a grid coordinate and
//! keyboard half. The geometry is fixed per keyboard model; only the Sofle
//! split layout is built in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Firmware key position (index into the physical key matrix)
pub type KeyPosition = u32;

/// Number of keys on the Sofle layout
pub const SOFLE_TOTAL_KEYS: usize = 58;

/// First position belonging to the right half of the Sofle
const SOFLE_RIGHT_START: KeyPosition = 29;

/// Which half of a split keyboard a key sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Grid placement of one key, as stored in the layout config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySlot {
    pub row: u32,
    pub col: u32,
    pub side: Side,
    pub physical_row: u32,
    pub physical_col: u32,
}

/// A key position together with its placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutEntry {
    pub position: KeyPosition,
    pub row: u32,
    pub col: u32,
    pub side: Side,
}

/// Complete physical layout of a keyboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyboardLayout {
    /// Display name
    pub name: String,
    /// Layout family ("split", ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// Number of rows, thumb cluster included
    pub rows: u32,
    /// Main columns on each half
    pub cols_per_half: u32,
    /// Number of physical keys
    pub total_keys: usize,
    /// Placement of every key position
    pub positions: BTreeMap<KeyPosition, KeySlot>,
}

impl KeyboardLayout {
    /// The Sofle split keyboard: 6x4 main block plus a 5 key thumb row per
    /// half, 58 keys in total.
    pub fn sofle() -> Self {
        let mut coords: Vec<(u32, u32)> = Vec::with_capacity(SOFLE_TOTAL_KEYS);

        // Left half: four full rows, then the thumb cluster
        for row in 0..4 {
            coords.extend((0..6).map(|col| (row, col)));
        }
        coords.extend((0..5).map(|col| (4, col)));

        // Right half starts after a one column gap
        for row in 0..4 {
            coords.extend((7..13).map(|col| (row, col)));
        }
        coords.extend((8..13).map(|col| (4, col)));

        let positions = coords
            .into_iter()
            .enumerate()
            .map(|(i, (row, col))| {
                let position = i as KeyPosition;
                let side = if position < SOFLE_RIGHT_START {
                    Side::Left
                } else {
                    Side::Right
                };
                (
                    position,
                    KeySlot {
                        row,
                        col,
                        side,
                        physical_row: row,
                        physical_col: col,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();

        Self {
            name: "Sofle".to_string(),
            kind: "split".to_string(),
            rows: 5,
            cols_per_half: 6,
            total_keys: positions.len(),
            positions,
        }
    }

    /// Look up a single position
    pub fn entry(&self, position: KeyPosition) -> Option<LayoutEntry> {
        self.positions.get(&position).map(|slot| LayoutEntry {
            position,
            row: slot.row,
            col: slot.col,
            side: slot.side,
        })
    }

    /// All entries in ascending position order
    pub fn entries(&self) -> impl Iterator<Item = LayoutEntry> + '_ {
        self.positions.iter().map(|(&position, slot)| LayoutEntry {
            position,
            row: slot.row,
            col: slot.col,
            side: slot.side,
        })
    }

    pub fn contains(&self, position: KeyPosition) -> bool {
        self.positions.contains_key(&position)
    }

    /// Grid size as (rows, cols): one past the largest row and column used.
    /// An empty layout has a 0x0 grid.
    pub fn grid_dimensions(&self) -> (usize, usize) {
        let rows = self.positions.values().map(|s| s.row as usize + 1).max();
        let cols = self.positions.values().map(|s| s.col as usize + 1).max();
        (rows.unwrap_or(0), cols.unwrap_or(0))
    }

    /// Number of keys on the given half
    pub fn keys_on(&self, side: Side) -> usize {
        self.positions.values().filter(|s| s.side == side).count()
    }
}

impl Default for KeyboardLayout {
    fn default() -> Self {
        Self::sofle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sofle_has_58_keys() {
        let layout = KeyboardLayout::sofle();
        assert_eq!(layout.positions.len(), SOFLE_TOTAL_KEYS);
        assert_eq!(layout.total_keys, SOFLE_TOTAL_KEYS);
        assert!(layout.contains(0));
        assert!(layout.contains(57));
        assert!(!layout.contains(58));
    }

    #[test]
    fn sofle_halves_are_balanced() {
        let layout = KeyboardLayout::sofle();
        assert_eq!(layout.keys_on(Side::Left), 29);
        assert_eq!(layout.keys_on(Side::Right), 29);
        assert_eq!(layout.entry(28).map(|e| e.side), Some(Side::Left));
        assert_eq!(layout.entry(29).map(|e| e.side), Some(Side::Right));
    }

    #[test]
    fn sofle_grid_is_5_by_13() {
        let layout = KeyboardLayout::sofle();
        assert_eq!(layout.grid_dimensions(), (5, 13));
    }

    #[test]
    fn sofle_known_coordinates() {
        let layout = KeyboardLayout::sofle();

        let first = layout.entry(0).expect("position 0");
        assert_eq!((first.row, first.col), (0, 0));

        // Home row, third key on the left
        let p14 = layout.entry(14).expect("position 14");
        assert_eq!((p14.row, p14.col), (2, 2));

        // Left thumb cluster ends at column 4
        let p28 = layout.entry(28).expect("position 28");
        assert_eq!((p28.row, p28.col), (4, 4));

        // Right half starts at column 7
        let p29 = layout.entry(29).expect("position 29");
        assert_eq!((p29.row, p29.col), (0, 7));

        // Right thumb cluster starts at column 8
        let p53 = layout.entry(53).expect("position 53");
        assert_eq!((p53.row, p53.col), (4, 8));

        let last = layout.entry(57).expect("position 57");
        assert_eq!((last.row, last.col), (4, 12));
    }

    #[test]
    fn sofle_cells_are_unique() {
        let layout = KeyboardLayout::sofle();
        let mut cells: Vec<(u32, u32)> = layout.entries().map(|e| (e.row, e.col)).collect();
        cells.sort_unstable();
        cells.dedup();
        assert_eq!(cells.len(), SOFLE_TOTAL_KEYS);
    }

    #[test]
    fn physical_coordinates_match_grid() {
        let layout = KeyboardLayout::sofle();
        for slot in layout.positions.values() {
            assert_eq!(slot.physical_row, slot.row);
            assert_eq!(slot.physical_col, slot.col);
        }
    }

    #[test]
    fn empty_layout_has_empty_grid() {
        let mut layout = KeyboardLayout::sofle();
        layout.positions.clear();
        assert_eq!(layout.grid_dimensions(), (0, 0));
    }

    #[test]
    fn layout_serializes_with_string_position_keys() {
        let layout = KeyboardLayout::sofle();
        let json = serde_json::to_value(&layout).expect("serialize");

        assert_eq!(json["type"], "split");
        assert_eq!(json["positions"]["0"]["side"], "left");
        assert_eq!(json["positions"]["57"]["side"], "right");
        assert_eq!(json["positions"]["57"]["col"], 12);

        let back: KeyboardLayout = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, layout);
    }
}

//! Placement of session counts onto the layout grid

use crate::keyboard::{KeyPosition, KeyboardLayout};
use crate::report::SessionSummary;

/// One cell of the heat grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    /// No key at this coordinate
    Empty,
    /// A key that was never pressed
    Unused { position: KeyPosition },
    /// A pressed key; `intensity` is count / max count
    Used {
        position: KeyPosition,
        count: u64,
        intensity: f64,
    },
}

impl Cell {
    pub fn intensity(&self) -> f64 {
        match self {
            Self::Used { intensity, .. } => *intensity,
            _ => 0.0,
        }
    }

    pub fn count(&self) -> u64 {
        match self {
            Self::Used { count, .. } => *count,
            _ => 0,
        }
    }

    pub fn position(&self) -> Option<KeyPosition> {
        match self {
            Self::Empty => None,
            Self::Unused { position } | Self::Used { position, .. } => Some(*position),
        }
    }
}

/// Row-major grid of normalized key intensities
#[derive(Debug, Clone, PartialEq)]
pub struct HeatGrid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    max_count: u64,
}

impl HeatGrid {
    /// Map a session onto a layout.
    ///
    /// Stats for positions the layout does not know are skipped. When
    /// nothing was pressed every intensity stays zero.
    pub fn build(layout: &KeyboardLayout, summary: &SessionSummary) -> Self {
        let (rows, cols) = layout.grid_dimensions();
        let mut cells = vec![Cell::Empty; rows * cols];

        for entry in layout.entries() {
            let idx = entry.row as usize * cols + entry.col as usize;
            cells[idx] = Cell::Unused {
                position: entry.position,
            };
        }

        let mut max_count = 0;
        let mut placed = Vec::new();
        for stat in summary.keypress_data.values() {
            let Some(entry) = layout.entry(stat.position) else {
                continue;
            };
            if stat.count == 0 {
                continue;
            }
            max_count = max_count.max(stat.count);
            placed.push((entry.row as usize * cols + entry.col as usize, stat));
        }

        for (idx, stat) in placed {
            let intensity = stat.count as f64 / max_count as f64;
            cells[idx] = Cell::Used {
                position: stat.position,
                count: stat.count,
                intensity,
            };
        }

        Self {
            rows,
            cols,
            cells,
            max_count,
        }
    }

    /// Grid size as (rows, cols)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Largest count placed on the grid
    pub fn max_count(&self) -> u64 {
        self.max_count
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col)
    }

    /// Intensity at a grid coordinate, zero outside the grid
    pub fn intensity(&self, row: usize, col: usize) -> f64 {
        self.cell(row, col).map(Cell::intensity).unwrap_or(0.0)
    }

    /// Intensity of the cell holding `position`
    pub fn intensity_of(&self, position: KeyPosition) -> Option<f64> {
        self.cells
            .iter()
            .find(|c| c.position() == Some(position))
            .map(Cell::intensity)
    }

    /// Iterate cells with their (row, col)
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &Cell)> + '_ {
        let cols = self.cols.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (i / cols, i % cols, cell))
    }

    /// Sum of counts that made it onto the grid
    pub fn placed_total(&self) -> u64 {
        self.cells.iter().map(Cell::count).sum()
    }
}

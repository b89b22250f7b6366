//! Heatmap rendering: grid placement, colormaps and PNG output

mod colormap;
mod grid;
mod render;
mod stats;

pub use colormap::{Colormap, UNUSED_KEY};
pub use grid::{Cell, HeatGrid};
pub use render::{save_png, Geometry, HeatmapRenderer, RenderOptions};
pub use stats::{default_title, HeatmapStats};

use crate::error::Result;
use crate::keyboard::KeyboardLayout;
use crate::report::SessionSummary;
use log::{info, warn};
use std::path::Path;

/// Render a session onto a layout and write the PNG to `output`.
///
/// Without a title one is derived from the session totals. Returns the
/// statistics shown in the image.
pub fn render_heatmap(
    layout: &KeyboardLayout,
    summary: &SessionSummary,
    options: &RenderOptions,
    title: Option<&str>,
    output: &Path,
) -> Result<HeatmapStats> {
    let grid = HeatGrid::build(layout, summary);
    let stats = HeatmapStats::from_summary(summary);
    let title = title
        .map(str::to_string)
        .unwrap_or_else(|| default_title(summary));

    if grid.placed_total() < summary.total_keypresses {
        warn!(
            "{} keypresses fall outside the {} layout",
            summary.total_keypresses - grid.placed_total(),
            layout.name
        );
    }

    let image = HeatmapRenderer::new(*options).render(&grid, &stats, &title);
    save_png(&image, output)?;
    info!(
        "Heatmap saved to {} ({}x{}, colormap {})",
        output.display(),
        image.width(),
        image.height(),
        options.colormap.name()
    );
    Ok(stats)
}

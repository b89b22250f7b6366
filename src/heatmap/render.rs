//! Raster rendering of a heat grid
//!
//! Shapes and text are drawn with `embedded-graphics` onto an
//! `image::RgbImage` through a small `DrawTarget` adapter, then saved as PNG.

use super::colormap::{Colormap, UNUSED_KEY};
use super::grid::{Cell, HeatGrid};
use super::stats::HeatmapStats;
use crate::error::Result;
use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10, FONT_7X13_BOLD, FONT_9X15},
        MonoFont, MonoTextStyle,
    },
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};
use image::{Rgb, RgbImage};
use std::convert::Infallible;
use std::fs;
use std::path::Path;

const MARGIN: u32 = 24;
const TITLE_BAND: u32 = 48;
const BAR_SPACING: u32 = 32;
const BAR_WIDTH: u32 = 20;
const LEGEND_WIDTH: u32 = 110;
const LEGEND_LABEL: &str = "Keypress Intensity";
const STATS_GAP: u32 = 40;
const STATS_PADDING: u32 = 10;
const STATS_LINE: u32 = 18;

const BACKGROUND: Rgb888 = Rgb888::new(255, 255, 255);
const INK: Rgb888 = Rgb888::new(0, 0, 0);
const FRAME: Rgb888 = Rgb888::new(160, 160, 160);

/// Adapter letting embedded-graphics draw into an RGB image
struct Canvas {
    image: RgbImage,
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> std::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = self.image.dimensions();
        for Pixel(Point { x, y }, color) in pixels {
            if x < 0 || y < 0 || x as u32 >= width || y as u32 >= height {
                continue;
            }
            self.image
                .put_pixel(x as u32, y as u32, Rgb([color.r(), color.g(), color.b()]));
        }
        Ok(())
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        let (width, height) = self.image.dimensions();
        Size::new(width, height)
    }
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, Rgb([255, 255, 255])),
        }
    }

    fn rect(&mut self, x: u32, y: u32, w: u32, h: u32, style: PrimitiveStyle<Rgb888>) {
        let _ = Rectangle::new(Point::new(x as i32, y as i32), Size::new(w, h))
            .into_styled(style)
            .draw(self);
    }

    fn text(&mut self, s: &str, x: u32, y: u32, font: &MonoFont<'_>, color: Rgb888, align: Alignment) {
        let character_style = MonoTextStyle::new(font, color);
        let text_style = TextStyleBuilder::new()
            .alignment(align)
            .baseline(Baseline::Middle)
            .build();
        let _ = Text::with_text_style(s, Point::new(x as i32, y as i32), character_style, text_style)
            .draw(self);
    }
}

fn to_rgb888(color: Rgb<u8>) -> Rgb888 {
    Rgb888::new(color[0], color[1], color[2])
}

/// Pixel sizes and the colormap used for a render
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub key_size_px: u32,
    pub key_gap_px: u32,
    pub colormap: Colormap,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            key_size_px: 64,
            key_gap_px: 8,
            colormap: Colormap::default(),
        }
    }
}

/// Pixel positions of every part of the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub grid_x: u32,
    pub grid_y: u32,
    pub grid_width: u32,
    pub grid_height: u32,
    pub bar_x: u32,
    pub stats_y: u32,
    pub stats_height: u32,
    pitch: u32,
}

impl Geometry {
    /// Top-left corner of the key at (row, col)
    pub fn key_origin(&self, row: usize, col: usize) -> (u32, u32) {
        (
            self.grid_x + col as u32 * self.pitch,
            self.grid_y + row as u32 * self.pitch,
        )
    }
}

fn span(n: usize, size: u32, gap: u32) -> u32 {
    let n = n as u32;
    n * size + n.saturating_sub(1) * gap
}

fn text_width(s: &str, font: &MonoFont<'_>) -> u32 {
    s.chars().count() as u32 * (font.character_size.width + font.character_spacing)
}

/// Draws heat grids as PNG-ready images
#[derive(Debug, Clone, Default)]
pub struct HeatmapRenderer {
    options: RenderOptions,
}

impl HeatmapRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Compute where everything goes without drawing anything.
    pub fn geometry(&self, grid: &HeatGrid, stats: &HeatmapStats, title: &str) -> Geometry {
        let (rows, cols) = grid.dimensions();
        let key = self.options.key_size_px.max(1);
        let gap = self.options.key_gap_px;

        let grid_width = span(cols, key, gap);
        let grid_height = span(rows, key, gap).max(BAR_WIDTH * 4);

        let stats_lines = stats.to_lines();
        let stats_text_width = stats_lines
            .iter()
            .map(|l| text_width(l, &FONT_9X15))
            .max()
            .unwrap_or(0);
        let stats_height = stats_lines.len() as u32 * STATS_LINE + STATS_PADDING * 2;

        let content_width = (grid_width + BAR_SPACING + LEGEND_WIDTH)
            .max(text_width(title, &FONT_10X20))
            .max(stats_text_width + STATS_PADDING * 2);

        let grid_y = MARGIN + TITLE_BAND;
        let stats_y = grid_y + grid_height + STATS_GAP;

        Geometry {
            width: content_width + MARGIN * 2,
            height: stats_y + stats_height + MARGIN,
            grid_x: MARGIN,
            grid_y,
            grid_width,
            grid_height,
            bar_x: MARGIN + grid_width + BAR_SPACING,
            stats_y,
            stats_height,
            pitch: key + gap,
        }
    }

    /// Render the grid, a colour bar legend and the statistics block.
    pub fn render(&self, grid: &HeatGrid, stats: &HeatmapStats, title: &str) -> RgbImage {
        let geo = self.geometry(grid, stats, title);
        let mut canvas = Canvas::new(geo.width, geo.height);
        let _ = canvas.clear(BACKGROUND);

        canvas.text(
            title,
            geo.width / 2,
            MARGIN + TITLE_BAND / 2,
            &FONT_10X20,
            INK,
            Alignment::Center,
        );

        self.draw_keys(&mut canvas, grid, &geo);
        self.draw_legend(&mut canvas, &geo);
        draw_stats(&mut canvas, stats, &geo);

        canvas.image
    }

    fn draw_keys(&self, canvas: &mut Canvas, grid: &HeatGrid, geo: &Geometry) {
        let key = self.options.key_size_px.max(1);

        for (row, col, cell) in grid.iter() {
            let fill = match cell {
                Cell::Empty => continue,
                Cell::Unused { .. } => UNUSED_KEY,
                Cell::Used { intensity, .. } => self.options.colormap.sample(*intensity),
            };
            let (x, y) = geo.key_origin(row, col);
            let style = PrimitiveStyleBuilder::new()
                .fill_color(to_rgb888(fill))
                .stroke_color(INK)
                .stroke_width(1)
                .build();
            canvas.rect(x, y, key, key, style);

            if let Cell::Used {
                count, intensity, ..
            } = cell
            {
                let ink = if *intensity > 0.5 {
                    Rgb888::new(255, 255, 255)
                } else {
                    INK
                };
                canvas.text(
                    &count.to_string(),
                    x + key / 2,
                    y + key / 2,
                    &FONT_7X13_BOLD,
                    ink,
                    Alignment::Center,
                );
            }
        }
    }

    fn draw_legend(&self, canvas: &mut Canvas, geo: &Geometry) {
        let top = geo.grid_y;
        let height = geo.grid_height;

        // Intensity 1.0 at the top
        for dy in 0..height {
            let t = 1.0 - dy as f64 / (height.max(2) - 1) as f64;
            let color = to_rgb888(self.options.colormap.sample(t));
            let y = (top + dy) as i32;
            let _ = Line::new(
                Point::new(geo.bar_x as i32, y),
                Point::new((geo.bar_x + BAR_WIDTH - 1) as i32, y),
            )
            .into_styled(PrimitiveStyle::with_stroke(color, 1))
            .draw(canvas);
        }
        canvas.rect(
            geo.bar_x,
            top,
            BAR_WIDTH,
            height,
            PrimitiveStyle::with_stroke(INK, 1),
        );

        let label_x = geo.bar_x + BAR_WIDTH + 6;
        for (value, frac) in [("1.0", 0.0), ("0.5", 0.5), ("0.0", 1.0)] {
            let y = top + ((height - 1) as f64 * frac) as u32;
            canvas.text(value, label_x, y, &FONT_6X10, INK, Alignment::Left);
        }
        canvas.text(
            LEGEND_LABEL,
            geo.bar_x,
            top + height + 14,
            &FONT_6X10,
            INK,
            Alignment::Left,
        );
    }
}

fn draw_stats(canvas: &mut Canvas, stats: &HeatmapStats, geo: &Geometry) {
    let lines = stats.to_lines();
    let width = lines
        .iter()
        .map(|l| text_width(l, &FONT_9X15))
        .max()
        .unwrap_or(0)
        + STATS_PADDING * 2;

    let style = PrimitiveStyleBuilder::new()
        .fill_color(BACKGROUND)
        .stroke_color(FRAME)
        .stroke_width(1)
        .build();
    canvas.rect(MARGIN, geo.stats_y, width, geo.stats_height, style);

    for (i, line) in lines.iter().enumerate() {
        let y = geo.stats_y + STATS_PADDING + i as u32 * STATS_LINE + STATS_LINE / 2;
        canvas.text(line, MARGIN + STATS_PADDING, y, &FONT_9X15, INK, Alignment::Left);
    }
}

/// Write an image as PNG, creating parent directories.
pub fn save_png(image: &RgbImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    image.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

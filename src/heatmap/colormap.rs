//! Named color gradients for heat intensities

use crate::error::{HeatmapError, Result};
use image::Rgb;

/// Fill for layout keys that were never pressed
pub const UNUSED_KEY: Rgb<u8> = Rgb([0xf0, 0xf0, 0xf0]);

/// A linear gradient through evenly spaced color stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colormap {
    name: &'static str,
    stops: &'static [[u8; 3]],
}

/// Dark blue through white to red
const KEYBOARD_HEAT: &[[u8; 3]] = &[
    [0x00, 0x00, 0x33],
    [0x00, 0x00, 0x55],
    [0x00, 0x00, 0x88],
    [0x00, 0x00, 0xbb],
    [0x00, 0x33, 0xff],
    [0x33, 0x66, 0xff],
    [0x66, 0x99, 0xff],
    [0x99, 0xcc, 0xff],
    [0xcc, 0xdd, 0xff],
    [0xff, 0xff, 0xff],
    [0xff, 0xcc, 0xcc],
    [0xff, 0x99, 0x99],
    [0xff, 0x66, 0x66],
    [0xff, 0x33, 0x33],
    [0xff, 0x00, 0x00],
];

const YL_OR_RD: &[[u8; 3]] = &[
    [0xff, 0xff, 0xcc],
    [0xff, 0xed, 0xa0],
    [0xfe, 0xd9, 0x76],
    [0xfe, 0xb2, 0x4c],
    [0xfd, 0x8d, 0x3c],
    [0xfc, 0x4e, 0x2a],
    [0xe3, 0x1a, 0x1c],
    [0xbd, 0x00, 0x26],
    [0x80, 0x00, 0x26],
];

const VIRIDIS: &[[u8; 3]] = &[
    [0x44, 0x01, 0x54],
    [0x48, 0x28, 0x78],
    [0x3e, 0x49, 0x89],
    [0x31, 0x68, 0x8e],
    [0x26, 0x82, 0x8e],
    [0x1f, 0x9e, 0x89],
    [0x35, 0xb7, 0x79],
    [0x6e, 0xce, 0x58],
    [0xb5, 0xde, 0x2b],
    [0xfd, 0xe7, 0x25],
];

const PLASMA: &[[u8; 3]] = &[
    [0x0d, 0x08, 0x87],
    [0x46, 0x03, 0x9f],
    [0x72, 0x01, 0xa8],
    [0x9c, 0x17, 0x9e],
    [0xbd, 0x37, 0x86],
    [0xd8, 0x57, 0x6b],
    [0xed, 0x79, 0x53],
    [0xfb, 0x9f, 0x3a],
    [0xfd, 0xca, 0x26],
    [0xf0, 0xf9, 0x21],
];

const INFERNO: &[[u8; 3]] = &[
    [0x00, 0x00, 0x04],
    [0x1b, 0x0c, 0x41],
    [0x4a, 0x0c, 0x6b],
    [0x78, 0x1c, 0x6d],
    [0xa5, 0x2c, 0x60],
    [0xcf, 0x44, 0x46],
    [0xed, 0x69, 0x25],
    [0xfb, 0x9b, 0x06],
    [0xf7, 0xd1, 0x3d],
    [0xfc, 0xff, 0xa4],
];

const MAGMA: &[[u8; 3]] = &[
    [0x00, 0x00, 0x04],
    [0x18, 0x0f, 0x3d],
    [0x44, 0x0f, 0x76],
    [0x72, 0x1f, 0x81],
    [0x9e, 0x2f, 0x7f],
    [0xcd, 0x40, 0x71],
    [0xf1, 0x60, 0x5d],
    [0xfd, 0x96, 0x68],
    [0xfe, 0xca, 0x8d],
    [0xfc, 0xfd, 0xbf],
];

const GREYS: &[[u8; 3]] = &[
    [0xff, 0xff, 0xff],
    [0xd9, 0xd9, 0xd9],
    [0xbd, 0xbd, 0xbd],
    [0x96, 0x96, 0x96],
    [0x73, 0x73, 0x73],
    [0x52, 0x52, 0x52],
    [0x25, 0x25, 0x25],
    [0x00, 0x00, 0x00],
];

const ALL: &[Colormap] = &[
    Colormap::new("keyboard_heat", KEYBOARD_HEAT),
    Colormap::new("YlOrRd", YL_OR_RD),
    Colormap::new("viridis", VIRIDIS),
    Colormap::new("plasma", PLASMA),
    Colormap::new("inferno", INFERNO),
    Colormap::new("magma", MAGMA),
    Colormap::new("Greys", GREYS),
];

impl Colormap {
    const fn new(name: &'static str, stops: &'static [[u8; 3]]) -> Self {
        Self { name, stops }
    }

    /// Look up a colormap by name, ignoring case.
    pub fn by_name(name: &str) -> Result<Self> {
        ALL.iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .copied()
            .ok_or_else(|| HeatmapError::UnknownColormap {
                name: name.to_string(),
                available: Self::names().join(", "),
            })
    }

    /// Names of all built-in colormaps
    pub fn names() -> Vec<&'static str> {
        ALL.iter().map(|c| c.name).collect()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Color at `t`, clamped to [0, 1].
    pub fn sample(&self, t: f64) -> Rgb<u8> {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let last = self.stops.len() - 1;
        let scaled = t * last as f64;
        let lower = (scaled.floor() as usize).min(last);
        let upper = (lower + 1).min(last);
        let frac = scaled - lower as f64;

        let a = self.stops[lower];
        let b = self.stops[upper];
        let mix = |i: usize| (a[i] as f64 + (b[i] as f64 - a[i] as f64) * frac).round() as u8;
        Rgb([mix(0), mix(1), mix(2)])
    }
}

impl Default for Colormap {
    fn default() -> Self {
        ALL[0]
    }
}

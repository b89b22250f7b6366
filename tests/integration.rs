//! Integration tests for the keyboard heatmap pipeline
//!
//! These tests drive the library end to end: keymap parsing into a layout
//! config, log aggregation into session data, persistence, and rendering.

use keyboard_heatmap::collector::{Collector, LogReader, StopReason};
use keyboard_heatmap::demo::generate_demo;
use keyboard_heatmap::heatmap::{
    render_heatmap, Cell, Colormap, HeatGrid, HeatmapRenderer, HeatmapStats, RenderOptions,
    UNUSED_KEY,
};
use keyboard_heatmap::keyboard::{KeyboardLayout, KeymapParser, LayoutConfig};
use keyboard_heatmap::report::SessionSummary;
use keyboard_heatmap::Config;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::AtomicBool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const KEYMAP: &str = r#"
#include <behaviors.dtsi>
#include <dt-bindings/zmk/keys.h>

/ {
    keymap {
        compatible = "zmk,keymap";

        default_layer {
            // Base layer
            bindings = <
&kp ESC  &kp N1 &kp N2   &kp N3    /* numbers */ &kp N4
&kp TAB  &kp Q  &mo 1    &trans
            >;
        };

        lower_layer {
            bindings = <
&bt BT_CLR &none &kp F1
            >;
        };
    };
};
"#;

/// One firmware debug line for a key transition
fn log_line(position: u32, pressed: bool) -> String {
    format!(
        "[00:01:{:02}.{:03},512] <dbg> zmk: zmk_physical_layouts_kscan_process_msgq: Row: {}, col: {}, position: {}, pressed: {}",
        position % 60,
        position,
        position / 12,
        position % 12,
        position,
        pressed
    )
}

/// Tap each position in order, interleaved with firmware noise
fn tap_log(positions: &[u32]) -> String {
    let mut lines = vec!["*** Booting Zephyr OS build v3.5.0 ***".to_string()];
    for &position in positions {
        lines.push(log_line(position, true));
        lines.push("[00:01:00.000,000] <inf> usb_hid: report sent".to_string());
        lines.push(log_line(position, false));
    }
    lines.join("\n")
}

fn collect(log: &str) -> (SessionSummary, StopReason) {
    let mut reader = LogReader::new(Cursor::new(log.to_string()));
    let stop = AtomicBool::new(false);
    let mut collector = Collector::new(None);
    let reason = collector.run(&mut reader, &stop).expect("collect");
    (collector.summary(), reason)
}

fn write_keymap(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("eyelash_sofle.keymap");
    fs::write(&path, KEYMAP).expect("write keymap");
    path
}

// ---------------------------------------------------------------------------
// Layout resolution
// ---------------------------------------------------------------------------

#[test]
fn keymap_to_layout_config_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let keymap = write_keymap(dir.path());
    let output = dir.path().join("config/layout.json");

    let config = KeymapParser::new(&keymap).parse().expect("parse");
    config.save(&output).expect("save");
    let loaded = LayoutConfig::load(&output).expect("load");

    assert_eq!(loaded.layout.positions.len(), 58);
    let names: Vec<&str> = loaded.layers.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["default_layer", "lower_layer"]);
    assert_eq!(
        loaded.layer("default_layer").expect("layer").bindings,
        ["&kp", "&kp", "&kp", "&kp", "&kp", "&kp", "&kp", "&mo", "&trans"]
    );
    assert_eq!(
        loaded.layer("lower_layer").expect("layer").bindings,
        ["&bt", "&none", "&kp"]
    );
    assert_eq!(loaded.metadata.source_file.as_deref(), Some(keymap.as_path()));
}

#[test]
fn layout_json_shape() {
    let dir = tempfile::tempdir().expect("tempdir");
    let keymap = write_keymap(dir.path());
    let output = dir.path().join("layout.json");
    KeymapParser::new(&keymap)
        .parse()
        .expect("parse")
        .save(&output)
        .expect("save");

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).expect("read")).expect("json");
    assert_eq!(json["layout"]["type"], "split");
    assert_eq!(json["layout"]["positions"]["0"]["side"], "left");
    assert_eq!(json["layout"]["positions"]["29"]["side"], "right");
    assert!(json["layers"]["lower_layer"].is_array());
    assert_eq!(json["metadata"]["total_keys"], 58);
}

#[test]
fn missing_keymap_is_reported() {
    let err = KeymapParser::new("/nonexistent/board.keymap")
        .parse()
        .expect_err("missing keymap");
    assert!(err.is_input_missing());
    assert!(err.to_string().contains("board.keymap"));
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[test]
fn log_replay_counts_presses_only() {
    let (summary, reason) = collect(&tap_log(&[12, 12, 12, 40, 5, 12]));

    assert_eq!(reason, StopReason::SourceClosed);
    assert_eq!(summary.total_keypresses, 6);
    assert_eq!(summary.unique_keys, 3);
    assert_eq!(summary.keypress_data[&12].count, 4);
    assert_eq!(summary.keypress_data[&40].row, 3);
    assert!(summary.is_consistent());
}

#[test]
fn noise_only_log_gives_empty_session() {
    let log = "*** Booting Zephyr OS ***\n<inf> usb: connected\n\n[00:00:01.000,000] <dbg> Row: 1, col: 2\n";
    let (summary, _) = collect(log);
    assert_eq!(summary.total_keypresses, 0);
    assert_eq!(summary.unique_keys, 0);
    assert!(summary.keypress_data.is_empty());
}

#[test]
fn session_survives_save_and_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("data/keypress_data.json");

    let (summary, _) = collect(&tap_log(&[1, 2, 2, 57]));
    summary.save(&path).expect("save");
    let loaded = SessionSummary::load(&path).expect("load");

    assert_eq!(loaded.total_keypresses, 4);
    assert_eq!(loaded.keypress_data[&2].count, 2);
    assert_eq!(loaded.session_start, summary.session_start);
    assert!(loaded.is_consistent());

    let raw = fs::read_to_string(&path).expect("read");
    assert!(raw.contains("\"pos_57\""));
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[test]
fn log_to_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let keymap = write_keymap(dir.path());
    let png = dir.path().join("out/heatmap.png");

    let layout = KeymapParser::new(&keymap).parse().expect("parse");
    let (summary, _) = collect(&tap_log(&[5, 5, 12, 12, 12, 12, 40]));

    let stats = render_heatmap(
        &layout.layout,
        &summary,
        &RenderOptions::default(),
        None,
        &png,
    )
    .expect("render");

    assert_eq!(stats.total_presses, 7);
    assert_eq!(stats.most_used, Some((12, 4)));
    let image = image::open(&png).expect("decode").to_rgb8();
    assert!(image.width() > 0 && image.height() > 0);
}

#[test]
fn grid_normalizes_against_hottest_key() {
    let (summary, _) = collect(&tap_log(&[3, 3, 3, 3, 30, 30, 56]));
    let grid = HeatGrid::build(&KeyboardLayout::sofle(), &summary);

    assert_eq!(grid.max_count(), 4);
    assert_eq!(grid.intensity_of(3), Some(1.0));
    assert_eq!(grid.intensity_of(30), Some(0.5));
    assert_eq!(grid.intensity_of(56), Some(0.25));
    assert_eq!(grid.intensity_of(0), Some(0.0));
}

#[test]
fn empty_session_renders_neutral_keys() {
    let (summary, _) = collect("");
    let layout = KeyboardLayout::sofle();
    let grid = HeatGrid::build(&layout, &summary);
    let stats = HeatmapStats::from_summary(&summary);
    let renderer = HeatmapRenderer::default();

    let image = renderer.render(&grid, &stats, "empty");
    let geo = renderer.geometry(&grid, &stats, "empty");

    for (row, col, cell) in grid.iter() {
        if *cell == Cell::Empty {
            continue;
        }
        let (x, y) = geo.key_origin(row, col);
        assert_eq!(*image.get_pixel(x + 3, y + 3), UNUSED_KEY);
    }
    assert_eq!(stats.presses_per_minute, 0.0);
    assert_eq!(stats.most_used, None);
}

#[test]
fn unknown_colormap_is_rejected() {
    let err = Colormap::by_name("jet").expect_err("unknown");
    assert!(err.to_string().contains("jet"));
}

// ---------------------------------------------------------------------------
// Demo data and configuration
// ---------------------------------------------------------------------------

#[test]
fn demo_session_renders() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = dir.path().join("demo.json");
    let png = dir.path().join("demo.png");

    let summary = generate_demo(800, 2024).expect("demo");
    summary.save(&data).expect("save");
    let loaded = SessionSummary::load(&data).expect("load");
    assert_eq!(loaded.total_keypresses, 800);

    let options = RenderOptions {
        colormap: Colormap::by_name("magma").expect("magma"),
        ..RenderOptions::default()
    };
    render_heatmap(
        &KeyboardLayout::sofle(),
        &loaded,
        &options,
        Some("Demo"),
        &png,
    )
    .expect("render");
    assert!(png.exists());

    let top = loaded.top_keys(5);
    assert_eq!(top.len(), 5);
    assert!(top.windows(2).all(|w| w[0].count >= w[1].count));
}

#[test]
fn config_file_overrides_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "[collector]\ndevice = \"/dev/ttyUSB3\"\nduration_secs = 90\n\n[render]\ncolormap = \"viridis\"\n",
    )
    .expect("write");

    let config = Config::load_from(&path).expect("load");
    assert_eq!(config.collector.device, Path::new("/dev/ttyUSB3"));
    assert_eq!(config.collector.baud_rate, 115_200);
    assert_eq!(config.duration_limit().map(|d| d.as_secs()), Some(90));
    assert_eq!(config.render.colormap, "viridis");
    assert!(Colormap::by_name(&config.render.colormap).is_ok());
}

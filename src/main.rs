//! keyheat - keypress heatmaps for ZMK split keyboards

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use keyboard_heatmap::{
    cli::{Cli, CollectCommand, Command, DemoCommand, LayoutCommand, RenderCommand, ReplayCommand},
    collector::{Aggregator, Collector, LineSource, LogReader, SerialDevice},
    config::Config,
    demo,
    heatmap::{render_heatmap, Colormap, RenderOptions},
    keyboard::{KeyboardLayout, KeymapParser, LayoutConfig},
    logging::init_logging,
    report::SessionSummary,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity());

    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };

    match cli.command {
        Command::Layout(cmd) => run_layout(&config, cmd),
        Command::Collect(cmd) => run_collect(&config, cmd),
        Command::Replay(cmd) => run_replay(&config, cmd),
        Command::Render(cmd) => run_render(&config, cmd),
        Command::Demo(cmd) => run_demo(&config, cmd),
    }
}

fn run_layout(config: &Config, cmd: LayoutCommand) -> Result<()> {
    let keymap = cmd.keymap.unwrap_or_else(|| config.layout.keymap_path.clone());
    let output = cmd.output.unwrap_or_else(|| config.layout.config_path.clone());

    let layout_config = KeymapParser::new(keymap).parse()?;
    layout_config
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Layout configuration saved to {}", output.display());
    info!("Keyboard: {}", layout_config.layout.name);
    info!("Total keys: {}", layout_config.layout.total_keys);
    for layer in &layout_config.layers {
        info!("  {}: {} bindings", layer.name, layer.bindings.len());
    }
    Ok(())
}

/// Install a Ctrl+C handler that raises the returned flag.
fn stop_flag() -> Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl+C handler")?;
    Ok(stop)
}

/// Run the collector over `source`, then save whatever was gathered.
fn collect_from<S: LineSource>(
    source: &mut S,
    collector: &mut Collector,
    stop: &AtomicBool,
    output: &Path,
) -> Result<()> {
    let outcome = collector.run(source, stop);

    let summary = collector.summary();
    summary
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    report_session(&summary, output);

    match outcome {
        Ok(reason) => {
            info!("Collection ended: {}", reason.describe());
            Ok(())
        }
        Err(e) => {
            error!("Collection aborted after {} lines", collector.lines_read());
            Err(e.into())
        }
    }
}

fn report_session(summary: &SessionSummary, output: &Path) {
    info!("Total keypresses: {}", summary.total_keypresses);
    info!("Unique keys used: {}", summary.unique_keys);
    info!(
        "Session duration: {:.1} minutes",
        summary.session_duration_minutes
    );
    info!("Data saved to: {}", output.display());
}

fn run_collect(config: &Config, cmd: CollectCommand) -> Result<()> {
    let device = cmd.device.unwrap_or_else(|| config.collector.device.clone());
    let output = cmd.output.unwrap_or_else(|| config.collector.output.clone());
    let baud_rate = cmd.baud_rate.unwrap_or(config.collector.baud_rate);
    let limit = cmd
        .duration
        .map(std::time::Duration::from_secs)
        .or_else(|| config.duration_limit());

    let mut serial = SerialDevice::open(&device, baud_rate, config.read_timeout())?;
    let stop = stop_flag()?;

    info!("Collecting keypresses from {}", serial.path().display());
    info!("Press Ctrl+C to stop collection");

    let mut collector = Collector::new(limit);
    let result = collect_from(&mut serial, &mut collector, &stop, &output);
    if collector.summary().total_keypresses == 0 {
        warn!("No keypresses recorded; is USB logging enabled in the firmware?");
    }
    result
}

fn run_replay(config: &Config, cmd: ReplayCommand) -> Result<()> {
    let output = cmd.output.unwrap_or_else(|| config.collector.output.clone());
    let stop = stop_flag()?;
    let mut collector = Collector::replay(Aggregator::new());

    if cmd.log.as_os_str() == "-" {
        let mut source = LogReader::new(io::stdin().lock());
        collect_from(&mut source, &mut collector, &stop, &output)?;
    } else {
        let mut source = LogReader::open(&cmd.log)?;
        collect_from(&mut source, &mut collector, &stop, &output)?;
    }

    info!(
        "Replayed {} lines, {} matched keypresses",
        collector.lines_read(),
        collector.aggregator().total_keypresses()
    );
    Ok(())
}

fn render_options(config: &Config, colormap: Option<&str>) -> Result<RenderOptions> {
    let name = colormap.unwrap_or(&config.render.colormap);
    Ok(RenderOptions {
        key_size_px: config.render.key_size_px,
        key_gap_px: config.render.key_gap_px,
        colormap: Colormap::by_name(name)?,
    })
}

fn run_render(config: &Config, cmd: RenderCommand) -> Result<()> {
    let data = cmd.data.unwrap_or_else(|| config.collector.output.clone());
    let layout_path = cmd
        .layout
        .unwrap_or_else(|| config.layout.config_path.clone());
    let output = cmd.output.unwrap_or_else(|| config.render.output.clone());
    let options = render_options(config, cmd.colormap.as_deref())?;

    let layout = LayoutConfig::load(&layout_path)?;
    let summary = SessionSummary::load(&data)?;
    if !summary.is_consistent() {
        warn!(
            "{}: totals do not match per-key data; rendering per-key counts",
            data.display()
        );
    }

    let stats = render_heatmap(
        &layout.layout,
        &summary,
        &options,
        cmd.title.as_deref(),
        &output,
    )?;
    for line in stats.to_lines() {
        info!("{line}");
    }
    Ok(())
}

fn run_demo(config: &Config, cmd: DemoCommand) -> Result<()> {
    let seed = cmd
        .seed
        .unwrap_or_else(|| chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0) as u64);
    info!(
        "Generating demo data with {} keypresses (seed {seed})",
        cmd.keypresses
    );

    let summary = demo::generate_demo(cmd.keypresses, seed)?;
    summary
        .save(&cmd.output)
        .with_context(|| format!("Failed to write {}", cmd.output.display()))?;
    report_session(&summary, &cmd.output);

    println!("Top 5 most used keys:");
    for (rank, stat) in summary.top_keys(5).iter().enumerate() {
        println!(
            "  {}. Position {}: {} presses",
            rank + 1,
            stat.position,
            stat.count
        );
    }

    if cmd.render {
        let layout = if config.layout.config_path.exists() {
            LayoutConfig::load(&config.layout.config_path)?.layout
        } else {
            KeyboardLayout::sofle()
        };
        let output = cmd.output.with_extension("png");
        render_heatmap(
            &layout,
            &summary,
            &render_options(config, None)?,
            Some("Demo Keyboard Heatmap"),
            &output,
        )?;
    }
    Ok(())
}

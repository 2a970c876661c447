use std::path::PathBuf;

use clap::Parser;
use foundation::viewport::Viewport;
use gpu::RecordingRenderer;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use viewer_native::{MapSession, ViewerConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless extruded region map viewer")]
struct Args {
    /// GeoJSON FeatureCollection of regions
    #[arg(long)]
    data: PathBuf,

    /// Viewer config (JSON); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Surface size as WIDTHxHEIGHT
    #[arg(long, default_value = "1280x720", value_parser = parse_viewport)]
    viewport: Viewport,

    /// Frames to render after the pointer script
    #[arg(long, default_value_t = 1)]
    frames: u64,

    /// Pointer position X,Y in pixels; one frame is rendered after each
    #[arg(long, value_parser = parse_point)]
    pointer: Vec<(f64, f64)>,
}

#[derive(Serialize)]
struct PointerReport {
    x: f64,
    y: f64,
    hovered: Option<String>,
}

#[derive(Serialize)]
struct Summary {
    regions: usize,
    solids: usize,
    degenerate_rings: usize,
    border_only_rings: usize,
    skipped_points: usize,
    frames: u64,
    pointer: Vec<PointerReport>,
    labels: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };

    let mut session = MapSession::new(config, RecordingRenderer::new(), args.viewport)?;
    session.load_file(&args.data)?;

    let mut pointer = Vec::with_capacity(args.pointer.len());
    for &(x, y) in &args.pointer {
        session.pointer_move(x, y)?;
        session.tick()?;
        pointer.push(PointerReport {
            x,
            y,
            hovered: session.hovered_name().map(str::to_string),
        });
    }
    for _ in 0..args.frames {
        session.tick()?;
    }

    let (regions, solids, stats) = match session.scene() {
        Some(scene) => (scene.regions().len(), scene.solids().len(), scene.stats()),
        None => (0, 0, Default::default()),
    };
    let summary = Summary {
        regions,
        solids,
        degenerate_rings: stats.degenerate_rings,
        border_only_rings: stats.border_only_rings,
        skipped_points: stats.malformed_points + stats.rejected_points,
        frames: session.renderer().frames_rendered(),
        pointer,
        labels: session
            .renderer()
            .last_record()
            .map(|f| f.labels.clone())
            .unwrap_or_default(),
    };

    session.teardown();
    info!(regions, frames = summary.frames, "viewer finished");
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn parse_viewport(s: &str) -> Result<Viewport, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    if w == 0 || h == 0 {
        return Err("viewport must be non-empty".to_string());
    }
    Ok(Viewport::new(w, h))
}

fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x: {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y: {e}"))?;
    Ok((x, y))
}

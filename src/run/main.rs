//! Sectorgrid command line runner.
//!
//! Reads a GeoJSON border, runs the full pipeline and writes every
//! intermediate table into an output directory.

mod config;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sectorgrid::io::{read_border_records, write_tables};
use sectorgrid::params::VertexMode;
use sectorgrid::{Pipeline, Stage};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "sectorgrid")]
#[command(about = "Tessellate a border and intersect directional sectors cast from grid corners")]
struct Args {
    /// Optional TOML config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GeoJSON border file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Output directory for the tables
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Grid square side length in meters
    #[arg(long)]
    square_size: Option<f64>,

    /// Sector radius in meters
    #[arg(long)]
    radius: Option<f64>,

    /// Cleanup buffer in degrees
    #[arg(long)]
    buffer: Option<f64>,

    /// Merge shared grid corners, rounding projected coordinates to this many decimals
    #[arg(long)]
    dedup_decimals: Option<u32>,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    let input = args
        .file
        .or(config.input.path.take())
        .context("No input file given (use --file or [input] path)")?;
    let output_dir = args
        .output
        .or(config.output.dir.take())
        .unwrap_or_else(|| PathBuf::from("output"));

    let mut params = config.geometry;
    if let Some(size) = args.square_size {
        params.square_size_m = size;
    }
    if let Some(radius) = args.radius {
        params.sector_radius_m = radius;
    }
    if let Some(buffer) = args.buffer {
        params.cleanup_buffer_deg = buffer;
    }
    if let Some(decimals) = args.dedup_decimals {
        params.vertex_mode = VertexMode::Canonical { decimals };
    }

    info!("Sectorgrid");
    info!("File: {}", input.display());
    info!(
        "Square {} m, radius {} m, buffer {} deg",
        params.square_size_m, params.sector_radius_m, params.cleanup_buffer_deg
    );

    let bytes = fs::read(&input).with_context(|| format!("Failed to read {}", input.display()))?;
    let records = read_border_records(&bytes).context("Failed to load border")?;
    info!("Loaded {} border records", records.len());

    let pipeline = Pipeline::new(params.clone())?;

    let pb = ProgressBar::new(Stage::all().len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:20.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    let mut started = 0;
    let result = pipeline.run_observed(&records, |stage| {
        if started > 0 {
            pb.inc(1);
        }
        started += 1;
        pb.set_message(stage.to_string());
    });

    let output = match result {
        Ok(output) => {
            pb.inc(1);
            pb.finish_with_message("done");
            output
        }
        Err(e) => {
            pb.abandon_with_message("failed");
            return Err(e).context("Pipeline failed");
        }
    };

    let manifest = write_tables(&output, &params, &output_dir)?;
    info!(
        "Analysis completed in {:.2} seconds ({} intersections)",
        manifest.elapsed_secs, manifest.intersections
    );

    Ok(())
}

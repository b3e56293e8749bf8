use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hand_vectors::camera::Camera;
use hand_vectors::config::Config;
use hand_vectors::inference::OnnxHandDetector;
use hand_vectors::overlay::CvOverlay;
use hand_vectors::HandTracker;

/// Track a hand on camera and report wrist-to-fingertip vectors
#[derive(Parser, Debug)]
#[command(name = "hand-vectors")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera device index (overrides config)
    #[arg(long)]
    camera: Option<i32>,

    /// Hand landmark ONNX model (overrides config)
    #[arg(short, long)]
    model: Option<String>,

    /// Write the default config to this path and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Some(path) = &cli.write_config {
        Config::default().save(path)?;
        info!("default config written to {}", path.display());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(device_id) = cli.camera {
        config.camera.device_id = device_id;
    }
    if let Some(model) = cli.model {
        config.detector.model_path = model;
    }
    config.validate()?;

    let mut camera = Camera::new(&config.camera)?;
    let mut detector = OnnxHandDetector::new(&config.detector)?;
    let mut overlay = CvOverlay::new(&config.overlay)?;
    let mut tracker = HandTracker::from_config(&config);

    let report = tracker.run(&mut camera, &mut detector, &mut overlay)?;
    drop(overlay);
    drop(camera);

    println!("{}", report.summary);
    info!(end = ?report.end, "done");
    Ok(())
}

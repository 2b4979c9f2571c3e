mod camera;
mod writer;

use anyhow::{Context, Result, bail};
use camera::Camera;
use chroma_watch::{CycleEnd, QuitSignal, WatchConfig, WatchError, WatchPipeline};
use clap::Parser;
use opencv::highgui;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use writer::ClipWriter;

const DEFAULT_LOG_FILTER: &str = "chroma_watch=info,chroma_recorder=info";
const ESCAPE_KEY: i32 = 27;

#[derive(Parser, Debug)]
#[command(name = "chroma_recorder", about = "Record a clip when a colored object moves")]
struct Args {
    /// YAML config file. Built-in defaults are used when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Where to write the clip.
    #[arg(long, value_name = "PATH")]
    output: Option<String>,
    /// GStreamer capture pipeline ending in appsink.
    #[arg(long, value_name = "PIPELINE")]
    pipeline: Option<String>,
    /// Run without a preview window. Escape cannot be read; stop with Ctrl-C.
    #[arg(long)]
    headless: bool,
}

/// Escape in the preview window ends the program.
struct EscapeKey {
    enabled: bool,
}

impl QuitSignal for EscapeKey {
    fn should_quit(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        match highgui::wait_key(1) {
            Ok(key) => key == ESCAPE_KEY,
            Err(err) => {
                warn!(%err, "key poll failed");
                false
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();
    let args = Args::parse();
    let config = load_config(&args)?;
    run(config)
}

fn load_config(args: &Args) -> Result<WatchConfig> {
    let mut config = match &args.config {
        Some(path) => WatchConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => WatchConfig::default(),
    };
    if let Some(output) = &args.output {
        config.output_path = output.clone();
    }
    if let Some(pipeline) = &args.pipeline {
        config.capture.pipeline = pipeline.clone();
    }
    if args.headless {
        config.show_preview = false;
    }
    config.validate()?;
    Ok(config)
}

fn run(config: WatchConfig) -> Result<()> {
    let pipeline = WatchPipeline::new(&config)?;
    let mut camera = Camera::open(&config.capture.pipeline, config.show_preview)?;
    let mut quit = EscapeKey {
        enabled: config.show_preview,
    };

    info!(
        colors = config.colors.len(),
        threshold_px = config.motion_threshold_px,
        quiet_period_secs = config.quiet_period_secs,
        clip_frames = pipeline.max_recording_frames(),
        "ready"
    );

    let stdin = io::stdin();
    loop {
        print!("Press Enter to start one detection/recording cycle...");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            info!("stdin closed, exiting");
            return Ok(());
        }

        let sink = ClipWriter::new(&config.output_path, config.fourcc_chars());
        let mut cycle = pipeline.begin_cycle(sink);
        match cycle.run(&mut camera, &mut quit) {
            Ok(CycleEnd::ClipComplete { frames_written }) => {
                info!(frames_written, path = %config.output_path, "clip saved");
            }
            Ok(CycleEnd::Quit) => return Ok(()),
            Err(WatchError::SourceDisconnected) => bail!("Camera disconnected!"),
            Err(err) => return Err(err).context("Detection cycle failed"),
        }
    }
}

//! ppe_monitor - PPE compliance monitor
//!
//! This binary:
//! 1. Loads config (file named by PPE_CONFIG or --config, then PPE_* env vars)
//! 2. Opens a frame source (stub://<name> or a local image directory)
//! 3. Runs perception every `stride` frames (stub models or a replay script)
//! 4. Journals debounced violations and saves annotated snapshots
//! 5. Writes the session summary on end of stream or Ctrl-C

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ppe_sentinel::{
    open_source, Monitor, MonitorConfig, Perception, PpeCategory, ReplayBackend, Session,
    SourceConfig, StubBackend,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Frame source: stub://<name> or a directory of images.
    #[arg(long, env = "PPE_SOURCE", default_value = "stub://camera")]
    source: String,
    /// Config file (.toml, otherwise JSON).
    #[arg(long, env = "PPE_CONFIG")]
    config: Option<PathBuf>,
    /// JSON-lines perception recording to replay instead of the stub models.
    #[arg(long, env = "PPE_REPLAY")]
    replay: Option<PathBuf>,
    /// Synthetic frame width.
    #[arg(long, default_value_t = 640)]
    width: u32,
    /// Synthetic frame height.
    #[arg(long, default_value_t = 480)]
    height: u32,
    /// Synthetic frame rate (0 = unpaced).
    #[arg(long, default_value_t = 10)]
    fps: u32,
    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,
    /// Run perception every N frames (overrides config).
    #[arg(long)]
    stride: Option<u32>,
    /// Seconds between violation events (overrides config).
    #[arg(long)]
    cooldown_secs: Option<f64>,
    /// Treat a category as detected regardless of perception (repeatable).
    #[arg(long = "force", value_name = "CATEGORY")]
    force: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = MonitorConfig::load_from(args.config.as_deref())?;
    if let Some(stride) = args.stride {
        config.inference.stride = stride;
    }
    if let Some(secs) = args.cooldown_secs {
        if !secs.is_finite() || secs < 0.0 {
            return Err(anyhow!("--cooldown-secs must be a non-negative number"));
        }
        config.cooldown = Duration::from_secs_f64(secs);
    }
    let forced = args
        .force
        .iter()
        .map(|name| name.parse::<PpeCategory>())
        .collect::<Result<Vec<_>>>()?;
    config.validate()?;

    let mut source = open_source(SourceConfig {
        uri: args.source.clone(),
        width: args.width,
        height: args.height,
        target_fps: args.fps,
        max_frames: args.max_frames,
    })?;

    let mut perception = match &args.replay {
        Some(path) => {
            let replay =
                ReplayBackend::load(path)?.with_threshold(config.inference.detection_confidence);
            log::info!(
                "replaying {} recorded frames from {}",
                replay.frame_count(),
                path.display()
            );
            Perception::new(Box::new(replay.clone()), Box::new(replay))
        }
        None => Perception::new(Box::new(StubBackend::new()), Box::new(StubBackend::new())),
    };
    perception.warm_up()?;

    let mut session = Session::start(&config)?;
    for category in forced {
        session.set_override(category, true);
    }
    let mut monitor = Monitor::from_config(&config);

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        handler_stop.store(true, Ordering::SeqCst);
    })
    .map_err(|e| anyhow!("error setting Ctrl-C handler: {}", e))?;

    let stats = monitor.run(source.as_mut(), &mut perception, &mut session, &stop)?;

    println!(
        "Session started: {}",
        session.started_at().format("%Y-%m-%d %H:%M:%S")
    );
    println!("Frames processed: {}", stats.frames);
    println!("Inference runs: {}", stats.inference_runs);
    println!("Perception failures: {}", stats.perception_failures);
    println!("Total violations: {}", session.violation_count());
    println!("Violation log: {}", session.journal_path().display());
    if session.persistence_failures() > 0 {
        log::warn!(
            "{} journal/snapshot writes failed during this session",
            session.persistence_failures()
        );
    }
    Ok(())
}

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use crossbeam::channel::{bounded, RecvTimeoutError};

use motion_sense_rs::capture::CaptureWriter;
use motion_sense_rs::live_status::{LiveStatus, LIVE_STATUS_FILE};
use motion_sense_rs::sources::{spawn_replay, spawn_synthetic, SyntheticDevice};
use motion_sense_rs::{spawn_worker, ConsumerState, MonitorConfig, MonitorError, RawReport, WorkerMessage};

#[derive(Parser, Debug)]
#[command(name = "motion_sense")]
#[command(about = "Orientation, vibration spectrum and impact detection from raw IMU reports", long_about = None)]
struct Args {
    /// Duration in seconds (0 = until the source ends; Ctrl-C exits without a final status)
    #[arg(long, default_value = "0")]
    duration: u64,

    /// Replay a capture file instead of the synthetic device
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Pace replay by recorded timestamps
    #[arg(long, requires = "replay")]
    realtime: bool,

    /// Record the live report stream to this capture (.jsonl or .jsonl.gz)
    #[arg(long, conflicts_with = "replay")]
    record: Option<PathBuf>,

    /// Output directory for live_status.json
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => MonitorConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => MonitorConfig::default(),
    };
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }

    log::info!("[{}] motion_sense starting", ts_now());
    log::info!("  Duration: {} seconds (0=until source ends)", args.duration);
    log::info!("  Source: {}", args.replay.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "synthetic".into()));
    log::info!("  Output Dir: {}", config.output_dir.display());

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;
    let status_path = config.output_dir.join(LIVE_STATUS_FILE);

    let (report_tx, report_rx) = bounded::<RawReport>(config.report_queue_capacity);
    let (out_tx, out_rx) = bounded::<WorkerMessage>(config.output_queue_capacity);
    let (stop_tx, stop_rx) = bounded::<()>(1);

    let worker = spawn_worker(report_rx, out_tx)?;

    // Each source holds the only report sender; the worker ends when it does.
    enum SourceHandle {
        Live(std::thread::JoinHandle<motion_sense_rs::sources::SourceStats>),
        Replay(std::thread::JoinHandle<motion_sense_rs::Result<motion_sense_rs::sources::SourceStats>>),
    }
    let source = match &args.replay {
        Some(path) => SourceHandle::Replay(
            spawn_replay(path.clone(), report_tx, stop_rx, args.realtime)
                .with_context(|| format!("opening capture {}", path.display()))?,
        ),
        None => {
            let recorder = match &args.record {
                Some(path) => Some(
                    CaptureWriter::create(path).with_context(|| format!("creating capture {}", path.display()))?,
                ),
                None => None,
            };
            SourceHandle::Live(spawn_synthetic(SyntheticDevice::from_config(&config), report_tx, stop_rx, recorder)?)
        }
    };

    // ─── Consumer loop ───
    let started = Utc::now();
    let status_every = Duration::try_from_secs_f64(config.status_interval_secs)
        .map_err(|e| MonitorError::InvalidConfig(format!("status_interval_secs: {}", e)))?;
    let mut state = ConsumerState::new();
    let mut last_status = std::time::Instant::now();

    loop {
        if args.duration > 0 && Utc::now().signed_duration_since(started).num_seconds() as u64 >= args.duration {
            log::info!("[{}] Duration reached, stopping...", ts_now());
            break;
        }

        match out_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(msg) => {
                if let Some(ev) = state.apply(msg) {
                    log::info!("[event] {} mag={:.4} {:?}", ev.severity, ev.magnitude, ev.sources.labels());
                }
                state.drain(&out_rx);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                log::info!("[{}] Source exhausted, stopping...", ts_now());
                break;
            }
        }

        if last_status.elapsed() >= status_every {
            let status = LiveStatus::from_consumer(&state, started, config.status_recent_events);
            if let Err(e) = status.save(&status_path) {
                log::warn!("[status] write failed: {}", e);
            }
            if let Some(o) = &status.orientation {
                log::info!(
                    "[status] roll={:.1} pitch={:.1} yaw={:.1} bands={:.2?} events={}",
                    o.roll,
                    o.pitch,
                    o.yaw,
                    status.spectrum_bands,
                    status.events_received
                );
            }
            last_status = std::time::Instant::now();
        }
    }

    // ─── Shutdown ───
    drop(stop_tx);
    let source_stats = match source {
        SourceHandle::Live(h) => h.join().map_err(|_| MonitorError::ThreadPanicked("synthetic-source"))?,
        SourceHandle::Replay(h) => h.join().map_err(|_| MonitorError::ThreadPanicked("replay-source"))??,
    };
    let pipeline_stats = worker.join().map_err(|_| MonitorError::ThreadPanicked("pipeline-worker"))?;
    state.drain(&out_rx);

    let final_status = LiveStatus::from_consumer(&state, started, config.status_recent_events)
        .with_pipeline_stats(pipeline_stats);
    final_status.save(&status_path)?;

    println!("\n=== Final Stats ===");
    println!("Reports sent: {} (dropped at source: {})", source_stats.sent, source_stats.dropped);
    println!("{}", serde_json::to_string_pretty(&pipeline_stats)?);
    println!("Events logged: {}", state.events().len());
    println!("Status written to {}", status_path.display());

    Ok(())
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}

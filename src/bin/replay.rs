use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use motion_sense_rs::capture::CaptureReader;
use motion_sense_rs::{EventRecord, Pipeline, Severity};

/// Run the pipeline synchronously over a capture and print a JSON summary.
#[derive(Parser, Debug)]
struct Args {
    /// Path to a capture (.jsonl or .jsonl.gz)
    #[arg(long)]
    log: PathBuf,

    /// Include every event record in the summary
    #[arg(long, default_value_t = false)]
    events: bool,

    /// Stop after this many reports (0 = all)
    #[arg(long, default_value_t = 0)]
    limit: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let reader = CaptureReader::open(&args.log).with_context(|| format!("opening {}", args.log.display()))?;
    let mut pipeline = Pipeline::new();
    let mut events: Vec<EventRecord> = Vec::new();
    let mut snapshots = 0u64;
    let mut first_ts: Option<f64> = None;
    let mut last_ts = 0.0;
    let wall = Instant::now();

    for (i, report) in reader.enumerate() {
        if args.limit > 0 && i as u64 >= args.limit {
            break;
        }
        let report = report.with_context(|| format!("reading {}", args.log.display()))?;
        first_ts.get_or_insert(report.timestamp);
        last_ts = report.timestamp;

        let outcome = pipeline.feed(&report);
        if outcome.snapshot.is_some() {
            snapshots += 1;
        }
        if let Some(ev) = outcome.event {
            log::info!("[replay] t={:.3} {} mag={:.4}", ev.timestamp, ev.severity, ev.magnitude);
            events.push(ev);
        }
    }

    let mut by_severity: BTreeMap<&'static str, u64> =
        Severity::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    for ev in &events {
        *by_severity.entry(ev.severity.as_str()).or_default() += 1;
    }

    let mut summary = json!({
        "log": args.log.display().to_string(),
        "duration_secs": first_ts.map(|t0| last_ts - t0).unwrap_or(0.0),
        "processing_secs": wall.elapsed().as_secs_f64(),
        "stats": pipeline.stats(),
        "snapshots": snapshots,
        "events_by_severity": by_severity,
        "max_severity": events.iter().map(|e| e.severity).max(),
        "final_orientation": pipeline.orientation(),
        "final_spectrum": pipeline.spectrum_bands(),
        "ambient": pipeline.ambient(),
        "lid_angle_deg": pipeline.lid_angle_deg(),
    });
    if args.events {
        summary["events"] = serde_json::to_value(&events)?;
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

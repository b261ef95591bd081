// dispatch.rs: Worker thread and consumer-side state
//
// One worker owns the Pipeline and processes reports in arrival order. Its
// outputs cross to the consumer over a bounded channel with try_send: when the
// consumer falls behind, outputs are dropped and counted, never waited on.

use std::thread::{self, JoinHandle};

use crossbeam::channel::{Receiver, Sender, TrySendError};

use crate::error::{MonitorError, Result};
use crate::events::{EventLog, EventRecord};
use crate::pipeline::{Pipeline, PipelineStats, Snapshot};
use crate::types::RawReport;

pub enum WorkerMessage {
    Snapshot(Box<Snapshot>),
    Event(EventRecord),
}

// ─── Worker ──────────────────────────────────────────────────────────────────

/// Start the worker thread. It runs until every report sender is dropped and
/// returns the final statistics.
pub fn spawn_worker(
    reports: Receiver<RawReport>,
    output: Sender<WorkerMessage>,
) -> Result<JoinHandle<PipelineStats>> {
    thread::Builder::new()
        .name("pipeline-worker".into())
        .spawn(move || run_worker(Pipeline::new(), reports, output))
        .map_err(|_| MonitorError::ThreadSpawn("pipeline-worker"))
}

/// Worker body, usable on the current thread.
pub fn run_worker(
    mut pipeline: Pipeline,
    reports: Receiver<RawReport>,
    output: Sender<WorkerMessage>,
) -> PipelineStats {
    log::info!("[worker] started");
    let mut consumer_gone = false;

    for report in reports.iter() {
        let outcome = pipeline.feed(&report);
        if outcome.is_empty() {
            continue;
        }
        // Event before the snapshot of the same sample
        if let Some(event) = outcome.event {
            hand_off(&output, WorkerMessage::Event(event), &mut pipeline, &mut consumer_gone);
        }
        if let Some(snapshot) = outcome.snapshot {
            hand_off(&output, WorkerMessage::Snapshot(Box::new(snapshot)), &mut pipeline, &mut consumer_gone);
        }
    }

    let stats = *pipeline.stats();
    log::info!(
        "[worker] stopped: {} reports, {} samples, {} events, {} handoffs dropped",
        stats.reports_received.total(),
        stats.samples_processed,
        stats.events_produced,
        stats.handoffs_dropped
    );
    stats
}

fn hand_off(output: &Sender<WorkerMessage>, msg: WorkerMessage, pipeline: &mut Pipeline, consumer_gone: &mut bool) {
    match output.try_send(msg) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            let stats = pipeline.stats_mut();
            stats.handoffs_dropped += 1;
            if stats.handoffs_dropped % 100 == 1 {
                log::warn!("[worker] consumer queue full, {} handoffs dropped", stats.handoffs_dropped);
            }
        }
        Err(TrySendError::Disconnected(_)) => {
            pipeline.stats_mut().handoffs_dropped += 1;
            if !*consumer_gone {
                log::warn!("[worker] consumer disconnected, outputs discarded");
                *consumer_gone = true;
            }
        }
    }
}

// ─── Consumer ────────────────────────────────────────────────────────────────

/// What the presentation side sees: the newest snapshot and the event log.
#[derive(Debug, Default)]
pub struct ConsumerState {
    latest: Option<Snapshot>,
    events: EventLog,
    snapshots_received: u64,
    events_received: u64,
}

impl ConsumerState {
    pub fn new() -> Self {
        Self {
            events: EventLog::new(),
            ..Default::default()
        }
    }

    /// Apply one message. Returns the event if it was one.
    pub fn apply(&mut self, msg: WorkerMessage) -> Option<&EventRecord> {
        match msg {
            WorkerMessage::Snapshot(snapshot) => {
                self.latest = Some(*snapshot);
                self.snapshots_received += 1;
                None
            }
            WorkerMessage::Event(event) => {
                self.events.push(event);
                self.events_received += 1;
                self.events.latest()
            }
        }
    }

    /// Apply everything currently queued without blocking.
    pub fn drain(&mut self, rx: &Receiver<WorkerMessage>) -> usize {
        let mut n = 0;
        for msg in rx.try_iter() {
            if let Some(ev) = self.apply(msg) {
                log::info!("[event] {} mag={:.4} {:?}", ev.severity, ev.magnitude, ev.sources.labels());
            }
            n += 1;
        }
        n
    }

    pub fn latest_snapshot(&self) -> Option<&Snapshot> {
        self.latest.as_ref()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn snapshots_received(&self) -> u64 {
        self.snapshots_received
    }

    pub fn events_received(&self) -> u64 {
        self.events_received
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::encode_motion;
    use crate::types::{SensorTag, Vec3f};
    use crossbeam::channel::bounded;

    fn motion_reports(samples: usize) -> Vec<RawReport> {
        let accel = encode_motion(&Vec3f::new(0.0, 0.0, -1.0));
        let gyro = encode_motion(&Vec3f::zeros());
        let mut out = Vec::new();
        for i in 0..samples * 8 {
            let ts = i as f64 * 0.001;
            out.push(RawReport::new(SensorTag::Accel, ts, accel.clone()));
            out.push(RawReport::new(SensorTag::Gyro, ts, gyro.clone()));
        }
        out
    }

    #[test]
    fn test_worker_drops_when_consumer_is_slow() {
        let (report_tx, report_rx) = bounded(100_000);
        let (out_tx, out_rx) = bounded(2);
        for r in motion_reports(100) {
            report_tx.send(r).unwrap();
        }
        drop(report_tx);

        let stats = spawn_worker(report_rx, out_tx).unwrap().join().unwrap();
        assert_eq!(stats.samples_processed, 100);
        assert_eq!(stats.snapshots_produced, 10);
        assert_eq!(out_rx.len(), 2);
        assert_eq!(stats.handoffs_dropped, 8);
    }

    #[test]
    fn test_worker_survives_disconnected_consumer() {
        let (report_tx, report_rx) = bounded(100_000);
        let (out_tx, out_rx) = bounded(4);
        drop(out_rx);
        for r in motion_reports(20) {
            report_tx.send(r).unwrap();
        }
        drop(report_tx);
        let stats = run_worker(Pipeline::new(), report_rx, out_tx);
        assert_eq!(stats.samples_processed, 20);
        assert_eq!(stats.handoffs_dropped, 2);
    }

    #[test]
    fn test_consumer_keeps_latest_snapshot() {
        let (report_tx, report_rx) = bounded(100_000);
        let (out_tx, out_rx) = bounded(64);
        for r in motion_reports(30) {
            report_tx.send(r).unwrap();
        }
        drop(report_tx);
        run_worker(Pipeline::new(), report_rx, out_tx);

        let mut state = ConsumerState::new();
        assert_eq!(state.drain(&out_rx), 3);
        assert_eq!(state.snapshots_received(), 3);
        assert_eq!(state.latest_snapshot().unwrap().sample_index, 30);
        assert!(state.events().is_empty());
    }
}

// sources.rs: Report producers feeding the worker
//
// Both sources stop when the stop channel fires or is dropped. The live
// (synthetic) source never blocks: when the report queue is full the report is
// dropped and counted.

use std::f32::consts::PI;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender, TryRecvError, TrySendError};
use serde::Serialize;

use crate::capture::{CaptureReader, CaptureWriter};
use crate::config::MonitorConfig;
use crate::decoder::{encode_ambient, encode_hinge, encode_motion};
use crate::error::{MonitorError, Result};
use crate::types::{AmbientReading, RawReport, SensorTag, Vec3f};

/// Motion report rate per channel
pub const MOTION_RATE_HZ: f64 = 800.0;
/// Producer tick; each tick emits one batch per motion channel
pub const TICK: Duration = Duration::from_millis(10);
pub const MOTION_BATCH: usize = 8;
/// Ambient light and hinge angle cadence
pub const SLOW_PERIOD_SECS: f64 = 1.0;

const TAP_DURATION_SECS: f64 = 0.06;
const TAP_RING_HZ: f32 = 40.0;
const TAP_DECAY: f32 = 60.0;

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct SourceStats {
    pub sent: u64,
    pub dropped: u64,
    pub recorded: u64,
}

// ─── Synthetic device ────────────────────────────────────────────────────────

/// Deterministic stand-in for the sensor hub: a device resting on a desk with
/// faint structural hum, slow lid movement and periodic taps.
#[derive(Clone, Debug)]
pub struct SyntheticDevice {
    tap_period_secs: f64,
    tap_amplitude_g: f32,
    motion_index: u64,
    next_slow_at: f64,
}

impl SyntheticDevice {
    pub fn new(tap_period_secs: f64, tap_amplitude_g: f32) -> Self {
        Self {
            tap_period_secs,
            tap_amplitude_g,
            motion_index: 0,
            next_slow_at: 0.0,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.tap_period_secs, config.tap_amplitude_g)
    }

    /// Reports for one tick: `MOTION_BATCH` accel/gyro pairs, plus the slow
    /// channels when due. Timestamps come from the device's own clock.
    pub fn next_batch(&mut self) -> Vec<RawReport> {
        let mut out = Vec::with_capacity(MOTION_BATCH * 2 + 2);
        for _ in 0..MOTION_BATCH {
            let t = self.motion_index as f64 / MOTION_RATE_HZ;
            self.motion_index += 1;
            out.push(RawReport::new(SensorTag::Accel, t, encode_motion(&self.accel_at(t))));
            out.push(RawReport::new(SensorTag::Gyro, t, encode_motion(&self.gyro_at(t))));
        }

        let now = self.motion_index as f64 / MOTION_RATE_HZ;
        if now >= self.next_slow_at {
            self.next_slow_at += SLOW_PERIOD_SECS;
            let ambient = AmbientReading {
                lux: 320.0 + 15.0 * (now as f32 * 0.1).sin(),
                channels: [1200, 980, 640, 210],
            };
            out.push(RawReport::new(SensorTag::AmbientLight, now, encode_ambient(&ambient)));
            let lid = 110.0 + 5.0 * (now * 0.05).sin();
            out.push(RawReport::new(SensorTag::HingeAngle, now, encode_hinge(lid as u16)));
        }
        out
    }

    /// Device clock in seconds
    pub fn now(&self) -> f64 {
        self.motion_index as f64 / MOTION_RATE_HZ
    }

    fn accel_at(&self, t: f64) -> Vec3f {
        let tf = t as f32;
        let hum = 0.0002 * (2.0 * PI * 50.0 * tf).sin();
        let sway = 0.01 * (2.0 * PI * 0.05 * tf).sin();
        Vec3f::new(sway, 0.5 * sway, -1.0 + hum + self.tap_at(t))
    }

    fn gyro_at(&self, t: f64) -> Vec3f {
        let tf = t as f32;
        Vec3f::new(
            0.02 * (2.0 * PI * 0.3 * tf).sin(),
            0.02 * (2.0 * PI * 0.2 * tf).cos(),
            0.0,
        )
    }

    fn tap_at(&self, t: f64) -> f32 {
        if self.tap_period_secs <= 0.0 {
            return 0.0;
        }
        let since = t % self.tap_period_secs;
        // First tap one period in, so detector baselines have settled
        if t < self.tap_period_secs || since > TAP_DURATION_SECS {
            return 0.0;
        }
        let s = since as f32;
        self.tap_amplitude_g * (-TAP_DECAY * s).exp() * (2.0 * PI * TAP_RING_HZ * s).sin()
    }
}

// ─── Live synthetic source ───────────────────────────────────────────────────

pub fn spawn_synthetic(
    mut device: SyntheticDevice,
    tx: Sender<RawReport>,
    stop: Receiver<()>,
    mut recorder: Option<CaptureWriter>,
) -> Result<JoinHandle<SourceStats>> {
    thread::Builder::new()
        .name("synthetic-source".into())
        .spawn(move || {
            let ticker = channel::tick(TICK);
            let mut stats = SourceStats::default();
            let mut ticks = 0u64;
            log::info!("[source] synthetic device started");

            'outer: loop {
                crossbeam::select! {
                    recv(stop) -> _ => break 'outer,
                    recv(ticker) -> _ => {}
                }
                for report in device.next_batch() {
                    if let Some(writer) = recorder.as_mut() {
                        match writer.write(&report) {
                            Ok(()) => stats.recorded += 1,
                            Err(e) => {
                                log::warn!("[source] recording stopped: {}", e);
                                recorder = None;
                            }
                        }
                    }
                    match tx.try_send(report) {
                        Ok(()) => stats.sent += 1,
                        Err(TrySendError::Full(_)) => {
                            // Worker behind; drop this report
                            stats.dropped += 1;
                        }
                        Err(TrySendError::Disconnected(_)) => {
                            log::warn!("[source] worker gone after {} reports", stats.sent);
                            break 'outer;
                        }
                    }
                }
                ticks += 1;
                if ticks % 500 == 0 {
                    log::debug!("[source] {} sent, {} dropped", stats.sent, stats.dropped);
                }
            }

            if let Some(writer) = recorder {
                match writer.finish() {
                    Ok(n) => log::info!("[source] capture closed ({} reports)", n),
                    Err(e) => log::warn!("[source] failed to close capture: {}", e),
                }
            }
            log::info!(
                "[source] stopped at t={:.2}s: {} sent, {} dropped",
                device.now(),
                stats.sent,
                stats.dropped
            );
            stats
        })
        .map_err(|_| MonitorError::ThreadSpawn("synthetic-source"))
}

// ─── Replay source ───────────────────────────────────────────────────────────

/// Push a capture file into the worker. Sends block, so nothing is lost; with
/// `realtime` set, reports are paced by their recorded timestamps.
pub fn spawn_replay(
    path: PathBuf,
    tx: Sender<RawReport>,
    stop: Receiver<()>,
    realtime: bool,
) -> Result<JoinHandle<Result<SourceStats>>> {
    let mut reader = CaptureReader::open(&path)?;
    thread::Builder::new()
        .name("replay-source".into())
        .spawn(move || {
            let mut stats = SourceStats::default();
            let started = Instant::now();
            let mut first_ts: Option<f64> = None;
            log::info!("[source] replaying {}", path.display());

            while let Some(report) = reader.next() {
                let report = report?;
                if !matches!(stop.try_recv(), Err(TryRecvError::Empty)) {
                    log::info!("[source] replay interrupted");
                    break;
                }
                if realtime {
                    let t0 = *first_ts.get_or_insert(report.timestamp);
                    let due = Duration::try_from_secs_f64((report.timestamp - t0).max(0.0)).map_err(|e| {
                        MonitorError::CaptureFormat {
                            line: reader.line(),
                            reason: format!("timestamp {} cannot be paced: {}", report.timestamp, e),
                        }
                    })?;
                    if let Some(wait) = due.checked_sub(started.elapsed()) {
                        thread::sleep(wait);
                    }
                }
                if tx.send(report).is_err() {
                    log::warn!("[source] worker gone during replay");
                    break;
                }
                stats.sent += 1;
            }
            log::info!("[source] replay finished: {} reports", stats.sent);
            Ok(stats)
        })
        .map_err(|_| MonitorError::ThreadSpawn("replay-source"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{decode, DecodedReport};
    use crossbeam::channel::bounded;

    #[test]
    fn test_batch_layout() {
        let mut dev = SyntheticDevice::new(0.0, 0.0);
        let batch = dev.next_batch();
        let accel = batch.iter().filter(|r| r.tag == SensorTag::Accel).count();
        let gyro = batch.iter().filter(|r| r.tag == SensorTag::Gyro).count();
        assert_eq!((accel, gyro), (MOTION_BATCH, MOTION_BATCH));
        // Slow channels are due on the very first tick
        assert!(batch.iter().any(|r| r.tag == SensorTag::AmbientLight));
        assert!(batch.iter().any(|r| r.tag == SensorTag::HingeAngle));
        assert!(dev.next_batch().iter().all(|r| matches!(r.tag, SensorTag::Accel | SensorTag::Gyro)));
    }

    #[test]
    fn test_reports_decode() {
        let mut dev = SyntheticDevice::new(0.0, 0.0);
        for r in dev.next_batch() {
            let decoded = decode(r.tag, &r.data).expect("synthetic reports are well formed");
            if let DecodedReport::Accel(a) = decoded {
                assert!((a.z + 1.0).abs() < 0.01);
            }
        }
    }

    #[test]
    fn test_slow_channels_once_per_second() {
        let mut dev = SyntheticDevice::new(0.0, 0.0);
        let ticks = (3.0 * MOTION_RATE_HZ) as usize / MOTION_BATCH;
        let ambient: usize = (0..ticks)
            .map(|_| dev.next_batch().iter().filter(|r| r.tag == SensorTag::AmbientLight).count())
            .sum();
        // First tick, then t = 1, 2, 3
        assert_eq!(ambient, 4);
        assert!((dev.now() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_tap_only_after_first_period() {
        let dev = SyntheticDevice::new(1.0, 0.3);
        assert_eq!(dev.tap_at(0.01), 0.0);
        assert!(dev.tap_at(1.005).abs() > 0.01);
        assert_eq!(dev.tap_at(1.5), 0.0);
    }

    #[test]
    fn test_realtime_replay_rejects_unpaceable_timestamp() {
        let path = std::env::temp_dir().join(format!("motion_sense_{}_huge_t.jsonl", std::process::id()));
        std::fs::write(
            &path,
            "{\"t\":0.0,\"tag\":\"gyro\",\"data\":[]}\n{\"t\":1e300,\"tag\":\"gyro\",\"data\":[]}\n",
        )
        .unwrap();
        let (tx, rx) = bounded(16);
        let (_stop_tx, stop_rx) = bounded::<()>(1);
        let result = spawn_replay(path.clone(), tx, stop_rx, true).unwrap().join().unwrap();
        std::fs::remove_file(&path).ok();

        match result {
            Err(MonitorError::CaptureFormat { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected format error, got {other:?}"),
        }
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_synthetic_thread_stops_on_signal() {
        let (tx, rx) = bounded(64);
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let handle = spawn_synthetic(SyntheticDevice::new(0.0, 0.0), tx, stop_rx, None).unwrap();
        // Queue is tiny and never drained: reports are dropped, not blocked on
        thread::sleep(Duration::from_millis(100));
        drop(stop_tx);
        let stats = handle.join().unwrap();
        assert_eq!(stats.sent, 64);
        assert!(stats.dropped > 0);
        assert_eq!(rx.len(), 64);
    }
}

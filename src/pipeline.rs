// pipeline.rs: Per-report processing context
//
// Owns every piece of mutable state between a raw report and its outputs:
// decimation, attitude, vibration conditioning, spectrum, detectors, history.
// Nothing here touches threads, channels or files, so the same context runs
// under the worker thread, the replay binary and the tests.

use serde::{Deserialize, Serialize};

use crate::assembler::{AssembledSample, SampleAssembler};
use crate::decoder::{self, DecodedReport};
use crate::detectors::DetectorEnsemble;
use crate::events::{classify, EventRecord};
use crate::filters::{MahonyAhrs, SpectrumTracker, VibrationConditioner, BAND_COUNT};
use crate::history::HistoryRing;
use crate::types::{to_triple, AmbientReading, Orientation, RawReport, SensorTag, Triple};

/// Entries kept per motion history ring
pub const HISTORY_LEN: usize = 500;
/// One snapshot per this many processed samples
pub const SNAPSHOT_INTERVAL: u64 = 10;

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// Immutable copy of the presentation-facing state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub timestamp: f64,
    pub sample_index: u64,
    /// Oldest first, in g
    pub accel_history: Vec<Triple>,
    /// Oldest first, in deg/s
    pub gyro_history: Vec<Triple>,
    pub orientation: Orientation,
    /// (w, x, y, z)
    pub quaternion: [f64; 4],
    pub spectrum_bands: [f32; BAND_COUNT],
    pub ambient: Option<AmbientReading>,
    pub lid_angle_deg: Option<u16>,
}

// ─── Statistics ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCounts {
    pub accel: u64,
    pub gyro: u64,
    pub ambient_light: u64,
    pub hinge_angle: u64,
}

impl ReportCounts {
    fn bump(&mut self, tag: SensorTag) {
        match tag {
            SensorTag::Accel => self.accel += 1,
            SensorTag::Gyro => self.gyro += 1,
            SensorTag::AmbientLight => self.ambient_light += 1,
            SensorTag::HingeAngle => self.hinge_angle += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.accel + self.gyro + self.ambient_light + self.hinge_angle
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub reports_received: ReportCounts,
    pub malformed_dropped: u64,
    pub samples_processed: u64,
    pub snapshots_produced: u64,
    pub events_produced: u64,
    /// Snapshots/events lost because the consumer queue was full
    pub handoffs_dropped: u64,
}

/// What one report produced, if anything.
#[derive(Clone, Debug, Default)]
pub struct FeedOutcome {
    pub snapshot: Option<Snapshot>,
    pub event: Option<EventRecord>,
}

impl FeedOutcome {
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_none() && self.event.is_none()
    }
}

// ─── The pipeline context ────────────────────────────────────────────────────

pub struct Pipeline {
    assembler: SampleAssembler,
    ahrs: MahonyAhrs,
    conditioner: VibrationConditioner,
    spectrum: SpectrumTracker,
    ensemble: DetectorEnsemble,

    accel_history: HistoryRing<Triple, HISTORY_LEN>,
    gyro_history: HistoryRing<Triple, HISTORY_LEN>,

    // Cached from non-pacing channels
    ambient: Option<AmbientReading>,
    lid_angle_deg: Option<u16>,

    last_timestamp: f64,
    last_magnitude: f32,
    stats: PipelineStats,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            assembler: SampleAssembler::new(),
            ahrs: MahonyAhrs::new(),
            conditioner: VibrationConditioner::new(),
            spectrum: SpectrumTracker::new(),
            ensemble: DetectorEnsemble::new(),
            accel_history: HistoryRing::new(),
            gyro_history: HistoryRing::new(),
            ambient: None,
            lid_angle_deg: None,
            last_timestamp: 0.0,
            last_magnitude: 0.0,
            stats: PipelineStats::default(),
        }
    }

    /// Decode one raw report and run whatever stages it triggers.
    pub fn feed(&mut self, report: &RawReport) -> FeedOutcome {
        self.stats.reports_received.bump(report.tag);

        let Some(decoded) = decoder::decode(report.tag, &report.data) else {
            self.stats.malformed_dropped += 1;
            log::trace!(
                "[pipeline] dropped malformed {} report ({} bytes)",
                report.tag.as_str(),
                report.data.len()
            );
            return FeedOutcome::default();
        };

        match decoded {
            DecodedReport::Accel(v) => {
                self.assembler.push_accel(v);
                FeedOutcome::default()
            }
            DecodedReport::Gyro(v) => match self.assembler.push_gyro(v, report.timestamp) {
                Some(sample) => self.process_sample(&sample),
                None => FeedOutcome::default(),
            },
            DecodedReport::AmbientLight(reading) => {
                self.ambient = Some(reading);
                FeedOutcome::default()
            }
            DecodedReport::HingeAngle(deg) => {
                self.lid_angle_deg = Some(deg);
                FeedOutcome::default()
            }
        }
    }

    /// Run one decimated sample through attitude, conditioning, spectrum,
    /// detection and history.
    pub fn process_sample(&mut self, assembled: &AssembledSample) -> FeedOutcome {
        let sample = &assembled.sample;

        self.ahrs.update(&sample.accel, &sample.gyro, assembled.dt);

        let magnitude = self.conditioner.update(&sample.accel);
        self.spectrum.update(magnitude);
        let sources = self.ensemble.update(magnitude);
        let event = classify(sample.timestamp, magnitude, sources);
        if let Some(ev) = &event {
            self.stats.events_produced += 1;
            log::debug!(
                "[pipeline] {} mag={:.4} sources={:?}",
                ev.severity,
                ev.magnitude,
                ev.sources.labels()
            );
        }

        self.accel_history.push(to_triple(&sample.accel));
        self.gyro_history.push(to_triple(&sample.gyro));
        self.last_timestamp = sample.timestamp;
        self.last_magnitude = magnitude;
        self.stats.samples_processed += 1;

        let snapshot = if self.stats.samples_processed % SNAPSHOT_INTERVAL == 0 {
            self.stats.snapshots_produced += 1;
            Some(self.snapshot())
        } else {
            None
        };

        FeedOutcome { snapshot, event }
    }

    /// Build a snapshot of the current state.
    pub fn snapshot(&self) -> Snapshot {
        let q = self.ahrs.quaternion();
        Snapshot {
            timestamp: self.last_timestamp,
            sample_index: self.stats.samples_processed,
            accel_history: self.accel_history.to_vec(),
            gyro_history: self.gyro_history.to_vec(),
            orientation: self.ahrs.orientation(),
            quaternion: [q.w, q.i, q.j, q.k],
            spectrum_bands: self.spectrum.bands(),
            ambient: self.ambient,
            lid_angle_deg: self.lid_angle_deg,
        }
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut PipelineStats {
        &mut self.stats
    }

    pub fn orientation(&self) -> Orientation {
        self.ahrs.orientation()
    }

    pub fn spectrum_bands(&self) -> [f32; BAND_COUNT] {
        self.spectrum.bands()
    }

    /// Conditioned magnitude of the last processed sample
    pub fn last_magnitude(&self) -> f32 {
        self.last_magnitude
    }

    pub fn ambient(&self) -> Option<AmbientReading> {
        self.ambient
    }

    pub fn lid_angle_deg(&self) -> Option<u16> {
        self.lid_angle_deg
    }
}

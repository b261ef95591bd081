use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dispatch::ConsumerState;
use crate::error::Result;
use crate::events::{EventRecord, Severity};
use crate::filters::BAND_COUNT;
use crate::pipeline::PipelineStats;
use crate::types::{AmbientReading, Orientation};

pub const LIVE_STATUS_FILE: &str = "live_status.json";

/// Consumer-side status, rewritten periodically for external dashboards.
#[derive(Serialize, Clone, Debug)]
pub struct LiveStatus {
    pub updated_at: String,
    pub uptime_seconds: f64,
    pub snapshots_received: u64,
    pub events_received: u64,
    pub sample_index: u64,
    pub orientation: Option<Orientation>,
    pub spectrum_bands: [f32; BAND_COUNT],
    pub ambient: Option<AmbientReading>,
    pub lid_angle_deg: Option<u16>,
    /// Highest severity among the logged events
    pub max_severity: Option<Severity>,
    /// Newest first
    pub recent_events: Vec<EventRecord>,
    /// Worker totals, only known once the worker has stopped
    pub pipeline: Option<PipelineStats>,
}

impl LiveStatus {
    pub fn from_consumer(state: &ConsumerState, started_at: DateTime<Utc>, recent_events: usize) -> Self {
        let now = Utc::now();
        let snap = state.latest_snapshot();
        Self {
            updated_at: now.to_rfc3339(),
            uptime_seconds: (now - started_at).num_milliseconds() as f64 / 1000.0,
            snapshots_received: state.snapshots_received(),
            events_received: state.events_received(),
            sample_index: snap.map(|s| s.sample_index).unwrap_or(0),
            orientation: snap.map(|s| s.orientation),
            spectrum_bands: snap.map(|s| s.spectrum_bands).unwrap_or([0.0; BAND_COUNT]),
            ambient: snap.and_then(|s| s.ambient),
            lid_angle_deg: snap.and_then(|s| s.lid_angle_deg),
            max_severity: state.events().iter().map(|e| e.severity).max(),
            recent_events: state.events().recent(recent_events),
            pipeline: None,
        }
    }

    pub fn with_pipeline_stats(mut self, stats: PipelineStats) -> Self {
        self.pipeline = Some(stats);
        self
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::detectors::Sources;

/// Magnitudes at or below this (g) never produce a record
pub const MAGNITUDE_GATE: f32 = 0.002;
pub const EVENT_LOG_CAPACITY: usize = 200;

/// Event severity, ordered lowest to highest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    MicroVib,
    VibLegere,
    Vibration,
    MicroChoc,
    ChocMoyen,
    ChocMajeur,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Severity::MicroVib,
        Severity::VibLegere,
        Severity::Vibration,
        Severity::MicroChoc,
        Severity::ChocMoyen,
        Severity::ChocMajeur,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::MicroVib => "MICRO_VIB",
            Severity::VibLegere => "VIB_LEGERE",
            Severity::Vibration => "VIBRATION",
            Severity::MicroChoc => "MICRO_CHOC",
            Severity::ChocMoyen => "CHOC_MOYEN",
            Severity::ChocMajeur => "CHOC_MAJEUR",
        }
    }

    /// Ladder over the fired detectors, highest severity first.
    pub fn from_sources(magnitude: f32, sources: &Sources) -> Severity {
        let n = sources.count();
        if n >= 4 && magnitude > 0.05 {
            Severity::ChocMajeur
        } else if n >= 3 && magnitude > 0.02 {
            Severity::ChocMoyen
        } else if sources.peak.is_some() && magnitude > 0.005 {
            Severity::MicroChoc
        } else if (sources.sta_lta || sources.cusum) && magnitude > 0.003 {
            Severity::Vibration
        } else if magnitude > 0.001 {
            Severity::VibLegere
        } else {
            Severity::MicroVib
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventRecord {
    pub timestamp: f64,
    pub severity: Severity,
    pub magnitude: f32,
    pub sources: Sources,
}

/// Turns one sample's detector verdicts into a record, or nothing.
pub fn classify(timestamp: f64, magnitude: f32, sources: Sources) -> Option<EventRecord> {
    if magnitude <= MAGNITUDE_GATE {
        return None;
    }
    if !sources.any() {
        return None;
    }
    Some(EventRecord {
        timestamp,
        severity: Severity::from_sources(magnitude, &sources),
        magnitude,
        sources,
    })
}

/// Bounded event history, newest first.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    entries: VecDeque<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(EVENT_LOG_CAPACITY),
        }
    }

    pub fn push(&mut self, event: EventRecord) {
        self.entries.push_front(event);
        self.entries.truncate(EVENT_LOG_CAPACITY);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&EventRecord> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> {
        self.entries.iter()
    }

    pub fn recent(&self, n: usize) -> Vec<EventRecord> {
        self.entries.iter().take(n).cloned().collect()
    }
}

use serde::{Deserialize, Serialize};

use crate::history::HistoryRing;

pub const WINDOW: usize = 200;
/// Window size before the detector starts judging samples
pub const MIN_SAMPLES: usize = 20;
/// MAD → σ under a Gaussian assumption
pub const MAD_SCALE: f32 = 1.4826;
/// Deviations below this (g) are sensor noise regardless of σ
pub const NOISE_FLOOR: f32 = 0.001;
const MIN_SIGMA: f32 = 1e-9;

/// Outlier strength, in robust σ units from the window median.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeakTier {
    /// ≥ 2σ
    Micro,
    /// ≥ 3.5σ
    Moyen,
    /// ≥ 5σ
    Fort,
    /// ≥ 8σ
    Majeur,
}

impl PeakTier {
    pub fn from_sigmas(z: f32) -> Option<Self> {
        if z >= 8.0 {
            Some(PeakTier::Majeur)
        } else if z >= 5.0 {
            Some(PeakTier::Fort)
        } else if z >= 3.5 {
            Some(PeakTier::Moyen)
        } else if z >= 2.0 {
            Some(PeakTier::Micro)
        } else {
            None
        }
    }

    /// Source label used in event records
    pub fn label(&self) -> &'static str {
        match self {
            PeakTier::Micro => "PEAK_MICRO",
            PeakTier::Moyen => "PEAK_MOYEN",
            PeakTier::Fort => "PEAK_FORT",
            PeakTier::Majeur => "PEAK_MAJEUR",
        }
    }
}

/// Robust outlier detector: median / MAD over the previous `WINDOW` samples.
///
/// The current sample is judged against the window *before* it is added.
#[derive(Clone, Debug)]
pub struct PeakMadDetector {
    window: HistoryRing<f32, WINDOW>,
    scratch: [f32; WINDOW],
    last_sigma: f32,
}

impl Default for PeakMadDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PeakMadDetector {
    pub fn new() -> Self {
        Self {
            window: HistoryRing::new(),
            scratch: [0.0; WINDOW],
            last_sigma: 0.0,
        }
    }

    pub fn update(&mut self, magnitude: f32) -> Option<PeakTier> {
        let tier = if self.window.len() >= MIN_SAMPLES {
            self.classify(magnitude)
        } else {
            None
        };
        self.window.push(magnitude);
        tier
    }

    fn classify(&mut self, magnitude: f32) -> Option<PeakTier> {
        let n = self.window.len();
        let scratch = &mut self.scratch[..n];
        for (slot, v) in scratch.iter_mut().zip(self.window.iter()) {
            *slot = v;
        }
        let median = median_in_place(scratch);
        for v in scratch.iter_mut() {
            *v = (*v - median).abs();
        }
        let mad = median_in_place(scratch);

        let sigma = MAD_SCALE * mad;
        self.last_sigma = sigma;
        let deviation = (magnitude - median).abs();
        if sigma < MIN_SIGMA || deviation < NOISE_FLOOR {
            return None;
        }
        PeakTier::from_sigmas(deviation / sigma)
    }

    /// Robust σ from the last judged sample
    pub fn last_sigma(&self) -> f32 {
        self.last_sigma
    }
}

/// Sorts `values` and returns the median (mean of the middle pair when even).
fn median_in_place(values: &mut [f32]) -> f32 {
    values.sort_unstable_by(f32::total_cmp);
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        values[n / 2]
    } else {
        0.5 * (values[n / 2 - 1] + values[n / 2])
    }
}

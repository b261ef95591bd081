pub mod cusum;
pub mod kurtosis;
pub mod peak_mad;
pub mod sta_lta;

pub use cusum::CusumDetector;
pub use kurtosis::KurtosisDetector;
pub use peak_mad::{PeakMadDetector, PeakTier};
pub use sta_lta::StaLtaDetector;

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

pub const STA_LTA_LABEL: &str = "STA/LTA";
pub const CUSUM_LABEL: &str = "CUSUM";
pub const KURTOSIS_LABEL: &str = "KURTOSIS";

/// Which detectors fired on a sample. Serializes as the ordered label list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sources {
    pub sta_lta: bool,
    pub cusum: bool,
    pub kurtosis: bool,
    pub peak: Option<PeakTier>,
}

impl Sources {
    pub fn count(&self) -> usize {
        self.sta_lta as usize + self.cusum as usize + self.kurtosis as usize + self.peak.is_some() as usize
    }

    pub fn any(&self) -> bool {
        self.count() > 0
    }

    pub fn labels(&self) -> Vec<&'static str> {
        let mut out = Vec::with_capacity(4);
        if self.sta_lta {
            out.push(STA_LTA_LABEL);
        }
        if self.cusum {
            out.push(CUSUM_LABEL);
        }
        if self.kurtosis {
            out.push(KURTOSIS_LABEL);
        }
        if let Some(tier) = self.peak {
            out.push(tier.label());
        }
        out
    }
}

impl Serialize for Sources {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let labels = self.labels();
        let mut seq = serializer.serialize_seq(Some(labels.len()))?;
        for label in labels {
            seq.serialize_element(label)?;
        }
        seq.end()
    }
}

/// The four detectors, fed the same conditioned magnitude every sample.
#[derive(Clone, Debug, Default)]
pub struct DetectorEnsemble {
    pub sta_lta: StaLtaDetector,
    pub cusum: CusumDetector,
    pub kurtosis: KurtosisDetector,
    pub peak_mad: PeakMadDetector,
}

impl DetectorEnsemble {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every detector sees every sample, regardless of the others' verdicts.
    pub fn update(&mut self, magnitude: f32) -> Sources {
        Sources {
            sta_lta: self.sta_lta.update(magnitude),
            cusum: self.cusum.update(magnitude),
            kurtosis: self.kurtosis.update(magnitude),
            peak: self.peak_mad.update(magnitude),
        }
    }
}

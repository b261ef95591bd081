//! Short-term / long-term average energy ratio, at three timescales.
//!
//! Each scale keeps two EMAs of the squared magnitude and fires on the rising
//! edge of `sta / lta` crossing its on-threshold. It re-arms only after the
//! ratio falls back under the lower off-threshold.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StaLtaScale {
    /// STA window, samples
    pub sta_len: u32,
    /// LTA window, samples
    pub lta_len: u32,
    pub on: f32,
    pub off: f32,
}

pub const SCALES: [StaLtaScale; 3] = [
    // fast
    StaLtaScale { sta_len: 3, lta_len: 100, on: 3.0, off: 1.5 },
    // medium
    StaLtaScale { sta_len: 15, lta_len: 500, on: 2.5, off: 1.3 },
    // slow
    StaLtaScale { sta_len: 50, lta_len: 2000, on: 2.0, off: 1.2 },
];

const LTA_FLOOR: f32 = 1e-12;

#[derive(Clone, Debug, Default)]
pub struct StaLtaDetector {
    sta: [f32; 3],
    lta: [f32; 3],
    ratios: [f32; 3],
    active: [bool; 3],
    samples: u64,
}

impl StaLtaDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if any scale had a rising edge on this sample.
    pub fn update(&mut self, magnitude: f32) -> bool {
        let energy = magnitude * magnitude;
        if self.samples == 0 {
            // Seed both averages so a steady signal starts at ratio 1
            self.sta = [energy; 3];
            self.lta = [energy; 3];
        }
        self.samples += 1;

        let mut fired = false;
        for (i, scale) in SCALES.iter().enumerate() {
            self.sta[i] += (energy - self.sta[i]) / scale.sta_len as f32;
            self.lta[i] += (energy - self.lta[i]) / scale.lta_len as f32;
            let ratio = self.sta[i] / self.lta[i].max(LTA_FLOOR);
            self.ratios[i] = ratio;

            // The LTA baseline is meaningless until its window has filled
            if self.samples < scale.lta_len as u64 {
                continue;
            }

            if self.active[i] {
                if ratio < scale.off {
                    self.active[i] = false;
                }
            } else if ratio > scale.on {
                self.active[i] = true;
                fired = true;
            }
        }
        fired
    }

    pub fn ratios(&self) -> [f32; 3] {
        self.ratios
    }

    /// Scales currently above their off-threshold after triggering
    pub fn active_scales(&self) -> [bool; 3] {
        self.active
    }
}

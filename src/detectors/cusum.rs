//! Bilateral CUSUM for persistent level shifts in the vibration magnitude.
//!
//! The baseline tracks the signal through a very slow EMA; each accumulator
//! integrates the excursion beyond `DRIFT` in its direction and is clamped at
//! zero. Crossing `THRESHOLD` fires and clears both accumulators.

pub const BASELINE_RATE: f32 = 0.0001;
pub const DRIFT: f32 = 0.0005;
pub const THRESHOLD: f32 = 0.01;

#[derive(Clone, Debug, Default)]
pub struct CusumDetector {
    baseline: f32,
    pos: f32,
    neg: f32,
    seeded: bool,
}

impl CusumDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, magnitude: f32) -> bool {
        if !self.seeded {
            self.baseline = magnitude;
            self.seeded = true;
        }

        self.pos = (self.pos + magnitude - self.baseline - DRIFT).max(0.0);
        self.neg = (self.neg + self.baseline - magnitude - DRIFT).max(0.0);
        self.baseline += BASELINE_RATE * (magnitude - self.baseline);

        if self.pos > THRESHOLD || self.neg > THRESHOLD {
            self.pos = 0.0;
            self.neg = 0.0;
            return true;
        }
        false
    }

    /// (positive, negative) accumulators
    pub fn accumulators(&self) -> (f32, f32) {
        (self.pos, self.neg)
    }

    pub fn baseline(&self) -> f32 {
        self.baseline
    }
}

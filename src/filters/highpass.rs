use crate::types::Vec3f;

/// Single-pole high-pass coefficient (cutoff ~0.16 Hz)
pub const HIGHPASS_ALPHA: f32 = 0.95;

/// Strips the static gravity component from acceleration and reports the
/// magnitude of what is left. Every detector threshold is calibrated against
/// this near-zero-at-rest signal, not raw |accel|.
///
/// `y[n] = α·(y[n−1] + x[n] − x[n−1])` per axis. The first sample seeds
/// `x[n−1]`, so a device at rest starts at zero instead of a 1 g step.
#[derive(Clone, Debug, Default)]
pub struct VibrationConditioner {
    prev_input: Vec3f,
    output: Vec3f,
    seeded: bool,
}

impl VibrationConditioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter one accel vector (g) and return the vibration magnitude (g).
    pub fn update(&mut self, accel: &Vec3f) -> f32 {
        if !self.seeded {
            self.prev_input = *accel;
            self.seeded = true;
        }
        self.output = (self.output + accel - self.prev_input) * HIGHPASS_ALPHA;
        self.prev_input = *accel;
        self.output.norm()
    }

    /// Last filtered (gravity-free) vector
    pub fn filtered(&self) -> Vec3f {
        self.output
    }
}

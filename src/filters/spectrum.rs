//! Five-band vibration energy profile from parallel envelope followers.
//!
//! Each band runs a first-order follower at its own decay rate, then a slower
//! secondary smoothing, and maps the smoothed energy onto 0..1 through a
//! dB scale: silence (≤ -60 dB) lands at 0, 0 dB saturates at 1.

pub const BAND_COUNT: usize = 5;

/// Band centre frequencies in Hz
pub const BAND_FREQUENCIES_HZ: [f32; BAND_COUNT] = [3.0, 6.0, 12.0, 25.0, 50.0];

/// Decay coefficients are precomputed at this sample period. Real jitter moves
/// them by well under 1%.
pub const NOMINAL_DT: f32 = 0.008;

const ENERGY_SMOOTHING: f32 = 0.9;
const ENERGY_FLOOR: f32 = 1e-6;
const DB_RANGE: f32 = 60.0;

#[derive(Clone, Debug)]
pub struct SpectrumTracker {
    alphas: [f32; BAND_COUNT],
    envelopes: [f32; BAND_COUNT],
    energies: [f32; BAND_COUNT],
}

impl Default for SpectrumTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumTracker {
    pub fn new() -> Self {
        let alphas = BAND_FREQUENCIES_HZ
            .map(|f| (-2.0 * std::f32::consts::PI * f * NOMINAL_DT).exp());
        Self {
            alphas,
            envelopes: [0.0; BAND_COUNT],
            energies: [0.0; BAND_COUNT],
        }
    }

    /// Feed one vibration magnitude sample.
    pub fn update(&mut self, magnitude: f32) {
        for k in 0..BAND_COUNT {
            let alpha = self.alphas[k];
            self.envelopes[k] = (1.0 - alpha) * magnitude + alpha * self.envelopes[k];
            self.energies[k] = ENERGY_SMOOTHING * self.energies[k]
                + (1.0 - ENERGY_SMOOTHING) * self.envelopes[k];
        }
    }

    /// Normalized band levels in 0..=1
    pub fn bands(&self) -> [f32; BAND_COUNT] {
        self.energies.map(band_level)
    }

    pub fn alphas(&self) -> &[f32; BAND_COUNT] {
        &self.alphas
    }
}

fn band_level(energy: f32) -> f32 {
    let db = 20.0 * energy.max(ENERGY_FLOOR).log10();
    ((db + DB_RANGE) / DB_RANGE).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_alphas_decrease_with_frequency() {
        let tracker = SpectrumTracker::new();
        let a = tracker.alphas();
        assert_abs_diff_eq!(a[0], (-2.0 * std::f32::consts::PI * 3.0 * 0.008).exp(), epsilon = 1e-6);
        assert!(a.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_silence_maps_to_zero() {
        let mut tracker = SpectrumTracker::new();
        for _ in 0..500 {
            tracker.update(0.0);
        }
        assert_eq!(tracker.bands(), [0.0; BAND_COUNT]);
    }

    #[test]
    fn test_band_level_mapping() {
        assert_abs_diff_eq!(band_level(1.0), 1.0);
        assert_abs_diff_eq!(band_level(10.0), 1.0);
        assert_abs_diff_eq!(band_level(0.001), 0.0, epsilon = 1e-6);
        // -20 dB
        assert_abs_diff_eq!(band_level(0.1), 2.0 / 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_sustained_vibration_raises_all_bands() {
        let mut tracker = SpectrumTracker::new();
        for _ in 0..1000 {
            tracker.update(0.1);
        }
        for level in tracker.bands() {
            assert_abs_diff_eq!(level, 2.0 / 3.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_high_band_reacts_faster() {
        let mut tracker = SpectrumTracker::new();
        tracker.update(0.5);
        let bands = tracker.bands();
        assert!(bands[4] > bands[0]);
    }
}

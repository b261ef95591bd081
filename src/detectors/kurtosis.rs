use crate::history::HistoryRing;

pub const WINDOW: usize = 100;
/// Evaluate once per this many samples
pub const EVAL_INTERVAL: u32 = 10;
/// Gaussian noise sits near 3
pub const THRESHOLD: f32 = 6.0;

const MIN_VARIANCE: f64 = 1e-18;

/// Impulsiveness detector: fourth standardized moment over a sliding window.
#[derive(Clone, Debug, Default)]
pub struct KurtosisDetector {
    window: HistoryRing<f32, WINDOW>,
    counter: u32,
    last: Option<f32>,
}

impl KurtosisDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, magnitude: f32) -> bool {
        self.window.push(magnitude);
        self.counter += 1;
        if self.counter < EVAL_INTERVAL {
            return false;
        }
        self.counter = 0;

        if !self.window.is_full() {
            return false;
        }
        self.last = kurtosis(self.window.iter());
        self.last.is_some_and(|k| k > THRESHOLD)
    }

    /// Kurtosis from the most recent evaluation
    pub fn last_kurtosis(&self) -> Option<f32> {
        self.last
    }
}

/// `E[(x−μ)⁴] / E[(x−μ)²]²`, or None for a flat or empty window.
pub fn kurtosis<I>(values: I) -> Option<f32>
where
    I: Iterator<Item = f32> + Clone,
{
    let (sum, n) = values.clone().fold((0.0f64, 0usize), |(s, n), v| (s + v as f64, n + 1));
    if n == 0 {
        return None;
    }
    let mean = sum / n as f64;
    let (m2, m4) = values.fold((0.0f64, 0.0f64), |(m2, m4), v| {
        let d = v as f64 - mean;
        let d2 = d * d;
        (m2 + d2, m4 + d2 * d2)
    });
    let m2 = m2 / n as f64;
    let m4 = m4 / n as f64;
    if m2 < MIN_VARIANCE {
        return None;
    }
    Some((m4 / (m2 * m2)) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_kurtosis_of_flat_window_is_none() {
        assert_eq!(kurtosis([0.5f32; 10].into_iter()), None);
        assert_eq!(kurtosis(std::iter::empty::<f32>()), None);
    }

    #[test]
    fn test_kurtosis_of_two_level_signal() {
        // Symmetric ±1: m4 = m2² = 1
        let values = (0..100).map(|i| if i % 2 == 0 { 1.0f32 } else { -1.0 });
        assert_abs_diff_eq!(kurtosis(values).unwrap(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_outlier_fires() {
        let mut det = KurtosisDetector::new();
        let mut fired = false;
        for i in 0..WINDOW {
            let v = if i == 50 { 0.08 } else { 0.0005 };
            fired |= det.update(v);
        }
        assert!(fired);
        assert!(det.last_kurtosis().unwrap() > THRESHOLD);
    }

    #[test]
    fn test_only_evaluates_every_tenth_sample() {
        let level = |i: usize| if i % 2 == 0 { 0.0005f32 } else { 0.0015 };
        let mut det = KurtosisDetector::new();
        for i in 0..WINDOW - 1 {
            assert!(!det.update(level(i)));
        }
        assert_eq!(det.last_kurtosis(), None);
        assert!(!det.update(level(WINDOW - 1)));
        assert_abs_diff_eq!(det.last_kurtosis().unwrap(), 1.0, epsilon = 1e-3);

        // An outlier between evaluations is only seen at the next one
        assert!(!det.update(0.5));
        for i in 0..8 {
            assert!(!det.update(level(i)));
        }
        assert_abs_diff_eq!(det.last_kurtosis().unwrap(), 1.0, epsilon = 1e-3);
        assert!(det.update(level(8)));
        assert!(det.last_kurtosis().unwrap() > THRESHOLD);
    }

    #[test]
    fn test_insufficient_window_never_fires() {
        let mut det = KurtosisDetector::new();
        for i in 0..WINDOW - 1 {
            let v = if i == 20 { 1.0 } else { 0.0 };
            assert!(!det.update(v));
        }
    }
}

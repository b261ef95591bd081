use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use motion_sense_rs::assembler::{AssembledSample, DECIMATION};
use motion_sense_rs::decoder::encode_motion;
use motion_sense_rs::detectors::kurtosis::{kurtosis, KurtosisDetector};
use motion_sense_rs::detectors::{DetectorEnsemble, PeakMadDetector, PeakTier};
use motion_sense_rs::events::classify;
use motion_sense_rs::pipeline::HISTORY_LEN;
use motion_sense_rs::sources::SyntheticDevice;
use motion_sense_rs::types::{MotionSample, Vec3f};
use motion_sense_rs::{EventRecord, Pipeline, RawReport, SensorTag, Severity};

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Raw motion reports at 800 Hz per channel for `samples` decimated samples.
fn raw_motion<F>(samples: usize, mut accel: F) -> Vec<RawReport>
where
    F: FnMut(usize) -> Vec3f,
{
    let gyro = encode_motion(&Vec3f::zeros());
    let mut out = Vec::with_capacity(samples * DECIMATION as usize * 2);
    for i in 0..samples * DECIMATION as usize {
        let ts = i as f64 / 800.0;
        out.push(RawReport::new(SensorTag::Accel, ts, encode_motion(&accel(i))));
        out.push(RawReport::new(SensorTag::Gyro, ts, gyro.clone()));
    }
    out
}

fn gaussian(rng: &mut StdRng) -> f64 {
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn test_stationary_device_is_silent() {
    let mut rng = StdRng::seed_from_u64(42);
    // 5 s at 100 Hz after decimation
    let reports = raw_motion(500, |_| {
        Vec3f::new(
            (1e-4 * gaussian(&mut rng)) as f32,
            (1e-4 * gaussian(&mut rng)) as f32,
            (-1.0 + 1e-4 * gaussian(&mut rng)) as f32,
        )
    });

    let mut pipeline = Pipeline::new();
    let mut events: Vec<EventRecord> = Vec::new();
    for r in &reports {
        events.extend(pipeline.feed(r).event);
    }

    assert!(events.is_empty(), "unexpected events: {events:?}");
    assert_eq!(pipeline.stats().samples_processed, 500);
    for band in pipeline.spectrum_bands() {
        assert!(band < 0.05, "band level {band}");
    }
    let o = pipeline.orientation();
    assert!(o.roll.abs() < 0.5 && o.pitch.abs() < 0.5, "{o:?}");
}

#[test]
fn test_single_impulse_yields_one_event() {
    let mut ensemble = DetectorEnsemble::new();
    let mut events = Vec::new();
    let baseline = |i: usize| 0.0005 + 0.0001 * (i as f32 * 1.3).sin();

    for i in 0..300 {
        let mag = baseline(i);
        events.extend(classify(i as f64 * 0.01, mag, ensemble.update(mag)));
    }
    assert!(events.is_empty());

    events.extend(classify(3.0, 0.08, ensemble.update(0.08)));
    for i in 301..600 {
        let mag = baseline(i);
        events.extend(classify(i as f64 * 0.01, mag, ensemble.update(mag)));
    }

    assert_eq!(events.len(), 1, "{events:?}");
    let ev = &events[0];
    assert_eq!(ev.timestamp, 3.0);
    assert_eq!(ev.sources.peak, Some(PeakTier::Majeur));
    assert!(ev.severity >= Severity::MicroChoc, "{:?}", ev.severity);
}

#[test]
fn test_synthetic_tap_is_detected_after_settling() {
    let tap_period = 5.0;
    let mut device = SyntheticDevice::new(tap_period, 0.3);
    let mut pipeline = Pipeline::new();
    let mut events: Vec<EventRecord> = Vec::new();

    // 7 s of 10 ms ticks
    for _ in 0..700 {
        for r in device.next_batch() {
            events.extend(pipeline.feed(&r).event);
        }
    }

    assert!(!events.is_empty());
    for ev in &events {
        assert!(ev.timestamp >= tap_period && ev.timestamp < tap_period + 1.0, "{ev:?}");
    }
    let strongest = events.iter().map(|e| e.severity).max().unwrap();
    assert!(strongest >= Severity::MicroChoc);
    assert!(events.iter().any(|e| e.sources.peak.is_some()));
    assert_eq!(pipeline.lid_angle_deg().map(|d| (100..=120).contains(&d)), Some(true));
}

#[test]
fn test_snapshot_count_is_samples_over_ten() {
    for n in [0usize, 5, 9, 10, 37, 123] {
        let mut pipeline = Pipeline::new();
        let snapshots = raw_motion(n, |_| Vec3f::new(0.0, 0.0, -1.0))
            .iter()
            .filter_map(|r| pipeline.feed(r).snapshot)
            .count();
        assert_eq!(snapshots, n / 10, "n = {n}");
    }
}

#[test]
fn test_history_is_bounded_and_chronological() {
    let mut pipeline = Pipeline::new();
    let mut last = None;
    for i in 0..750 {
        let sample = AssembledSample {
            sample: MotionSample {
                timestamp: i as f64 * 0.01,
                accel: Vec3f::new(i as f32, 0.0, -1.0),
                gyro: Vec3f::new(0.0, 0.0, i as f32),
            },
            dt: 0.01,
        };
        if let Some(s) = pipeline.process_sample(&sample).snapshot {
            last = Some(s);
        }
    }
    let snap = last.unwrap();
    assert_eq!(snap.sample_index, 750);
    assert_eq!(snap.accel_history.len(), HISTORY_LEN);
    assert_eq!(snap.gyro_history.len(), HISTORY_LEN);
    for (k, (a, g)) in snap.accel_history.iter().zip(&snap.gyro_history).enumerate() {
        assert_eq!(a[0], (250 + k) as f32);
        assert_eq!(g[2], (250 + k) as f32);
    }
}

#[test]
fn test_gaussian_kurtosis_near_three() {
    let mut rng = StdRng::seed_from_u64(7);
    let values: Vec<f32> = (0..20_000).map(|_| gaussian(&mut rng) as f32).collect();
    assert_abs_diff_eq!(kurtosis(values.iter().copied()).unwrap(), 3.0, epsilon = 0.2);

    let mut det = KurtosisDetector::new();
    let mut evaluations = Vec::new();
    for (i, v) in values.iter().enumerate() {
        assert!(!det.update(0.001 + 0.0002 * v), "fired on Gaussian input at {i}");
        if i >= 100 && (i + 1) % 10 == 0 {
            evaluations.extend(det.last_kurtosis());
        }
    }
    let mean = evaluations.iter().sum::<f32>() / evaluations.len() as f32;
    assert!((2.7..3.2).contains(&mean), "mean windowed kurtosis {mean}");
}

#[test]
fn test_peak_mad_six_sigma_is_fort() {
    // Median 0, MAD scaled so σ = 0.01
    let half_spread = 0.01 / 1.4826;
    let mut det = PeakMadDetector::new();
    for i in 0..200 {
        det.update(if i < 100 { half_spread } else { -half_spread });
    }
    assert_eq!(det.update(0.06), Some(PeakTier::Fort));
}

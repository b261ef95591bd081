//! Decimation and accel/gyro pairing.
//!
//! The hardware emits both motion channels at roughly 800 Hz-1 kHz. Only every
//! 8th report per channel is kept; the kept gyro report paces the pipeline by
//! pairing with the most recent kept accel vector.

use crate::types::{MotionSample, Vec3f};

/// Keep one report in `DECIMATION` per motion channel
pub const DECIMATION: u32 = 8;

/// dt used for the first sample, before any inter-sample delta exists
pub const DEFAULT_DT: f64 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AssembledSample {
    pub sample: MotionSample,
    /// Seconds since the previous pacing report
    pub dt: f64,
}

#[derive(Debug, Default)]
pub struct SampleAssembler {
    accel_count: u32,
    gyro_count: u32,
    last_accel: Option<Vec3f>,
    last_pacing_ts: Option<f64>,
}

impl SampleAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a decoded accel vector. Returns true if it was kept.
    pub fn push_accel(&mut self, accel: Vec3f) -> bool {
        self.accel_count += 1;
        if self.accel_count < DECIMATION {
            return false;
        }
        self.accel_count = 0;
        self.last_accel = Some(accel);
        true
    }

    /// Feed a decoded gyro vector; every kept one produces a sample once an
    /// accel vector is available.
    pub fn push_gyro(&mut self, gyro: Vec3f, timestamp: f64) -> Option<AssembledSample> {
        self.gyro_count += 1;
        if self.gyro_count < DECIMATION {
            return None;
        }
        self.gyro_count = 0;

        let accel = self.last_accel?;

        let dt = match self.last_pacing_ts {
            Some(prev) if timestamp > prev => timestamp - prev,
            _ => DEFAULT_DT,
        };
        self.last_pacing_ts = Some(timestamp);

        Some(AssembledSample {
            sample: MotionSample { timestamp, accel, gyro },
            dt,
        })
    }
}

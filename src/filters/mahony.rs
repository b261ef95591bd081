//! Mahony AHRS: quaternion complementary filter fusing gyro rate with the
//! gravity direction from the accelerometer.
//!
//! Two phases:
//!   - uninitialized: identity quaternion until the first usable accel reading,
//!     which bootstraps roll/pitch straight from gravity (no convergence wait)
//!   - tracking: PI correction of the gyro rate by the gravity error, first-order
//!     quaternion integration, renormalization
//!
//! No magnetometer, so yaw is relative and drifts slowly.

use crate::types::{Orientation, Quat, Vec3d, Vec3f};

/// Proportional gain on the gravity error
pub const KP: f64 = 1.0;
/// Integral gain (absorbs steady-state gyro bias)
pub const KI: f64 = 0.05;

/// Accel readings shorter than this carry no usable direction
const MIN_GRAVITY_NORM: f64 = 1e-6;

#[derive(Clone, Debug)]
pub struct MahonyAhrs {
    q: Quat,
    integral: Vec3d,
    initialized: bool,
}

impl Default for MahonyAhrs {
    fn default() -> Self {
        Self::new()
    }
}

impl MahonyAhrs {
    pub fn new() -> Self {
        Self {
            q: Quat::identity(),
            integral: Vec3d::zeros(),
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Advance the filter by one sample. `accel` in g, `gyro_dps` in deg/s.
    ///
    /// Returns false when the sample was skipped (degenerate gravity or dt),
    /// leaving the last valid quaternion untouched.
    pub fn update(&mut self, accel: &Vec3f, gyro_dps: &Vec3f, dt: f64) -> bool {
        let a = accel.cast::<f64>();
        let norm = a.norm();
        if !norm.is_finite() || norm < MIN_GRAVITY_NORM {
            return false;
        }

        if !self.initialized {
            self.bootstrap(&a);
            return true;
        }

        if !dt.is_finite() || dt <= 0.0 {
            return false;
        }

        // The sensor reads -1 g on z at rest; flip z so the reference points up.
        let measured = Vec3d::new(a.x, a.y, -a.z) / norm;

        let (w, x, y, z) = (self.q.w, self.q.i, self.q.j, self.q.k);
        let estimated = Vec3d::new(
            2.0 * (x * z - w * y),
            2.0 * (w * x + y * z),
            w * w - x * x - y * y + z * z,
        );

        let error = measured.cross(&estimated);
        self.integral += error * (KI * dt);

        let gyro_rad = gyro_dps.cast::<f64>().map(f64::to_radians);
        let omega = gyro_rad + error * KP + self.integral;

        // q_dot = 0.5 * q ⊗ (0, ω)
        let q_dot = Quat::new(
            -x * omega.x - y * omega.y - z * omega.z,
            w * omega.x + y * omega.z - z * omega.y,
            w * omega.y - x * omega.z + z * omega.x,
            w * omega.z + x * omega.y - y * omega.x,
        ) * 0.5;

        let integrated = self.q + q_dot * dt;
        let q_norm = integrated.norm();
        if !q_norm.is_finite() || q_norm < MIN_GRAVITY_NORM {
            return false;
        }
        self.q = integrated / q_norm;
        true
    }

    fn bootstrap(&mut self, a: &Vec3d) {
        let pitch = (-a.x).atan2(-a.z);
        let roll = a.y.atan2(-a.z);
        self.q = quat_from_roll_pitch(roll, pitch);
        self.integral = Vec3d::zeros();
        self.initialized = true;
    }

    pub fn quaternion(&self) -> Quat {
        self.q
    }

    /// Standard ZYX Euler extraction, degrees.
    pub fn orientation(&self) -> Orientation {
        let (w, x, y, z) = (self.q.w, self.q.i, self.q.j, self.q.k);
        let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
        let pitch = (2.0 * (w * y - z * x)).clamp(-1.0, 1.0).asin();
        let yaw = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));
        Orientation {
            roll: roll.to_degrees() as f32,
            pitch: pitch.to_degrees() as f32,
            yaw: yaw.to_degrees() as f32,
        }
    }
}

/// Quaternion for (roll, pitch, yaw = 0), radians.
fn quat_from_roll_pitch(roll: f64, pitch: f64) -> Quat {
    let (sr, cr) = (roll * 0.5).sin_cos();
    let (sp, cp) = (pitch * 0.5).sin_cos();
    Quat::new(cr * cp, sr * cp, cr * sp, -sr * sp)
}

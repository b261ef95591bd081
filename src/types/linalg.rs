//! Linear algebra aliases shared by the pipeline stages.
//!
//! Samples travel as single-precision vectors (that is what the hardware
//! resolves); the attitude filter integrates in double precision.

use nalgebra::{Quaternion, Vector3};

// ===== Sample vectors =====
pub type Vec3f = Vector3<f32>;

// ===== Attitude filter =====
pub type Vec3d = Vector3<f64>;
pub type Quat = Quaternion<f64>;

/// Fixed-size vector as stored in history rings and snapshots.
pub type Triple = [f32; 3];

pub fn to_triple(v: &Vec3f) -> Triple {
    [v.x, v.y, v.z]
}

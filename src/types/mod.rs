pub mod linalg;

pub use linalg::*;

use serde::{Deserialize, Serialize};

/// Sensor channel a raw report was emitted on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorTag {
    Accel,
    Gyro,
    AmbientLight,
    HingeAngle,
}

impl SensorTag {
    pub const ALL: [SensorTag; 4] = [
        SensorTag::Accel,
        SensorTag::Gyro,
        SensorTag::AmbientLight,
        SensorTag::HingeAngle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorTag::Accel => "accel",
            SensorTag::Gyro => "gyro",
            SensorTag::AmbientLight => "ambient_light",
            SensorTag::HingeAngle => "hinge_angle",
        }
    }
}

/// Undecoded report as pushed by the hardware collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawReport {
    /// Arrival time in seconds
    #[serde(rename = "t")]
    pub timestamp: f64,
    pub tag: SensorTag,
    pub data: Vec<u8>,
}

impl RawReport {
    pub fn new(tag: SensorTag, timestamp: f64, data: Vec<u8>) -> Self {
        Self { timestamp, tag, data }
    }
}

/// One decimated accel/gyro pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionSample {
    pub timestamp: f64,
    /// Acceleration in g (reads -1 g on z when lying flat)
    pub accel: Vec3f,
    /// Angular rate in deg/s
    pub gyro: Vec3f,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AmbientReading {
    pub lux: f32,
    pub channels: [u32; 4],
}

/// Attitude in degrees. Yaw has no absolute reference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

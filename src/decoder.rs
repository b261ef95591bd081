//! Byte-level decoding of raw sensor reports.
//!
//! The layouts are fixed by the hardware and not documented anywhere else:
//!
//! | tag            | min len | payload                                              |
//! |----------------|---------|------------------------------------------------------|
//! | accel / gyro   | 18      | i32 LE at 6/10/14, Q16 fixed point                   |
//! | ambient light  | 44      | u32 LE channels at 20/24/28/32, f32 LE lux at 40     |
//! | hinge angle    | 3       | byte 0 == 1, u16 LE at 1..3 masked to 9 bits          |
//!
//! Anything that does not fit is dropped by returning `None`.

use crate::types::{AmbientReading, SensorTag, Vec3f};

pub const MOTION_MIN_LEN: usize = 18;
pub const AMBIENT_MIN_LEN: usize = 44;
pub const HINGE_MIN_LEN: usize = 3;

const MOTION_OFFSETS: [usize; 3] = [6, 10, 14];
const AMBIENT_CHANNEL_OFFSETS: [usize; 4] = [20, 24, 28, 32];
const AMBIENT_LUX_OFFSET: usize = 40;
const HINGE_VALID_MARKER: u8 = 1;
const HINGE_MASK: u16 = 0x01FF;

/// Q16 scale: raw integer = value * 65536
pub const Q16_SCALE: f32 = 65536.0;

/// Length of motion reports produced by the hardware (and by our encoders)
const MOTION_REPORT_LEN: usize = 22;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DecodedReport {
    Accel(Vec3f),
    Gyro(Vec3f),
    AmbientLight(AmbientReading),
    /// Lid angle in degrees (0-511)
    HingeAngle(u16),
}

pub fn decode(tag: SensorTag, data: &[u8]) -> Option<DecodedReport> {
    match tag {
        SensorTag::Accel => decode_motion(data).map(DecodedReport::Accel),
        SensorTag::Gyro => decode_motion(data).map(DecodedReport::Gyro),
        SensorTag::AmbientLight => decode_ambient(data).map(DecodedReport::AmbientLight),
        SensorTag::HingeAngle => decode_hinge(data).map(DecodedReport::HingeAngle),
    }
}

pub fn decode_motion(data: &[u8]) -> Option<Vec3f> {
    if data.len() < MOTION_MIN_LEN {
        return None;
    }
    let x = read_i32_le(data, MOTION_OFFSETS[0])?;
    let y = read_i32_le(data, MOTION_OFFSETS[1])?;
    let z = read_i32_le(data, MOTION_OFFSETS[2])?;
    Some(Vec3f::new(
        x as f32 / Q16_SCALE,
        y as f32 / Q16_SCALE,
        z as f32 / Q16_SCALE,
    ))
}

pub fn decode_ambient(data: &[u8]) -> Option<AmbientReading> {
    if data.len() < AMBIENT_MIN_LEN {
        return None;
    }
    let mut channels = [0u32; 4];
    for (slot, &offset) in channels.iter_mut().zip(AMBIENT_CHANNEL_OFFSETS.iter()) {
        *slot = read_u32_le(data, offset)?;
    }
    let lux = f32::from_bits(read_u32_le(data, AMBIENT_LUX_OFFSET)?);
    Some(AmbientReading { lux, channels })
}

pub fn decode_hinge(data: &[u8]) -> Option<u16> {
    if data.len() < HINGE_MIN_LEN || data[0] != HINGE_VALID_MARKER {
        return None;
    }
    let raw = u16::from_le_bytes([data[1], data[2]]);
    Some(raw & HINGE_MASK)
}

fn read_u32_le(data: &[u8], offset: usize) -> Option<u32> {
    let bytes: [u8; 4] = data.get(offset..offset + 4)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

fn read_i32_le(data: &[u8], offset: usize) -> Option<i32> {
    read_u32_le(data, offset).map(|v| v as i32)
}

// ─── Encoders (synthetic source, captures, tests) ───────────────────────────

/// Quantize a physical value to Q16.
pub fn to_q16(value: f32) -> i32 {
    (value as f64 * Q16_SCALE as f64).round() as i32
}

pub fn encode_motion_raw(raw: [i32; 3]) -> Vec<u8> {
    let mut buf = vec![0u8; MOTION_REPORT_LEN];
    for (value, &offset) in raw.iter().zip(MOTION_OFFSETS.iter()) {
        buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }
    buf
}

pub fn encode_motion(v: &Vec3f) -> Vec<u8> {
    encode_motion_raw([to_q16(v.x), to_q16(v.y), to_q16(v.z)])
}

pub fn encode_ambient(reading: &AmbientReading) -> Vec<u8> {
    let mut buf = vec![0u8; AMBIENT_MIN_LEN];
    for (value, &offset) in reading.channels.iter().zip(AMBIENT_CHANNEL_OFFSETS.iter()) {
        buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }
    buf[AMBIENT_LUX_OFFSET..AMBIENT_LUX_OFFSET + 4].copy_from_slice(&reading.lux.to_le_bytes());
    buf
}

pub fn encode_hinge(angle_deg: u16) -> Vec<u8> {
    let [lo, hi] = (angle_deg & HINGE_MASK).to_le_bytes();
    vec![HINGE_VALID_MARKER, lo, hi]
}

pub mod highpass;
pub mod mahony;
pub mod spectrum;

pub use highpass::VibrationConditioner;
pub use mahony::MahonyAhrs;
pub use spectrum::{SpectrumTracker, BAND_COUNT};

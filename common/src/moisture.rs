//! Conversion from sensor voltage to soil moisture.
//!
//! The capacitive sensor reads high when dry: `full_scale` volts is 0 %
//! moisture and 0 V is fully saturated soil.

/// Moisture percentage for a sensor voltage, rounded and clamped to 0..=100.
pub fn moisture_percent(voltage: f32, full_scale: f32) -> u8 {
    let percent = 100.0 - (voltage / full_scale) * 100.0;
    if percent.is_nan() {
        return 0;
    }
    percent.round().clamp(0.0, 100.0) as u8
}

pub fn round_to_hundredths(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

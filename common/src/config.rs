use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ads1115::{self, AdcGain}, lcd};

/// Moisture percentage below which the pump is switched on.
pub const THRESHOLD: u8 = 35;

/// Sensor voltage that corresponds to completely dry soil (0 %).
pub const FULL_SCALE_VOLTAGE: f32 = 3.750;

pub const HTTP_PORT: u16 = 5000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub threshold: u8,
    pub full_scale_voltage: f32,
    pub settle_ms: u64,
    pub tick_interval_ms: u64,
    pub fault_retry_ms: u64,
    pub splash_step_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            threshold: THRESHOLD,
            full_scale_voltage: FULL_SCALE_VOLTAGE,
            settle_ms: 500,
            tick_interval_ms: 2_000,
            fault_retry_ms: 1_000,
            splash_step_ms: 100,
        }
    }
}

impl ControllerConfig {
    pub fn sanitize(&mut self) {
        self.threshold = self.threshold.min(100);

        if !self.full_scale_voltage.is_finite() || self.full_scale_voltage <= 0.0 {
            self.full_scale_voltage = FULL_SCALE_VOLTAGE;
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn fault_retry_delay(&self) -> Duration {
        Duration::from_millis(self.fault_retry_ms)
    }

    pub fn splash_step(&self) -> Duration {
        Duration::from_millis(self.splash_step_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HardwareConfig {
    pub i2c_device: String,
    pub i2c_hz: u32,
    pub adc_address: u8,
    pub adc_channel: u8,
    pub adc_gain: AdcGain,
    pub gpio_chip: String,
    pub relay_gpio: u8,
    pub lcd_address: u8,
    pub lcd_rows: u8,
    pub lcd_columns: u8,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            i2c_device: "/dev/i2c-1".to_string(),
            i2c_hz: 100_000,
            adc_address: ads1115::DEFAULT_ADDRESS,
            adc_channel: 0,
            adc_gain: AdcGain::One,
            gpio_chip: "/dev/gpiochip0".to_string(),
            relay_gpio: 27,
            lcd_address: lcd::DEFAULT_ADDRESS,
            lcd_rows: 2,
            lcd_columns: 16,
        }
    }
}

impl HardwareConfig {
    pub fn sanitize(&mut self) {
        self.i2c_hz = self.i2c_hz.clamp(10_000, 400_000);

        if self.adc_channel > 3 {
            self.adc_channel = 0;
        }

        // HD44780 controllers address at most four rows of 40 cells.
        self.lcd_rows = self.lcd_rows.clamp(1, 4);
        self.lcd_columns = self.lcd_columns.clamp(8, 40);
    }
}

//! ADS1115 16-bit converter on I2C, read in single-shot mode.

use embedded_hal::{delay::DelayNs, i2c::I2c};
use serde::{Deserialize, Serialize};

use crate::{
    error::SensorError,
    sensor::{AdcChannel, AdcSample},
};

pub const DEFAULT_ADDRESS: u8 = 0x48;

const REG_CONVERSION: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;

const OS_SINGLE: u16 = 0x8000;
const MODE_SINGLE_SHOT: u16 = 0x0100;
const DATA_RATE_128SPS: u16 = 0x0080;
const COMPARATOR_DISABLED: u16 = 0x0003;

// 128 SPS converts in ~7.8 ms; give it 20 ms before calling the bus dead.
const CONVERSION_POLL_MS: u32 = 2;
const CONVERSION_POLLS: u32 = 10;

/// Programmable gain; named after the amplifier factor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdcGain {
    TwoThirds,
    #[default]
    One,
    Two,
    Four,
    Eight,
    Sixteen,
}

impl AdcGain {
    pub fn full_scale_volts(self) -> f32 {
        match self {
            Self::TwoThirds => 6.144,
            Self::One => 4.096,
            Self::Two => 2.048,
            Self::Four => 1.024,
            Self::Eight => 0.512,
            Self::Sixteen => 0.256,
        }
    }

    fn pga_bits(self) -> u16 {
        match self {
            Self::TwoThirds => 0b000,
            Self::One => 0b001,
            Self::Two => 0b010,
            Self::Four => 0b011,
            Self::Eight => 0b100,
            Self::Sixteen => 0b101,
        }
    }
}

pub fn raw_to_voltage(raw: i16, gain: AdcGain) -> f32 {
    f32::from(raw) * gain.full_scale_volts() / 32_767.0
}

pub struct Ads1115<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    channel: u8,
    gain: AdcGain,
}

impl<I2C: I2c, D: DelayNs> Ads1115<I2C, D> {
    /// `channel` selects the single-ended input AIN0..=AIN3.
    pub fn new(i2c: I2C, delay: D, address: u8, channel: u8, gain: AdcGain) -> Self {
        Self {
            i2c,
            delay,
            address,
            channel: channel & 0x03,
            gain,
        }
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn config_word(&self) -> u16 {
        let mux = 0b100 | u16::from(self.channel);
        OS_SINGLE
            | (mux << 12)
            | (self.gain.pga_bits() << 9)
            | MODE_SINGLE_SHOT
            | DATA_RATE_128SPS
            | COMPARATOR_DISABLED
    }

    fn read_register(&mut self, register: u8) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .map_err(SensorError::from_i2c)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn wait_for_conversion(&mut self) -> Result<(), SensorError> {
        for _ in 0..CONVERSION_POLLS {
            self.delay.delay_ms(CONVERSION_POLL_MS);
            if self.read_register(REG_CONFIG)? & OS_SINGLE != 0 {
                return Ok(());
            }
        }
        Err(SensorError::BusFault("conversion did not complete".to_string()))
    }
}

impl<I2C: I2c, D: DelayNs> AdcChannel for Ads1115<I2C, D> {
    fn sample(&mut self) -> Result<AdcSample, SensorError> {
        let [hi, lo] = self.config_word().to_be_bytes();
        self.i2c
            .write(self.address, &[REG_CONFIG, hi, lo])
            .map_err(SensorError::from_i2c)?;

        self.wait_for_conversion()?;

        let raw = self.read_register(REG_CONVERSION)? as i16;
        Ok(AdcSample {
            raw,
            voltage: raw_to_voltage(raw, self.gain),
        })
    }
}

//! Simulated collaborators for running the controller on a development host.
//!
//! The soil dries slowly while the pump is off and soaks up water while it
//! runs, so the loop cycles the relay on its own.

use std::{
    convert::Infallible,
    sync::{Arc, Mutex, PoisonError},
};

use embedded_hal::digital::{ErrorType, OutputPin};
use irrigation_common::{
    ads1115::{raw_to_voltage, AdcGain},
    AdcChannel, AdcSample, CharDisplay, ControlLoop, ControllerConfig, DisplayError,
    HardwareConfig, Relay, SensorError, SensorReader, StatusDisplay, StatusStore, ThreadSleeper,
};
use tracing::{debug, info};

const DRYING_VOLTS_PER_SAMPLE: f32 = 0.06;
const WETTING_VOLTS_PER_SAMPLE: f32 = 0.35;
const MIN_VOLTAGE: f32 = 0.4;
const MAX_VOLTAGE: f32 = 3.7;

/// Sensor voltage the soil starts from, just above the watering threshold.
const INITIAL_VOLTAGE: f32 = 2.3;

pub type SimControlLoop =
    ControlLoop<SensorReader<SimulatedAdc>, SimulatedRelayPin, LogDisplay, ThreadSleeper>;

pub fn control_loop(
    hardware: &HardwareConfig,
    config: ControllerConfig,
    store: StatusStore,
) -> SimControlLoop {
    info!(
        i2c_hz = hardware.i2c_hz,
        "simulated hardware: ADS1115 @ {:#04x} ch{}, relay GPIO {}, LCD {}x{} @ {:#04x}",
        hardware.adc_address,
        hardware.adc_channel,
        hardware.relay_gpio,
        hardware.lcd_columns,
        hardware.lcd_rows,
        hardware.lcd_address
    );

    let soil = SoilModel::new(INITIAL_VOLTAGE);
    let sensor = SensorReader::new(
        SimulatedAdc::new(soil.clone(), hardware.adc_gain),
        config.full_scale_voltage,
    );
    let relay = Relay::new(SimulatedRelayPin::new(soil, hardware.relay_gpio));
    let display = StatusDisplay::new(LogDisplay::new(hardware.lcd_rows, hardware.lcd_columns));

    ControlLoop::new(sensor, relay, display, ThreadSleeper, store, config)
}

#[derive(Clone)]
pub struct SoilModel {
    inner: Arc<Mutex<SoilState>>,
}

struct SoilState {
    voltage: f32,
    pump_on: bool,
}

impl SoilModel {
    pub fn new(initial_voltage: f32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SoilState {
                voltage: initial_voltage.clamp(MIN_VOLTAGE, MAX_VOLTAGE),
                pump_on: false,
            })),
        }
    }

    fn set_pump(&self, on: bool) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pump_on = on;
    }

    /// Moves the sensor voltage one sample step and returns it.
    fn advance(&self) -> f32 {
        let mut soil = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let step = if soil.pump_on {
            -WETTING_VOLTS_PER_SAMPLE
        } else {
            DRYING_VOLTS_PER_SAMPLE
        };
        soil.voltage = (soil.voltage + step).clamp(MIN_VOLTAGE, MAX_VOLTAGE);
        soil.voltage
    }
}

pub struct SimulatedAdc {
    soil: SoilModel,
    gain: AdcGain,
}

impl SimulatedAdc {
    pub fn new(soil: SoilModel, gain: AdcGain) -> Self {
        Self { soil, gain }
    }
}

impl AdcChannel for SimulatedAdc {
    fn sample(&mut self) -> Result<AdcSample, SensorError> {
        let voltage = self.soil.advance();
        let raw = (voltage / self.gain.full_scale_volts() * 32_767.0).round() as i16;
        Ok(AdcSample {
            raw,
            voltage: raw_to_voltage(raw, self.gain),
        })
    }
}

pub struct SimulatedRelayPin {
    soil: SoilModel,
    gpio: u8,
    high: bool,
}

impl SimulatedRelayPin {
    pub fn new(soil: SoilModel, gpio: u8) -> Self {
        Self {
            soil,
            gpio,
            high: false,
        }
    }

    fn drive(&mut self, high: bool) {
        if self.high != high {
            info!(
                gpio = self.gpio,
                "relay pin {}",
                if high { "HIGH" } else { "LOW" }
            );
        }
        self.high = high;
        self.soil.set_pump(high);
    }
}

impl ErrorType for SimulatedRelayPin {
    type Error = Infallible;
}

impl OutputPin for SimulatedRelayPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true);
        Ok(())
    }
}

/// Character display that mirrors its cells into the log.
pub struct LogDisplay {
    lines: Vec<Vec<char>>,
}

impl LogDisplay {
    pub fn new(rows: u8, columns: u8) -> Self {
        Self {
            lines: vec![vec![' '; usize::from(columns)]; usize::from(rows)],
        }
    }

    pub fn line(&self, row: u8) -> Option<String> {
        self.lines
            .get(usize::from(row))
            .map(|cells| cells.iter().collect())
    }
}

impl CharDisplay for LogDisplay {
    fn rows(&self) -> u8 {
        self.lines.len() as u8
    }

    fn columns(&self) -> u8 {
        self.lines.first().map_or(0, |cells| cells.len() as u8)
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        for cells in &mut self.lines {
            cells.fill(' ');
        }
        Ok(())
    }

    fn write_at(&mut self, row: u8, column: u8, text: &str) -> Result<(), DisplayError> {
        let rows = self.rows();
        let Some(cells) = self.lines.get_mut(usize::from(row)) else {
            return Err(DisplayError::RowOutOfRange { row, rows });
        };

        let before: String = cells.iter().collect();
        for (offset, ch) in text.chars().enumerate() {
            if let Some(cell) = cells.get_mut(usize::from(column) + offset) {
                *cell = ch;
            }
        }
        let after: String = cells.iter().collect();
        if before != after {
            debug!(row, "lcd |{after}|");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soil_dries_until_pump_runs() {
        let soil = SoilModel::new(2.0);
        let mut adc = SimulatedAdc::new(soil.clone(), AdcGain::One);
        let mut pin = SimulatedRelayPin::new(soil, 27);

        let first = adc.sample().unwrap().voltage;
        let second = adc.sample().unwrap().voltage;
        assert!(second > first);

        pin.set_high().unwrap();
        let wetted = adc.sample().unwrap().voltage;
        assert!(wetted < second);
    }

    #[test]
    fn samples_stay_within_probe_range() {
        let soil = SoilModel::new(MAX_VOLTAGE);
        let mut adc = SimulatedAdc::new(soil, AdcGain::One);

        for _ in 0..20 {
            let sample = adc.sample().unwrap();
            assert!(sample.voltage <= MAX_VOLTAGE + 0.001);
            assert_eq!(sample.raw, (MAX_VOLTAGE / 4.096 * 32_767.0).round() as i16);
        }
    }

    #[test]
    fn log_display_keeps_cells() {
        let mut display = LogDisplay::new(2, 16);
        display.write_at(1, 2, "hi").unwrap();

        assert_eq!(display.line(1).as_deref(), Some("  hi            "));
        assert!(matches!(
            display.write_at(2, 0, "x"),
            Err(DisplayError::RowOutOfRange { row: 2, rows: 2 })
        ));

        display.clear().unwrap();
        assert_eq!(display.line(1).as_deref(), Some(&*" ".repeat(16)));
    }
}

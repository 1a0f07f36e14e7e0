//! Raspberry Pi peripherals over the Linux I2C and GPIO character devices.

use anyhow::Context;
use gpio_cdev::{Chip, LineRequestFlags};
use irrigation_common::{
    ads1115::Ads1115, lcd::Lcd1602, ControlLoop, ControllerConfig, HardwareConfig, Relay,
    SensorReader, StatusDisplay, StatusStore, ThreadSleeper,
};
use linux_embedded_hal::{CdevPin, Delay, I2cdev};
use tracing::info;

const RELAY_CONSUMER: &str = "irrigation-relay";

pub type HwControlLoop = ControlLoop<
    SensorReader<Ads1115<I2cdev, Delay>>,
    CdevPin,
    Lcd1602<I2cdev, Delay>,
    ThreadSleeper,
>;

pub fn control_loop(
    hardware: &HardwareConfig,
    config: ControllerConfig,
    store: StatusStore,
) -> anyhow::Result<HwControlLoop> {
    // The bus clock is set by the kernel (dtparam=i2c_arm_baudrate).
    info!(
        i2c_hz = hardware.i2c_hz,
        "ADS1115 @ {:#04x} ch{} and LCD @ {:#04x} on {}, relay GPIO {} on {}",
        hardware.adc_address,
        hardware.adc_channel,
        hardware.lcd_address,
        hardware.i2c_device,
        hardware.relay_gpio,
        hardware.gpio_chip
    );

    let relay = Relay::new(open_relay_pin(hardware)?);

    let adc_bus = open_bus(hardware)?;
    let adc = Ads1115::new(
        adc_bus,
        Delay,
        hardware.adc_address,
        hardware.adc_channel,
        hardware.adc_gain,
    );

    let lcd = Lcd1602::new(
        open_bus(hardware)?,
        Delay,
        hardware.lcd_address,
        hardware.lcd_rows,
        hardware.lcd_columns,
    )
    .with_context(|| format!("failed to initialise LCD at {:#04x}", hardware.lcd_address))?;

    Ok(ControlLoop::new(
        SensorReader::new(adc, config.full_scale_voltage),
        relay,
        StatusDisplay::new(lcd),
        ThreadSleeper,
        store,
        config,
    ))
}

fn open_bus(hardware: &HardwareConfig) -> anyhow::Result<I2cdev> {
    I2cdev::new(&hardware.i2c_device)
        .with_context(|| format!("failed to open {}", hardware.i2c_device))
}

/// Claims the relay line as an output, initially low.
fn open_relay_pin(hardware: &HardwareConfig) -> anyhow::Result<CdevPin> {
    let mut chip = Chip::new(&hardware.gpio_chip)
        .with_context(|| format!("failed to open {}", hardware.gpio_chip))?;
    let handle = chip
        .get_line(u32::from(hardware.relay_gpio))
        .and_then(|line| line.request(LineRequestFlags::OUTPUT, 0, RELAY_CONSUMER))
        .with_context(|| format!("failed to claim GPIO {}", hardware.relay_gpio))?;
    CdevPin::new(handle).context("failed to configure relay GPIO")
}

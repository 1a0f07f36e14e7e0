use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use embedded_hal::digital::OutputPin;
use tracing::{debug, info, warn};

use crate::{
    actuator::{self, Relay},
    config::ControllerConfig,
    display::{motor_line, CharDisplay, StatusDisplay},
    error::RelayError,
    sensor::MoistureSensor,
    store::StatusStore,
    types::{Mode, MotorState, Reading, SharedStatus},
};

/// Blocking pause between loop steps.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Applied { reading: Reading, motor: MotorState },
    SensorFault,
}

/// Read, decide, actuate, display, sleep.
///
/// The loop owns every hardware collaborator; the [`StatusStore`] is its
/// only link to the status page.
pub struct ControlLoop<S, P, D, Z> {
    sensor: S,
    relay: Relay<P>,
    display: StatusDisplay<D>,
    sleeper: Z,
    store: StatusStore,
    config: ControllerConfig,
}

impl<S, P, D, Z> ControlLoop<S, P, D, Z>
where
    S: MoistureSensor,
    P: OutputPin,
    D: CharDisplay,
    Z: Sleeper,
{
    pub fn new(
        sensor: S,
        relay: Relay<P>,
        display: StatusDisplay<D>,
        sleeper: Z,
        store: StatusStore,
        config: ControllerConfig,
    ) -> Self {
        Self {
            sensor,
            relay,
            display,
            sleeper,
            store,
            config,
        }
    }

    /// Drives the relay low and plays the boot splash. A relay that cannot
    /// be driven is fatal; display trouble is only logged.
    pub fn start(&mut self) -> Result<(), RelayError> {
        self.relay.apply(MotorState::Off)?;

        if let Err(err) = self
            .display
            .boot_splash(&mut self.sleeper, self.config.splash_step())
        {
            warn!("boot splash failed: {err}");
        }

        info!(threshold = self.config.threshold, "control loop ready");
        Ok(())
    }

    pub fn tick(&mut self) -> TickOutcome {
        let reading = match self.sensor.read() {
            Ok(reading) => reading,
            Err(err) => {
                warn!("sensor read failed: {err}");
                if let Err(err) = self.display.show_sensor_fault() {
                    warn!("display update failed: {err}");
                }

                // Manual requests do not need a reading; the store is left alone.
                let commands = self.store.commands();
                if commands.mode == Mode::Manual {
                    let motor = self.actuate(commands.manual_motor);
                    if let Err(err) = self.display.write_row(1, &motor_line(motor)) {
                        warn!("display update failed: {err}");
                    }
                }

                self.sleeper.sleep(self.config.fault_retry_delay());
                return TickOutcome::SensorFault;
            }
        };

        debug!(
            raw = reading.raw,
            moisture = reading.moisture_percent,
            "sensor voltage {:.3} V",
            reading.voltage
        );

        let motor = self.actuate(self.decide(reading.moisture_percent));

        self.store.update(SharedStatus::from_reading(&reading, motor));

        if let Err(err) = self.display.show_reading(reading.moisture_percent, motor) {
            warn!("display update failed: {err}");
        }

        self.sleeper.sleep(self.config.settle_delay());
        self.sleeper.sleep(self.config.tick_interval());

        TickOutcome::Applied { reading, motor }
    }

    /// Ticks until `shutdown` is raised, then leaves the pump off.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        while !shutdown.load(Ordering::Relaxed) {
            self.tick();
        }
        self.stop();
    }

    pub fn stop(&mut self) {
        if let Err(err) = self.relay.apply(MotorState::Off) {
            warn!("failed to switch pump off: {err}");
        }
        if let Err(err) = self.display.clear() {
            warn!("failed to clear display: {err}");
        }
        info!("control loop stopped");
    }

    pub fn motor_state(&self) -> MotorState {
        self.relay.state().unwrap_or_default()
    }

    pub fn relay(&self) -> &Relay<P> {
        &self.relay
    }

    pub fn display(&self) -> &StatusDisplay<D> {
        &self.display
    }

    pub fn sleeper(&self) -> &Z {
        &self.sleeper
    }

    /// Drives the relay towards `wanted` and returns the state it is
    /// actually in afterwards.
    fn actuate(&mut self, wanted: MotorState) -> MotorState {
        match self.relay.apply(wanted) {
            Ok(true) => info!("pump {}", wanted.as_str()),
            Ok(false) => {}
            Err(err) => warn!(
                "relay update failed, pump stays {}: {err}",
                self.motor_state().as_str()
            ),
        }
        self.motor_state()
    }

    fn decide(&self, moisture_percent: u8) -> MotorState {
        let commands = self.store.commands();
        match commands.mode {
            Mode::Auto => actuator::decide(moisture_percent, self.config.threshold),
            Mode::Manual => commands.manual_motor,
        }
    }
}

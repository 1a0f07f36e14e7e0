use embedded_hal::digital::OutputPin;

use crate::{error::RelayError, types::MotorState};

/// Pump decision for a moisture reading. Readings equal to the threshold
/// keep the pump off.
pub fn decide(moisture_percent: u8, threshold: u8) -> MotorState {
    if moisture_percent < threshold {
        MotorState::On
    } else {
        MotorState::Off
    }
}

/// Active-high relay driving the water pump.
pub struct Relay<P> {
    pin: P,
    applied: Option<MotorState>,
}

impl<P: OutputPin> Relay<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, applied: None }
    }

    /// Drives the pin for `state`. The level is written on every call;
    /// returns whether the state differs from the last applied one.
    pub fn apply(&mut self, state: MotorState) -> Result<bool, RelayError> {
        match state {
            MotorState::On => self.pin.set_high(),
            MotorState::Off => self.pin.set_low(),
        }
        .map_err(RelayError::from_pin)?;

        let changed = self.applied != Some(state);
        self.applied = Some(state);
        Ok(changed)
    }

    pub fn state(&self) -> Option<MotorState> {
        self.applied
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use embedded_hal::digital::{ErrorKind, ErrorType};
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct RecordingPin {
        high: bool,
        writes: usize,
    }

    impl ErrorType for RecordingPin {
        type Error = Infallible;
    }

    impl OutputPin for RecordingPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            self.writes += 1;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            self.writes += 1;
            Ok(())
        }
    }

    struct BrokenPin;

    impl ErrorType for BrokenPin {
        type Error = ErrorKind;
    }

    impl OutputPin for BrokenPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            Err(ErrorKind::Other)
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            Err(ErrorKind::Other)
        }
    }

    #[test]
    fn below_threshold_turns_pump_on() {
        assert_eq!(decide(34, 35), MotorState::On);
        assert_eq!(decide(0, 35), MotorState::On);
    }

    #[test]
    fn threshold_tie_keeps_pump_off() {
        assert_eq!(decide(35, 35), MotorState::Off);
        assert_eq!(decide(100, 35), MotorState::Off);
        assert_eq!(decide(0, 0), MotorState::Off);
    }

    #[test]
    fn decide_matches_comparison_everywhere() {
        for threshold in 0..=100u8 {
            for moisture in 0..=100u8 {
                assert_eq!(decide(moisture, threshold).is_on(), moisture < threshold);
            }
        }
    }

    #[test]
    fn on_drives_pin_high() {
        let mut relay = Relay::new(RecordingPin::default());

        assert!(relay.apply(MotorState::On).unwrap());
        assert!(relay.pin().high);

        assert!(relay.apply(MotorState::Off).unwrap());
        assert!(!relay.pin().high);
    }

    #[test]
    fn applying_same_state_twice_is_idempotent() {
        let mut relay = Relay::new(RecordingPin::default());

        assert!(relay.apply(MotorState::On).unwrap());
        assert!(!relay.apply(MotorState::On).unwrap());

        assert!(relay.pin().high);
        assert_eq!(relay.state(), Some(MotorState::On));
        assert_eq!(relay.pin().writes, 2);
    }

    #[test]
    fn pin_failure_is_reported_and_state_kept() {
        let mut relay = Relay::new(BrokenPin);

        assert_eq!(
            relay.apply(MotorState::On),
            Err(RelayError::Gpio("Other".to_string()))
        );
        assert_eq!(relay.state(), None);
    }
}

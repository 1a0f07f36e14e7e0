use crate::{error::SensorError, moisture::moisture_percent, types::Reading};

/// One conversion result from an analog input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdcSample {
    pub raw: i16,
    pub voltage: f32,
}

/// A single configured analog input channel.
pub trait AdcChannel {
    fn sample(&mut self) -> Result<AdcSample, SensorError>;
}

/// Source of moisture readings consumed by the control loop.
pub trait MoistureSensor {
    fn read(&mut self) -> Result<Reading, SensorError>;
}

pub struct SensorReader<A> {
    adc: A,
    full_scale_voltage: f32,
}

impl<A: AdcChannel> SensorReader<A> {
    pub fn new(adc: A, full_scale_voltage: f32) -> Self {
        Self {
            adc,
            full_scale_voltage,
        }
    }

    pub fn into_inner(self) -> A {
        self.adc
    }
}

impl<A: AdcChannel> MoistureSensor for SensorReader<A> {
    fn read(&mut self) -> Result<Reading, SensorError> {
        let sample = self.adc.sample()?;
        Ok(Reading {
            raw: sample.raw,
            voltage: sample.voltage,
            moisture_percent: moisture_percent(sample.voltage, self.full_scale_voltage),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FULL_SCALE_VOLTAGE;
    use pretty_assertions::assert_eq;

    struct FixedAdc(Result<AdcSample, SensorError>);

    impl AdcChannel for FixedAdc {
        fn sample(&mut self) -> Result<AdcSample, SensorError> {
            self.0.clone()
        }
    }

    #[test]
    fn derives_moisture_from_voltage() {
        let mut reader = SensorReader::new(
            FixedAdc(Ok(AdcSample {
                raw: 12_000,
                voltage: 2.0,
            })),
            FULL_SCALE_VOLTAGE,
        );

        let reading = reader.read().unwrap();
        assert_eq!(reading.raw, 12_000);
        assert_eq!(reading.voltage, 2.0);
        assert_eq!(reading.moisture_percent, 47);
    }

    #[test]
    fn passes_bus_faults_through() {
        let fault = SensorError::BusFault("NoAcknowledge(Address)".to_string());
        let mut reader = SensorReader::new(FixedAdc(Err(fault.clone())), FULL_SCALE_VOLTAGE);

        assert_eq!(reader.read(), Err(fault));
    }
}

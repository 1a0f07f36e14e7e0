use serde::{Deserialize, Serialize};

use crate::moisture::round_to_hundredths;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MotorState {
    On,
    #[default]
    Off,
}

impl MotorState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }

    pub fn is_on(self) -> bool {
        self == Self::On
    }

    /// Case-insensitive parse of `ON` / `OFF`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ON" => Some(Self::On),
            "OFF" => Some(Self::Off),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    #[default]
    Auto,
    Manual,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::Manual => "MANUAL",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "AUTO" => Some(Self::Auto),
            "MANUAL" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// One sample of the moisture sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub raw: i16,
    pub voltage: f32,
    pub moisture_percent: u8,
}

/// Record published by the control loop for the status page.
///
/// `None` marks a field that has not been measured yet.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SharedStatus {
    pub moisture_percent: Option<u8>,
    pub voltage: Option<f32>,
    pub motor: MotorState,
}

impl SharedStatus {
    pub const UNKNOWN: Self = Self {
        moisture_percent: None,
        voltage: None,
        motor: MotorState::Off,
    };

    pub fn from_reading(reading: &Reading, motor: MotorState) -> Self {
        Self {
            moisture_percent: Some(reading.moisture_percent),
            voltage: Some(round_to_hundredths(reading.voltage)),
            motor,
        }
    }

    pub fn is_known(&self) -> bool {
        self.moisture_percent.is_some()
    }
}

/// Operator requests posted through the status page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorCommands {
    pub mode: Mode,
    #[serde(rename = "manualMotor")]
    pub manual_motor: MotorState,
}

pub mod actuator;
pub mod ads1115;
pub mod config;
pub mod control;
pub mod display;
pub mod error;
pub mod lcd;
pub mod moisture;
pub mod sensor;
pub mod store;
pub mod types;

pub use actuator::{decide, Relay};
pub use config::{ControllerConfig, HardwareConfig, FULL_SCALE_VOLTAGE, HTTP_PORT, THRESHOLD};
pub use control::{ControlLoop, Sleeper, ThreadSleeper, TickOutcome};
pub use display::{CharDisplay, StatusDisplay};
pub use error::{DisplayError, RelayError, SensorError};
pub use sensor::{AdcChannel, AdcSample, MoistureSensor, SensorReader};
pub use store::StatusStore;
pub use types::{Mode, MotorState, OperatorCommands, Reading, SharedStatus};

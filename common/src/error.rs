use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    /// The converter could not be reached or did not answer on the bus.
    #[error("ADC bus fault: {0}")]
    BusFault(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayError {
    #[error("display bus error: {0}")]
    Bus(String),
    #[error("row {row} is outside a {rows}-row display")]
    RowOutOfRange { row: u8, rows: u8 },
    #[error("column {column} is outside a {columns}-column display")]
    ColumnOutOfRange { column: u8, columns: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("relay gpio error: {0}")]
    Gpio(String),
}

impl SensorError {
    pub fn from_i2c<E: embedded_hal::i2c::Error>(err: E) -> Self {
        Self::BusFault(format!("{:?}", err.kind()))
    }
}

impl DisplayError {
    pub fn from_i2c<E: embedded_hal::i2c::Error>(err: E) -> Self {
        Self::Bus(format!("{:?}", err.kind()))
    }
}

impl RelayError {
    pub fn from_pin<E: embedded_hal::digital::Error>(err: E) -> Self {
        Self::Gpio(format!("{:?}", err.kind()))
    }
}

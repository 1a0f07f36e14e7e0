//! HD44780 character LCD behind a PCF8574 I2C backpack, driven in 4-bit mode.
//!
//! Backpack wiring: P0 = RS, P1 = RW, P2 = EN, P3 = backlight, P4..P7 = D4..D7.

use embedded_hal::{delay::DelayNs, i2c::I2c};

use crate::{display::CharDisplay, error::DisplayError};

pub const DEFAULT_ADDRESS: u8 = 0x27;

const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE_INCREMENT: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

pub struct Lcd1602<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    rows: u8,
    columns: u8,
}

impl<I2C: I2c, D: DelayNs> Lcd1602<I2C, D> {
    /// Runs the power-on initialisation sequence and leaves the display
    /// cleared with the backlight on.
    pub fn new(
        i2c: I2C,
        delay: D,
        address: u8,
        rows: u8,
        columns: u8,
    ) -> Result<Self, DisplayError> {
        let mut lcd = Self {
            i2c,
            delay,
            address,
            rows: rows.clamp(1, 4),
            columns: columns.clamp(1, 40),
        };
        lcd.init()?;
        Ok(lcd)
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        self.delay.delay_ms(50);

        // Force 8-bit mode three times, then drop to 4-bit.
        self.write_nibble(0x30, 0)?;
        self.delay.delay_us(4_500);
        self.write_nibble(0x30, 0)?;
        self.delay.delay_us(4_500);
        self.write_nibble(0x30, 0)?;
        self.delay.delay_us(150);
        self.write_nibble(0x20, 0)?;

        self.command(CMD_FUNCTION_4BIT_2LINE)?;
        self.command(CMD_DISPLAY_ON)?;
        self.command(CMD_CLEAR)?;
        self.delay.delay_ms(2);
        self.command(CMD_ENTRY_MODE_INCREMENT)
    }

    fn expander_write(&mut self, byte: u8) -> Result<(), DisplayError> {
        self.i2c
            .write(self.address, &[byte | BACKLIGHT])
            .map_err(DisplayError::from_i2c)
    }

    fn write_nibble(&mut self, nibble: u8, mode: u8) -> Result<(), DisplayError> {
        let byte = (nibble & 0xF0) | mode;
        self.expander_write(byte | EN)?;
        self.delay.delay_us(1);
        self.expander_write(byte)?;
        self.delay.delay_us(50);
        Ok(())
    }

    fn send(&mut self, value: u8, mode: u8) -> Result<(), DisplayError> {
        self.write_nibble(value & 0xF0, mode)?;
        self.write_nibble(value << 4, mode)
    }

    fn command(&mut self, command: u8) -> Result<(), DisplayError> {
        self.send(command, 0)
    }

    fn data(&mut self, byte: u8) -> Result<(), DisplayError> {
        self.send(byte, RS)
    }
}

impl<I2C: I2c, D: DelayNs> CharDisplay for Lcd1602<I2C, D> {
    fn rows(&self) -> u8 {
        self.rows
    }

    fn columns(&self) -> u8 {
        self.columns
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.command(CMD_CLEAR)?;
        self.delay.delay_ms(2);
        Ok(())
    }

    fn write_at(&mut self, row: u8, column: u8, text: &str) -> Result<(), DisplayError> {
        if row >= self.rows {
            return Err(DisplayError::RowOutOfRange {
                row,
                rows: self.rows,
            });
        }
        if column >= self.columns {
            return Err(DisplayError::ColumnOutOfRange {
                column,
                columns: self.columns,
            });
        }
        // Row offset <= 0x54 plus column < 40 fits the 7-bit DDRAM address.
        self.command(CMD_SET_DDRAM | (ROW_OFFSETS[usize::from(row)] + column))?;

        let room = usize::from(self.columns - column);
        for ch in text.chars().take(room) {
            // The character ROM only covers ASCII reliably.
            let byte = if ch.is_ascii() && !ch.is_ascii_control() {
                ch as u8
            } else {
                b'?'
            };
            self.data(byte)?;
        }
        Ok(())
    }
}

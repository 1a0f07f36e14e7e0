use std::time::Duration;

use crate::{control::Sleeper, error::DisplayError, types::MotorState};

pub const SENSOR_FAULT_TEXT: &str = "ADC ERROR";
pub const SPLASH_TEXT: &str = "System Loading";

/// Character display addressed by zero-based (row, column).
pub trait CharDisplay {
    fn rows(&self) -> u8;
    fn columns(&self) -> u8;
    fn clear(&mut self) -> Result<(), DisplayError>;
    fn write_at(&mut self, row: u8, column: u8, text: &str) -> Result<(), DisplayError>;
}

/// Pads with spaces or truncates so `text` covers exactly `columns` cells.
pub fn fit_line(text: &str, columns: usize) -> String {
    let mut line: String = text.chars().take(columns).collect();
    let used = line.chars().count();
    line.extend(std::iter::repeat(' ').take(columns - used));
    line
}

pub fn moisture_line(moisture_percent: u8) -> String {
    format!("Moisture:{moisture_percent:3}%")
}

pub fn motor_line(motor: MotorState) -> String {
    format!("Motor   :{}", motor.as_str())
}

pub struct StatusDisplay<D> {
    device: D,
}

impl<D: CharDisplay> StatusDisplay<D> {
    pub fn new(device: D) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn into_inner(self) -> D {
        self.device
    }

    /// Rewrites both lines; each line fills the full display width.
    pub fn render(&mut self, line1: &str, line2: &str) -> Result<(), DisplayError> {
        self.write_row(0, line1)?;
        self.write_row(1, line2)
    }

    pub fn write_row(&mut self, row: u8, text: &str) -> Result<(), DisplayError> {
        let rows = self.device.rows();
        if row >= rows {
            return Err(DisplayError::RowOutOfRange { row, rows });
        }
        let line = fit_line(text, usize::from(self.device.columns()));
        self.device.write_at(row, 0, &line)
    }

    pub fn show_reading(
        &mut self,
        moisture_percent: u8,
        motor: MotorState,
    ) -> Result<(), DisplayError> {
        self.render(&moisture_line(moisture_percent), &motor_line(motor))
    }

    pub fn show_sensor_fault(&mut self) -> Result<(), DisplayError> {
        self.write_row(0, SENSOR_FAULT_TEXT)
    }

    /// Loading banner with a dot crawling across the second row, then the
    /// idle motor line.
    pub fn boot_splash<S: Sleeper>(
        &mut self,
        sleeper: &mut S,
        step: Duration,
    ) -> Result<(), DisplayError> {
        self.device.clear()?;
        self.device.write_at(0, 0, SPLASH_TEXT)?;
        for column in 0..self.device.columns() {
            self.device.write_at(1, column, ".")?;
            sleeper.sleep(step);
        }
        self.device.clear()?;
        self.write_row(1, &motor_line(MotorState::Off))
    }

    pub fn clear(&mut self) -> Result<(), DisplayError> {
        self.device.clear()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// In-memory character grid.
    pub(crate) struct GridDisplay {
        pub cells: Vec<Vec<char>>,
        pub fail: bool,
    }

    impl GridDisplay {
        pub fn new(rows: usize, columns: usize) -> Self {
            Self {
                cells: vec![vec![' '; columns]; rows],
                fail: false,
            }
        }

        pub fn line(&self, row: usize) -> String {
            self.cells[row].iter().collect()
        }
    }

    impl CharDisplay for GridDisplay {
        fn rows(&self) -> u8 {
            self.cells.len() as u8
        }

        fn columns(&self) -> u8 {
            self.cells[0].len() as u8
        }

        fn clear(&mut self) -> Result<(), DisplayError> {
            if self.fail {
                return Err(DisplayError::Bus("Other".to_string()));
            }
            for row in &mut self.cells {
                row.fill(' ');
            }
            Ok(())
        }

        fn write_at(&mut self, row: u8, column: u8, text: &str) -> Result<(), DisplayError> {
            if self.fail {
                return Err(DisplayError::Bus("Other".to_string()));
            }
            let cells = &mut self.cells[usize::from(row)];
            for (offset, ch) in text.chars().enumerate() {
                if let Some(cell) = cells.get_mut(usize::from(column) + offset) {
                    *cell = ch;
                }
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingSleeper(Vec<Duration>);

    impl Sleeper for CountingSleeper {
        fn sleep(&mut self, duration: Duration) {
            self.0.push(duration);
        }
    }

    #[test]
    fn fit_line_pads_and_truncates() {
        assert_eq!(fit_line("Motor   :ON", 16), "Motor   :ON     ");
        assert_eq!(fit_line("a much longer status line", 16), "a much longer st");
        assert_eq!(fit_line("", 4), "    ");
    }

    #[test]
    fn status_lines_match_lcd_layout() {
        assert_eq!(moisture_line(7), "Moisture:  7%");
        assert_eq!(moisture_line(100), "Moisture:100%");
        assert_eq!(motor_line(MotorState::On), "Motor   :ON");
        assert_eq!(motor_line(MotorState::Off), "Motor   :OFF");
    }

    #[test]
    fn reading_overwrites_stale_characters() {
        let mut display = StatusDisplay::new(GridDisplay::new(2, 16));
        display.show_reading(100, MotorState::Off).unwrap();
        display.show_reading(5, MotorState::On).unwrap();

        assert_eq!(display.device().line(0), "Moisture:  5%   ");
        assert_eq!(display.device().line(1), "Motor   :ON     ");
    }

    #[test]
    fn fault_only_touches_first_row() {
        let mut display = StatusDisplay::new(GridDisplay::new(2, 16));
        display.show_reading(40, MotorState::On).unwrap();
        display.show_sensor_fault().unwrap();

        assert_eq!(display.device().line(0), "ADC ERROR       ");
        assert_eq!(display.device().line(1), "Motor   :ON     ");
    }

    #[test]
    fn splash_steps_once_per_column() {
        let mut display = StatusDisplay::new(GridDisplay::new(2, 16));
        let mut sleeper = CountingSleeper::default();
        display
            .boot_splash(&mut sleeper, Duration::from_millis(100))
            .unwrap();

        assert_eq!(sleeper.0, vec![Duration::from_millis(100); 16]);
        assert_eq!(display.device().line(0), " ".repeat(16));
        assert_eq!(display.device().line(1), "Motor   :OFF    ");
    }

    #[test]
    fn rows_beyond_device_are_rejected() {
        let mut display = StatusDisplay::new(GridDisplay::new(1, 16));
        assert_eq!(
            display.render("one", "two"),
            Err(DisplayError::RowOutOfRange { row: 1, rows: 1 })
        );
    }

    #[test]
    fn device_errors_surface() {
        let mut grid = GridDisplay::new(2, 16);
        grid.fail = true;
        let mut display = StatusDisplay::new(grid);

        assert!(matches!(
            display.show_reading(50, MotorState::Off),
            Err(DisplayError::Bus(_))
        ));
    }
}

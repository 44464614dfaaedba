//! 16x2 HD44780 character display behind a PCF8574 I2C backpack
//!
//! The backpack maps its eight outputs to the display as:
//!
//! | bit | 7..4   | 3         | 2  | 1  | 0  |
//! |-----|--------|-----------|----|----|----|
//! |     | D7..D4 | backlight | EN | RW | RS |
//!
//! The display runs in 4-bit mode, so every byte goes out as two nibbles,
//! each latched by pulsing EN.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use attendant_core::status::{StatusLines, LINE_WIDTH};

/// Usual backpack address (0x3F on some boards)
pub const DEFAULT_ADDRESS: u8 = 0x27;

const BACKLIGHT: u8 = 0x08;
const ENABLE: u8 = 0x04;
const REGISTER_SELECT: u8 = 0x01;

/// HD44780 commands
mod cmd {
    pub const CLEAR: u8 = 0x01;
    pub const ENTRY_LEFT: u8 = 0x06;
    pub const DISPLAY_ON: u8 = 0x0C;
    pub const FUNCTION_4BIT_2LINE: u8 = 0x28;
    pub const SET_DDRAM: u8 = 0x80;
}

/// DDRAM address of each row
const ROW_OFFSETS: [u8; 2] = [0x00, 0x40];

/// Character LCD driver; the bus is passed to every call
#[derive(Debug, Clone)]
pub struct Lcd1602 {
    address: u8,
    backlight: bool,
}

impl Lcd1602 {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            backlight: true,
        }
    }

    /// Run the 4-bit initialization sequence and clear the screen
    pub fn init<I: I2c, D: DelayNs>(&mut self, i2c: &mut I, delay: &mut D) -> Result<(), I::Error> {
        delay.delay_ms(50);

        // Three 8-bit function sets, then switch to 4-bit
        for wait_us in [4500, 150, 150] {
            self.write_nibble(i2c, 0x30, 0)?;
            delay.delay_us(wait_us);
        }
        self.write_nibble(i2c, 0x20, 0)?;

        self.command(i2c, cmd::FUNCTION_4BIT_2LINE)?;
        self.command(i2c, cmd::DISPLAY_ON)?;
        self.command(i2c, cmd::CLEAR)?;
        delay.delay_ms(2);
        self.command(i2c, cmd::ENTRY_LEFT)
    }

    /// Turn the backlight on or off
    pub fn set_backlight<I: I2c>(&mut self, i2c: &mut I, on: bool) -> Result<(), I::Error> {
        self.backlight = on;
        i2c.write(self.address, &[self.backlight_bit()])
    }

    /// Write one row, padded with spaces to the full width
    pub fn write_line<I: I2c>(&mut self, i2c: &mut I, row: u8, text: &str) -> Result<(), I::Error> {
        let offset = ROW_OFFSETS[(row as usize).min(ROW_OFFSETS.len() - 1)];
        self.command(i2c, cmd::SET_DDRAM | offset)?;

        let mut bytes = text.bytes();
        for _ in 0..LINE_WIDTH {
            let c = match bytes.next() {
                Some(b) if b.is_ascii() && !b.is_ascii_control() => b,
                Some(_) => b'?',
                None => b' ',
            };
            self.write_byte(i2c, c, REGISTER_SELECT)?;
        }
        Ok(())
    }

    /// Show both status lines
    pub fn show<I: I2c>(&mut self, i2c: &mut I, lines: &StatusLines) -> Result<(), I::Error> {
        self.write_line(i2c, 0, lines.top.as_str())?;
        self.write_line(i2c, 1, lines.bottom.as_str())
    }

    fn backlight_bit(&self) -> u8 {
        if self.backlight {
            BACKLIGHT
        } else {
            0
        }
    }

    fn command<I: I2c>(&mut self, i2c: &mut I, value: u8) -> Result<(), I::Error> {
        self.write_byte(i2c, value, 0)
    }

    fn write_byte<I: I2c>(&mut self, i2c: &mut I, value: u8, mode: u8) -> Result<(), I::Error> {
        self.write_nibble(i2c, value & 0xF0, mode)?;
        self.write_nibble(i2c, (value << 4) & 0xF0, mode)
    }

    /// Put a high nibble on D7..D4 and pulse EN
    fn write_nibble<I: I2c>(&mut self, i2c: &mut I, nibble: u8, mode: u8) -> Result<(), I::Error> {
        let bits = nibble | mode | self.backlight_bit();
        i2c.write(self.address, &[bits | ENABLE, bits])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeDelay, FakeI2c};
    use attendant_core::mode::Mode;
    use attendant_core::status::StatusSnapshot;

    /// Reassemble the bytes latched by EN pulses
    fn latched(bus: &FakeI2c) -> heapless::Vec<(u8, bool), 64> {
        let nibbles: heapless::Vec<u8, 128> = bus
            .writes
            .iter()
            .filter(|(_, d)| d.len() == 2 && d[0] & ENABLE != 0)
            .map(|(_, d)| d[1])
            .collect();

        nibbles
            .chunks(2)
            .filter(|pair| pair.len() == 2)
            .map(|pair| {
                let byte = (pair[0] & 0xF0) | (pair[1] >> 4);
                (byte, pair[0] & REGISTER_SELECT != 0)
            })
            .collect()
    }

    #[test]
    fn test_init_sends_function_set() {
        let mut lcd = Lcd1602::new(DEFAULT_ADDRESS);
        let mut bus = FakeI2c::default();
        let mut delay = FakeDelay::default();

        lcd.init(&mut bus, &mut delay).unwrap();

        assert_eq!(bus.writes.len(), 4 + 4 * 2);
        assert!(bus.writes.iter().all(|(addr, _)| *addr == DEFAULT_ADDRESS));
        assert!(delay.total_ns >= 50_000_000);
    }

    #[test]
    fn test_write_line_pads() {
        let mut lcd = Lcd1602::new(DEFAULT_ADDRESS);
        let mut bus = FakeI2c::default();

        lcd.write_line(&mut bus, 1, "Hi").unwrap();

        let bytes = latched(&bus);
        assert_eq!(bytes[0], (cmd::SET_DDRAM | 0x40, false));
        assert_eq!(bytes[1], (b'H', true));
        assert_eq!(bytes[2], (b'i', true));
        assert_eq!(bytes.len(), 1 + LINE_WIDTH);
        assert!(bytes[3..].iter().all(|b| *b == (b' ', true)));
    }

    #[test]
    fn test_show_status_lines() {
        let mut lcd = Lcd1602::new(DEFAULT_ADDRESS);
        let mut bus = FakeI2c::default();
        let lines = StatusLines::render(&StatusSnapshot {
            mode: Mode::ObstacleStop,
            time: None,
            distance: None,
            frame_count: 0,
            frame_index: 0,
        });

        lcd.show(&mut bus, &lines).unwrap();

        let bytes = latched(&bus);
        assert_eq!(bytes.len(), 2 * (1 + LINE_WIDTH));
        let second_row = &bytes[LINE_WIDTH + 2..];
        assert_eq!(second_row[0], (b'O', true));
    }

    #[test]
    fn test_backlight_off() {
        let mut lcd = Lcd1602::new(DEFAULT_ADDRESS);
        let mut bus = FakeI2c::default();
        lcd.set_backlight(&mut bus, false).unwrap();
        lcd.write_line(&mut bus, 0, "x").unwrap();
        assert!(bus.writes.iter().all(|(_, d)| d.iter().all(|b| b & BACKLIGHT == 0)));
    }
}

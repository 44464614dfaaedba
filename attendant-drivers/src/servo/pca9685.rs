//! PCA9685 16-channel PWM expander driving hobby servos
//!
//! The chip runs from its internal 25 MHz oscillator. At 50 Hz one PWM
//! period is 4096 ticks of 20 ms, so a servo pulse of 0.5-2.5 ms is
//! roughly 100-500 ticks; the exact end points vary per servo and are
//! configurable.
//!
//! # Register writes
//!
//! Each channel has four registers (ON_L, ON_H, OFF_L, OFF_H) starting at
//! `LED0_ON_L + 4 * channel`. With auto-increment enabled a channel is set
//! with a single 5-byte write.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use attendant_core::sequence::MAX_ANGLE;

/// PCA9685 register addresses
pub mod reg {
    /// Mode register 1
    pub const MODE1: u8 = 0x00;
    /// Mode register 2
    pub const MODE2: u8 = 0x01;
    /// First channel, ON low byte
    pub const LED0_ON_L: u8 = 0x06;
    /// Output frequency prescaler
    pub const PRE_SCALE: u8 = 0xFE;
}

/// MODE1 bits
pub mod mode1 {
    pub const RESTART: u8 = 0x80;
    pub const AUTO_INCREMENT: u8 = 0x20;
    pub const SLEEP: u8 = 0x10;
    pub const ALLCALL: u8 = 0x01;
}

/// MODE2 totem-pole outputs
const MODE2_OUTDRV: u8 = 0x04;

/// Default I2C address (all address pins low)
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// Number of PWM channels
pub const CHANNEL_COUNT: u8 = 16;

/// Ticks per PWM period
const PERIOD_TICKS: u32 = 4096;

/// Errors from the servo expander
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoError<E> {
    /// I2C transfer failed
    Bus(E),
    /// Channel out of range
    InvalidChannel,
}

/// PCA9685 configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pca9685Config {
    /// 7-bit I2C address
    pub address: u8,
    /// Oscillator frequency in Hz
    pub oscillator_hz: u32,
    /// PWM output frequency in Hz
    pub pwm_hz: u16,
    /// Pulse length in ticks at 0 degrees
    pub servo_min: u16,
    /// Pulse length in ticks at 180 degrees
    pub servo_max: u16,
}

impl Default for Pca9685Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            oscillator_hz: 25_000_000,
            pwm_hz: 50,
            servo_min: 120,
            servo_max: 600,
        }
    }
}

impl Pca9685Config {
    /// PRE_SCALE register value for the configured frequency
    ///
    /// prescale = round(osc / (4096 * freq)) - 1, clamped to the chip's 3..=255
    pub fn prescale(&self) -> u8 {
        let denom = PERIOD_TICKS * self.pwm_hz.max(1) as u32;
        let rounded = (self.oscillator_hz + denom / 2) / denom;
        rounded.saturating_sub(1).clamp(3, 255) as u8
    }

    /// Pulse length in ticks for an angle (linear between min and max)
    pub fn angle_to_ticks(&self, angle: u8) -> u16 {
        let angle = angle.min(MAX_ANGLE) as i32;
        let min = self.servo_min as i32;
        let max = self.servo_max as i32;
        (min + (max - min) * angle / MAX_ANGLE as i32) as u16
    }
}

/// PCA9685 servo expander
///
/// Holds only configuration; the I2C bus is passed to every call.
#[derive(Debug, Clone)]
pub struct Pca9685 {
    config: Pca9685Config,
}

impl Pca9685 {
    pub fn new(config: Pca9685Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Pca9685Config {
        &self.config
    }

    /// Program the output frequency and enable auto-increment
    ///
    /// The prescaler can only be written while the oscillator sleeps.
    pub fn init<I: I2c, D: DelayNs>(
        &self,
        i2c: &mut I,
        delay: &mut D,
    ) -> Result<(), ServoError<I::Error>> {
        let addr = self.config.address;

        self.write_reg(i2c, reg::MODE1, mode1::SLEEP | mode1::ALLCALL)?;
        self.write_reg(i2c, reg::PRE_SCALE, self.config.prescale())?;
        self.write_reg(i2c, reg::MODE2, MODE2_OUTDRV)?;
        self.write_reg(i2c, reg::MODE1, mode1::ALLCALL)?;

        // Oscillator needs 500us to stabilize before RESTART
        delay.delay_us(500);

        i2c.write(
            addr,
            &[
                reg::MODE1,
                mode1::RESTART | mode1::AUTO_INCREMENT | mode1::ALLCALL,
            ],
        )
        .map_err(ServoError::Bus)
    }

    /// Set a channel's pulse length in ticks
    pub fn set_ticks<I: I2c>(
        &self,
        i2c: &mut I,
        channel: u8,
        ticks: u16,
    ) -> Result<(), ServoError<I::Error>> {
        if channel >= CHANNEL_COUNT {
            return Err(ServoError::InvalidChannel);
        }

        let off = ticks.min(PERIOD_TICKS as u16 - 1);
        let base = reg::LED0_ON_L + 4 * channel;
        i2c.write(
            self.config.address,
            &[base, 0, 0, off as u8, (off >> 8) as u8],
        )
        .map_err(ServoError::Bus)
    }

    /// Move a servo to an angle in degrees
    pub fn set_angle<I: I2c>(
        &self,
        i2c: &mut I,
        channel: u8,
        angle: u8,
    ) -> Result<(), ServoError<I::Error>> {
        self.set_ticks(i2c, channel, self.config.angle_to_ticks(angle))
    }

    /// Stop driving a channel (servo goes limp)
    pub fn release<I: I2c>(&self, i2c: &mut I, channel: u8) -> Result<(), ServoError<I::Error>> {
        self.set_ticks(i2c, channel, 0)
    }

    fn write_reg<I: I2c>(&self, i2c: &mut I, reg: u8, value: u8) -> Result<(), ServoError<I::Error>> {
        i2c.write(self.config.address, &[reg, value])
            .map_err(ServoError::Bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeDelay, FakeI2c};

    #[test]
    fn test_prescale_50hz() {
        let config = Pca9685Config::default();
        assert_eq!(config.prescale(), 121);
    }

    #[test]
    fn test_prescale_clamped() {
        let config = Pca9685Config {
            pwm_hz: 5000,
            ..Default::default()
        };
        assert_eq!(config.prescale(), 3);
    }

    #[test]
    fn test_angle_to_ticks() {
        let config = Pca9685Config::default();
        assert_eq!(config.angle_to_ticks(0), 120);
        assert_eq!(config.angle_to_ticks(90), 360);
        assert_eq!(config.angle_to_ticks(180), 600);
        assert_eq!(config.angle_to_ticks(255), 600);
    }

    #[test]
    fn test_init_sequence() {
        let chip = Pca9685::new(Pca9685Config::default());
        let mut bus = FakeI2c::default();
        let mut delay = FakeDelay::default();

        chip.init(&mut bus, &mut delay).unwrap();

        let writes: heapless::Vec<&[u8], 8> = bus.writes.iter().map(|(_, d)| d.as_slice()).collect();
        assert_eq!(writes[0], &[reg::MODE1, 0x11]);
        assert_eq!(writes[1], &[reg::PRE_SCALE, 121]);
        assert_eq!(writes.last().copied(), Some(&[reg::MODE1, 0xA1][..]));
        assert!(bus.writes.iter().all(|(addr, _)| *addr == DEFAULT_ADDRESS));
        assert!(delay.total_ns >= 500_000);
    }

    #[test]
    fn test_set_angle_writes_channel_block() {
        let chip = Pca9685::new(Pca9685Config::default());
        let mut bus = FakeI2c::default();

        chip.set_angle(&mut bus, 3, 90).unwrap();

        // 360 ticks = 0x0168
        let (_, data) = &bus.writes[0];
        assert_eq!(data.as_slice(), &[0x06 + 12, 0, 0, 0x68, 0x01]);
    }

    #[test]
    fn test_invalid_channel() {
        let chip = Pca9685::new(Pca9685Config::default());
        let mut bus = FakeI2c::default();

        assert_eq!(
            chip.set_angle(&mut bus, 16, 90),
            Err(ServoError::InvalidChannel)
        );
        assert!(bus.writes.is_empty());
    }

    #[test]
    fn test_bus_error_propagates() {
        let chip = Pca9685::new(Pca9685Config::default());
        let mut bus = FakeI2c {
            fail: true,
            ..Default::default()
        };

        assert!(matches!(
            chip.set_angle(&mut bus, 0, 10),
            Err(ServoError::Bus(_))
        ));
    }
}

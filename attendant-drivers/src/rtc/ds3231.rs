//! DS3231 real-time clock
//!
//! Time registers are BCD. Hours may be in 12-hour mode (bit 6 set) with
//! the PM flag in bit 5; both modes are decoded to 24-hour time.
//! The oscillator-stop flag in the status register is set after the
//! backup battery ran out, meaning the time is not trustworthy.

use embedded_hal::i2c::I2c;

use attendant_core::schedule::WallTime;

/// DS3231 register addresses
pub mod reg {
    pub const SECONDS: u8 = 0x00;
    pub const MINUTES: u8 = 0x01;
    pub const HOURS: u8 = 0x02;
    pub const CONTROL: u8 = 0x0E;
    pub const STATUS: u8 = 0x0F;
}

/// Fixed I2C address
pub const ADDRESS: u8 = 0x68;

const HOURS_12H: u8 = 0x40;
const HOURS_PM: u8 = 0x20;
const STATUS_OSF: u8 = 0x80;

/// RTC errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RtcError<E> {
    /// I2C transfer failed
    Bus(E),
    /// Registers held an impossible time
    InvalidTime,
}

fn from_bcd(value: u8) -> u8 {
    (value >> 4) * 10 + (value & 0x0F)
}

fn to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

fn decode_hours(raw: u8) -> u8 {
    if raw & HOURS_12H != 0 {
        let hour12 = from_bcd(raw & 0x1F) % 12;
        if raw & HOURS_PM != 0 {
            hour12 + 12
        } else {
            hour12
        }
    } else {
        from_bcd(raw & 0x3F)
    }
}

/// DS3231 driver; the bus is passed to every call
#[derive(Debug, Clone, Copy, Default)]
pub struct Ds3231;

impl Ds3231 {
    pub fn new() -> Self {
        Self
    }

    /// Check the chip answers on the bus
    pub fn probe<I: I2c>(&self, i2c: &mut I) -> Result<(), RtcError<I::Error>> {
        let mut status = [0u8; 1];
        i2c.write_read(ADDRESS, &[reg::STATUS], &mut status)
            .map_err(RtcError::Bus)
    }

    /// Read the current time of day
    pub fn now<I: I2c>(&self, i2c: &mut I) -> Result<WallTime, RtcError<I::Error>> {
        let mut raw = [0u8; 3];
        i2c.write_read(ADDRESS, &[reg::SECONDS], &mut raw)
            .map_err(RtcError::Bus)?;

        WallTime::new(
            decode_hours(raw[2]),
            from_bcd(raw[1] & 0x7F),
            from_bcd(raw[0] & 0x7F),
        )
        .ok_or(RtcError::InvalidTime)
    }

    /// Set the time of day (24-hour mode)
    pub fn set_time<I: I2c>(&self, i2c: &mut I, time: WallTime) -> Result<(), RtcError<I::Error>> {
        i2c.write(
            ADDRESS,
            &[
                reg::SECONDS,
                to_bcd(time.second),
                to_bcd(time.minute),
                to_bcd(time.hour),
            ],
        )
        .map_err(RtcError::Bus)?;
        self.clear_lost_power(i2c)
    }

    /// Check whether the oscillator stopped since the time was last set
    pub fn lost_power<I: I2c>(&self, i2c: &mut I) -> Result<bool, RtcError<I::Error>> {
        let mut status = [0u8; 1];
        i2c.write_read(ADDRESS, &[reg::STATUS], &mut status)
            .map_err(RtcError::Bus)?;
        Ok(status[0] & STATUS_OSF != 0)
    }

    fn clear_lost_power<I: I2c>(&self, i2c: &mut I) -> Result<(), RtcError<I::Error>> {
        let mut status = [0u8; 1];
        i2c.write_read(ADDRESS, &[reg::STATUS], &mut status)
            .map_err(RtcError::Bus)?;
        i2c.write(ADDRESS, &[reg::STATUS, status[0] & !STATUS_OSF])
            .map_err(RtcError::Bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeI2c;

    fn bus_with(reads: &[u8]) -> FakeI2c {
        FakeI2c {
            reads: heapless::Vec::from_slice(reads).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_bcd() {
        assert_eq!(from_bcd(0x59), 59);
        assert_eq!(to_bcd(23), 0x23);
    }

    #[test]
    fn test_read_24h() {
        let mut bus = bus_with(&[0x30, 0x01, 0x08]);
        let time = Ds3231::new().now(&mut bus).unwrap();
        assert_eq!(time, WallTime::new(8, 1, 30).unwrap());
        assert_eq!(bus.writes[0].1.as_slice(), &[reg::SECONDS]);
    }

    #[test]
    fn test_read_12h() {
        // 6 PM
        let mut bus = bus_with(&[0x00, 0x00, HOURS_12H | HOURS_PM | 0x06]);
        assert_eq!(Ds3231::new().now(&mut bus).unwrap().hour, 18);

        // 12 AM is midnight
        let mut bus = bus_with(&[0x00, 0x00, HOURS_12H | 0x12]);
        assert_eq!(Ds3231::new().now(&mut bus).unwrap().hour, 0);

        // 12 PM is noon
        let mut bus = bus_with(&[0x00, 0x00, HOURS_12H | HOURS_PM | 0x12]);
        assert_eq!(Ds3231::new().now(&mut bus).unwrap().hour, 12);
    }

    #[test]
    fn test_invalid_registers() {
        let mut bus = bus_with(&[0x00, 0x75, 0x08]);
        assert_eq!(Ds3231::new().now(&mut bus), Err(RtcError::InvalidTime));
    }

    #[test]
    fn test_set_time_clears_osf() {
        let mut bus = bus_with(&[0x88]);
        let time = WallTime::new(12, 1, 0).unwrap();
        Ds3231::new().set_time(&mut bus, time).unwrap();

        assert_eq!(bus.writes[0].1.as_slice(), &[reg::SECONDS, 0x00, 0x01, 0x12]);
        assert_eq!(bus.writes.last().unwrap().1.as_slice(), &[reg::STATUS, 0x08]);
    }

    #[test]
    fn test_lost_power() {
        let mut bus = bus_with(&[0x80]);
        assert_eq!(Ds3231::new().lost_power(&mut bus), Ok(true));
    }
}

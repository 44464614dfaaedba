//! Fake buses and pins for driver tests

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::i2c::{self, I2c, Operation};
use embedded_hal::pwm::{self, SetDutyCycle};
use heapless::Vec;

/// One recorded I2C write
pub type Write = (u8, Vec<u8, 8>);

/// I2C bus that records writes and answers reads from a queue
#[derive(Default)]
pub struct FakeI2c {
    pub writes: Vec<Write, 256>,
    pub reads: Vec<u8, 32>,
    pub fail: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

impl i2c::Error for BusFault {
    fn kind(&self) -> i2c::ErrorKind {
        i2c::ErrorKind::Other
    }
}

impl i2c::ErrorType for FakeI2c {
    type Error = BusFault;
}

impl I2c for FakeI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.fail {
            return Err(BusFault);
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    let data = Vec::from_slice(bytes).map_err(|_| BusFault)?;
                    self.writes.push((address, data)).map_err(|_| BusFault)?;
                }
                Operation::Read(buf) => {
                    for b in buf.iter_mut() {
                        *b = if self.reads.is_empty() {
                            0
                        } else {
                            self.reads.remove(0)
                        };
                    }
                }
            }
        }
        Ok(())
    }
}

impl FakeI2c {
    /// Writes that started with `reg`
    pub fn writes_to(&self, reg: u8) -> impl Iterator<Item = &[u8]> {
        self.writes
            .iter()
            .map(|(_, data)| data.as_slice())
            .filter(move |data| data.first() == Some(&reg))
    }
}

/// Output pin that remembers its level and how often it changed
#[derive(Default)]
pub struct FakePin {
    pub high: bool,
    pub edges: u32,
}

impl digital::ErrorType for FakePin {
    type Error = Infallible;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.high {
            self.edges += 1;
        }
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high {
            self.edges += 1;
        }
        self.high = true;
        Ok(())
    }
}

/// PWM channel with a 0-1000 duty range
#[derive(Default)]
pub struct FakePwm {
    pub duty: u16,
}

impl pwm::ErrorType for FakePwm {
    type Error = Infallible;
}

impl SetDutyCycle for FakePwm {
    fn max_duty_cycle(&self) -> u16 {
        1000
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duty = duty;
        Ok(())
    }
}

/// Delay that only adds up the requested time
#[derive(Default)]
pub struct FakeDelay {
    pub total_ns: u64,
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

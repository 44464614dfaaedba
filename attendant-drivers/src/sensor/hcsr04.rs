//! HC-SR04 ultrasonic ranging
//!
//! A 10us pulse on TRIG starts a measurement; ECHO then goes high for the
//! round-trip time of the burst. Distance in cm is `echo_us / 58`. No
//! echo within 30ms means nothing in range.
//!
//! Timing the echo pulse needs a clock and a bounded wait, so the
//! firmware does it; this driver owns the trigger side and the conversion.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use attendant_core::safety::RangeReading;

/// Longest echo accepted, in microseconds (about 5 m)
pub const ECHO_TIMEOUT_US: u32 = 30_000;

/// Trigger pulse width in microseconds
pub const TRIGGER_PULSE_US: u32 = 10;

/// Minimum time between measurements so old echoes die out
pub const MIN_CYCLE_MS: u32 = 60;

/// HC-SR04 trigger side
pub struct Hcsr04<P> {
    trigger: P,
}

impl<P: OutputPin> Hcsr04<P> {
    pub fn new(trigger: P) -> Self {
        Self { trigger }
    }

    /// Emit the trigger pulse
    pub fn trigger<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), P::Error> {
        self.trigger.set_low()?;
        delay.delay_us(2);
        self.trigger.set_high()?;
        delay.delay_us(TRIGGER_PULSE_US);
        self.trigger.set_low()
    }
}

/// Convert a measured echo width into a reading
///
/// `None` (the wait timed out) and over-long echoes read as no echo.
pub fn reading_from_echo(echo_us: Option<u32>) -> RangeReading {
    match echo_us {
        Some(us) if us <= ECHO_TIMEOUT_US => RangeReading::from_echo_us(Some(us)),
        _ => RangeReading::NoEcho,
    }
}

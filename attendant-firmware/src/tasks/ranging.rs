//! Ultrasonic ranging task
//!
//! Triggers the HC-SR04, times the echo pulse and publishes the reading.
//! A missing or overlong echo reads as "no obstacle".

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::{Input, Output};
use embassy_time::{Delay, Duration, Instant, Timer};

use attendant_drivers::sensor::hcsr04::MIN_CYCLE_MS;
use attendant_drivers::sensor::{reading_from_echo, Hcsr04, ECHO_TIMEOUT_US};

use crate::channels::RANGE;

/// Ranging task - one measurement per sensor cycle
#[embassy_executor::task]
pub async fn ranging_task(trigger: Output<'static>, mut echo: Input<'static>) {
    info!("Ranging task started");

    let mut sensor = Hcsr04::new(trigger);
    let mut delay = Delay;

    loop {
        // GPIO writes are infallible on the RP2040
        let _ = sensor.trigger(&mut delay);

        let echo_us = measure_echo(&mut echo).await;
        let reading = reading_from_echo(echo_us);
        trace!("Range: {:?}", reading);
        RANGE.signal(reading);

        Timer::after_millis(MIN_CYCLE_MS as u64).await;
    }
}

/// Width of the echo pulse in microseconds, or `None` on timeout
async fn measure_echo(echo: &mut Input<'static>) -> Option<u32> {
    let timeout = Duration::from_micros(ECHO_TIMEOUT_US as u64);

    let pulse = async {
        echo.wait_for_high().await;
        let rise = Instant::now();
        echo.wait_for_low().await;
        rise.elapsed().as_micros() as u32
    };

    match select(pulse, Timer::after(timeout)).await {
        Either::First(us) => Some(us),
        Either::Second(()) => None,
    }
}

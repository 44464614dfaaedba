//! Control loop task
//!
//! Owns the controller and the I2C bus. Every cycle it feeds the latest
//! distance and wall time to the controller, then drains queued requests,
//! and carries out the resulting effects on the hardware.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_rp::i2c::{Blocking, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_rp::pwm::PwmOutput;
use embassy_time::{Duration, Instant, Ticker};

use attendant_core::safety::RangeReading;
use attendant_core::schedule::WallTime;
use attendant_core::status::StatusLines;
use attendant_core::{Effects, Outcome, RobotController, Sensors};
use attendant_drivers::display::Lcd1602;
use attendant_drivers::drive::DifferentialDrive;
use attendant_drivers::indicator::{Buzzer, StatusLeds};
use attendant_drivers::rtc::Ds3231;
use attendant_drivers::ActuatorFacade;

use crate::channels::{PersistRequest, COMMANDS, PERSIST, RANGE, REPLIES};

/// Polling period
pub const CONTROL_PERIOD_MS: u64 = 20;

/// How often the wall clock is read
const CLOCK_PERIOD_MS: u64 = 500;

/// Display refresh period when nothing changes
const DISPLAY_PERIOD_MS: u64 = 500;

/// Shared I2C bus (servo expander, RTC, display)
pub type Bus = I2c<'static, I2C0, Blocking>;

/// Wheel pair on the L298N
pub type Wheels = DifferentialDrive<PwmOutput<'static>, Output<'static>>;

/// Everything the control loop drives
pub struct Hardware {
    pub i2c: Bus,
    pub actuators: ActuatorFacade<Wheels>,
    /// `None` when the clock did not answer at boot
    pub rtc: Option<Ds3231>,
    /// `None` when the display did not answer at boot
    pub lcd: Option<Lcd1602>,
    pub leds: StatusLeds<Output<'static>>,
    pub buzzer: Buzzer<Output<'static>>,
}

/// Control task - the single polling loop
#[embassy_executor::task]
pub async fn control_task(mut controller: RobotController, mut hw: Hardware) {
    info!("Control task started");

    let mut ticker = Ticker::every(Duration::from_millis(CONTROL_PERIOD_MS));
    let start = Instant::now();

    let mut range = RangeReading::NoEcho;
    let mut wall: Option<WallTime> = read_clock(&mut hw);
    let mut last_clock_ms = 0;
    let mut last_display_ms = 0;

    // Startup effects: home pose, parked wiper, buzzer off
    let effects = controller.take_effects();
    apply_effects(&mut hw, &controller, effects);
    refresh_display(&mut hw, &controller);

    loop {
        ticker.next().await;
        let now_ms = start.elapsed().as_millis();

        if let Some(reading) = RANGE.try_take() {
            range = reading;
        }

        if now_ms.saturating_sub(last_clock_ms) >= CLOCK_PERIOD_MS {
            wall = read_clock(&mut hw);
            last_clock_ms = now_ms;
        }

        let effects = controller.tick(now_ms, Sensors { range, wall });
        let mut changed = apply_effects(&mut hw, &controller, effects);

        // Requests after the tick, so an obstacle seen this cycle blocks them
        while let Ok(inbound) = COMMANDS.try_receive() {
            let result = match inbound.request {
                Ok(request) => {
                    let result = controller.request(request, now_ms);
                    match result {
                        Ok(outcome) => debug!("{:?} -> {:?}", request, outcome),
                        Err(rejection) => info!("{:?} rejected: {:?}", request, rejection),
                    }
                    result
                }
                Err(rejection) => Err(rejection),
            };

            if inbound.reply && REPLIES.try_send(Outcome::reply(result)).is_err() {
                warn!("Reply channel full, dropping reply");
            }

            let effects = controller.take_effects();
            changed |= apply_effects(&mut hw, &controller, effects);
        }

        if changed || now_ms.saturating_sub(last_display_ms) >= DISPLAY_PERIOD_MS {
            refresh_display(&mut hw, &controller);
            last_display_ms = now_ms;
        }
    }
}

/// Carry out one batch of effects; returns true if the mode changed
fn apply_effects(hw: &mut Hardware, controller: &RobotController, effects: Effects) -> bool {
    if effects.is_empty() {
        return false;
    }

    if let Some(targets) = effects.actuators {
        if let Err(e) = hw.actuators.apply(&mut hw.i2c, &targets) {
            error!("Actuator write failed: {:?}", Debug2Format(&e));
            // Wheels are on GPIO/PWM; stop them even if the bus is down
            if hw.actuators.halt().is_err() {
                error!("Wheel stop failed");
            }
        }
    }

    if let Some(angle) = effects.wiper {
        if let Err(e) = hw.actuators.set_wiper(&mut hw.i2c, angle) {
            warn!("Wiper write failed: {:?}", Debug2Format(&e));
        }
    }

    if let Some(on) = effects.buzzer {
        // GPIO writes are infallible on the RP2040
        let _ = hw.buzzer.set(on);
    }

    for kind in effects.persist {
        let request = PersistRequest {
            kind,
            record: controller.store().record(kind),
        };
        if PERSIST.try_send(request).is_err() {
            warn!("Persist queue full, {} routine not saved", kind.name());
        }
    }

    if let Some(time) = effects.clock {
        // Requests are refused without a clock, so one is fitted here
        if let Some(rtc) = hw.rtc.as_ref() {
            match rtc.set_time(&mut hw.i2c, time) {
                Ok(()) => info!("Clock set to {:?}", time),
                Err(e) => warn!("RTC write failed: {:?}", Debug2Format(&e)),
            }
        }
    }

    if let Some(kind) = effects.scheduled {
        info!("Scheduled {} routine started", kind.name());
    }

    match effects.mode_changed {
        Some(mode) => {
            info!("Mode: {:?}", mode);
            let _ = hw.leds.show(controller.indicator());
            true
        }
        None => false,
    }
}

/// Read the wall clock, if there is one
fn read_clock(hw: &mut Hardware) -> Option<WallTime> {
    let rtc = hw.rtc.as_ref()?;
    match rtc.now(&mut hw.i2c) {
        Ok(time) => Some(time),
        Err(e) => {
            warn!("RTC read failed: {:?}", Debug2Format(&e));
            None
        }
    }
}

/// Redraw the status lines
fn refresh_display(hw: &mut Hardware, controller: &RobotController) {
    let Some(lcd) = hw.lcd.as_mut() else {
        return;
    };

    let lines = StatusLines::render(&controller.snapshot());
    if let Err(e) = lcd.show(&mut hw.i2c, &lines) {
        warn!("Display write failed: {:?}", Debug2Format(&e));
    }
}

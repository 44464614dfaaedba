//! Indicator LEDs and buzzer
//!
//! Three LEDs show the mode color; exactly one is lit at a time. The
//! buzzer is a plain on/off output paced by the help alert.

use embedded_hal::digital::{OutputPin, PinState};

use attendant_core::status::Indicator;

/// Yellow/green/red status LEDs
pub struct StatusLeds<P> {
    yellow: P,
    green: P,
    red: P,
    shown: Option<Indicator>,
}

impl<P: OutputPin> StatusLeds<P> {
    pub fn new(yellow: P, green: P, red: P) -> Self {
        Self {
            yellow,
            green,
            red,
            shown: None,
        }
    }

    /// Currently lit color
    pub fn shown(&self) -> Option<Indicator> {
        self.shown
    }

    /// Light the LED for `indicator`; unchanged colors are not rewritten
    pub fn show(&mut self, indicator: Indicator) -> Result<(), P::Error> {
        if self.shown == Some(indicator) {
            return Ok(());
        }

        let on = |wanted: Indicator| PinState::from(indicator == wanted);
        self.yellow.set_state(on(Indicator::Yellow))?;
        self.green.set_state(on(Indicator::Green))?;
        self.red.set_state(on(Indicator::Red))?;

        self.shown = Some(indicator);
        Ok(())
    }
}

/// Active buzzer
pub struct Buzzer<P> {
    pin: P,
    /// If true, buzzer sounds when the pin is LOW
    inverted: bool,
    on: bool,
}

impl<P: OutputPin> Buzzer<P> {
    /// Create a buzzer and make sure it starts silent
    pub fn new(pin: P, inverted: bool) -> Result<Self, P::Error> {
        let mut buzzer = Self {
            pin,
            inverted,
            on: true,
        };
        buzzer.set(false)?;
        Ok(buzzer)
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn set(&mut self, on: bool) -> Result<(), P::Error> {
        self.pin.set_state(PinState::from(on != self.inverted))?;
        self.on = on;
        Ok(())
    }
}

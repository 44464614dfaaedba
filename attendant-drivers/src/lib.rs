//! Hardware driver implementations
//!
//! Drivers for the parts on the robot, written against the `embedded-hal`
//! 1.0 traits so they can be exercised on the host with fake buses:
//!
//! - Servo expander (PCA9685) for the arm joints and the wiper
//! - Dual H-bridge (L298N) for the wheels
//! - Ultrasonic ranging (HC-SR04)
//! - Real-time clock (DS3231)
//! - 16x2 character display behind a PCF8574 backpack
//! - Indicator LEDs and buzzer
//! - Debounced front-panel buttons
//! - The actuator facade that turns commanded targets into bus writes
//!
//! I2C devices borrow the bus per call so that every device can share it.

#![no_std]
#![deny(unsafe_code)]

pub mod button;
pub mod display;
pub mod drive;
pub mod facade;
pub mod indicator;
pub mod rtc;
pub mod sensor;
pub mod servo;

#[cfg(test)]
pub(crate) mod fake;

pub use facade::{ActuatorFacade, FacadeError};

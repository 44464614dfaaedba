//! Sensors

pub mod hcsr04;

pub use hcsr04::{reading_from_echo, Hcsr04, ECHO_TIMEOUT_US};

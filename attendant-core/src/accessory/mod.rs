//! Non-blocking accessories driven from the polling loop
//!
//! - Help alert buzzer pattern
//! - Front wiper sweep during cleaning

pub mod alert;
pub mod wiper;

pub use alert::{AlertTone, HelpAlert};
pub use wiper::WiperSweep;

//! Board-agnostic control logic for the service robot firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Mode state machine (idle, teaching, playing, obstacle stop, help alert)
//! - Sequence store, recorder and elapsed-time player
//! - Wall-clock schedule trigger
//! - Obstacle interlock
//! - Help alert and wiper sweep pacing
//! - Status indicator and display text
//! - Configuration types and the embedded TOML parser
//! - The `RobotController` aggregate that composes all of the above

#![no_std]
#![deny(unsafe_code)]

pub mod accessory;
pub mod config;
pub mod controller;
pub mod mode;
pub mod safety;
pub mod schedule;
pub mod sequence;
pub mod status;

pub use controller::{Effects, Outcome, Rejection, Request, RobotController, Sensors};

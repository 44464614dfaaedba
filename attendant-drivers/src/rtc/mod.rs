//! Wall-clock source

pub mod ds3231;

pub use ds3231::{Ds3231, RtcError};

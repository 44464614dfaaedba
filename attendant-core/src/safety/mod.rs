//! Safety interlock
//!
//! Halts all motion while an obstacle is closer than the configured
//! threshold and restores the interrupted mode afterwards.

pub mod interlock;

pub use interlock::{Interlock, InterlockEvent, RangeReading, DEFAULT_THRESHOLD_CM};

//! Wall-clock schedule
//!
//! Starts taught routines at fixed times of day.

pub mod trigger;

pub use trigger::{ScheduleEntry, ScheduleTrigger, WallTime, MAX_SCHEDULE_ENTRIES};

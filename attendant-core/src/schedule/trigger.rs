//! Schedule trigger
//!
//! Compares the wall clock to a static table of (hour, minute, kind)
//! entries. A watermark holding the last evaluated minute makes sure a
//! minute is only evaluated once, no matter how often it is polled.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::mode::ModeKind;

/// Maximum number of schedule entries
pub const MAX_SCHEDULE_ENTRIES: usize = 16;

/// Time of day from the real-time clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WallTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl WallTime {
    /// Create a wall time, rejecting out-of-range fields
    pub fn new(hour: u8, minute: u8, second: u8) -> Option<Self> {
        if hour < 24 && minute < 60 && second < 60 {
            Some(Self {
                hour,
                minute,
                second,
            })
        } else {
            None
        }
    }
}

/// One row of the schedule table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScheduleEntry {
    /// Hour (0-23)
    pub hour: u8,
    /// Minute (0-59)
    pub minute: u8,
    /// Routine to start
    pub kind: ModeKind,
}

impl ScheduleEntry {
    pub const fn new(hour: u8, minute: u8, kind: ModeKind) -> Self {
        Self { hour, minute, kind }
    }

    /// Check the entry fields are a valid time of day
    pub fn is_valid(&self) -> bool {
        self.hour < 24 && self.minute < 60
    }

    fn matches(&self, time: &WallTime) -> bool {
        self.hour == time.hour && self.minute == time.minute
    }
}

/// Default daily timetable
pub const DEFAULT_SCHEDULE: [ScheduleEntry; 8] = [
    ScheduleEntry::new(8, 0, ModeKind::Cleaning),
    ScheduleEntry::new(8, 1, ModeKind::Garbage),
    ScheduleEntry::new(8, 2, ModeKind::Water),
    ScheduleEntry::new(8, 3, ModeKind::Medicine),
    ScheduleEntry::new(12, 0, ModeKind::Cleaning),
    ScheduleEntry::new(12, 1, ModeKind::Water),
    ScheduleEntry::new(18, 0, ModeKind::Cleaning),
    ScheduleEntry::new(18, 1, ModeKind::Medicine),
];

/// Schedule trigger state
#[derive(Debug, Clone)]
pub struct ScheduleTrigger {
    entries: Vec<ScheduleEntry, MAX_SCHEDULE_ENTRIES>,
    /// Last evaluated (hour, minute)
    watermark: Option<(u8, u8)>,
    enabled: bool,
}

impl ScheduleTrigger {
    /// Create a trigger over a table (extra entries beyond capacity are dropped)
    pub fn new(entries: &[ScheduleEntry]) -> Self {
        let mut table = Vec::new();
        for entry in entries.iter().filter(|e| e.is_valid()) {
            if table.push(*entry).is_err() {
                break;
            }
        }
        Self {
            entries: table,
            watermark: None,
            enabled: true,
        }
    }

    /// Schedule table
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    /// Check if the trigger is active
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn scheduling off (clock unavailable)
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Evaluate the table for this wall-clock time
    ///
    /// Returns the kinds whose entries match, in table order, the first
    /// time a given minute is seen. Later polls within the same minute
    /// return nothing.
    pub fn check(&mut self, time: &WallTime) -> Vec<ModeKind, MAX_SCHEDULE_ENTRIES> {
        let mut due = Vec::new();
        if !self.enabled {
            return due;
        }

        let minute = (time.hour, time.minute);
        if self.watermark == Some(minute) {
            return due;
        }
        self.watermark = Some(minute);

        for entry in self.entries.iter().filter(|e| e.matches(time)) {
            // Capacity equals the table size
            let _ = due.push(entry.kind);
        }
        due
    }
}

impl Default for ScheduleTrigger {
    fn default() -> Self {
        Self::new(&DEFAULT_SCHEDULE)
    }
}

//! Indicator and display status
//!
//! Both the indicator LED color and the two 16-character display lines
//! are pure functions of a status snapshot.

use core::fmt::{self, Write};

use heapless::String;

use crate::mode::Mode;
use crate::safety::RangeReading;
use crate::schedule::WallTime;

/// Display width in characters
pub const LINE_WIDTH: usize = 16;

/// Indicator LED color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Indicator {
    /// Ready or being taught
    Yellow,
    /// Playing a routine
    Green,
    /// Obstacle or help alert
    Red,
}

impl Indicator {
    /// Indicator color for a mode
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Idle | Mode::Teaching(_) => Indicator::Yellow,
            Mode::Playing(_) => Indicator::Green,
            Mode::ObstacleStop | Mode::HelpAlert => Indicator::Red,
        }
    }
}

/// Everything the display shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusSnapshot {
    pub mode: Mode,
    pub time: Option<WallTime>,
    pub distance: Option<RangeReading>,
    /// Frames in the sequence being taught or played
    pub frame_count: usize,
    /// Current playback frame (0-based)
    pub frame_index: usize,
}

/// One display line, truncated at the display width
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line(String<LINE_WIDTH>);

impl Line {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Write for Line {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Two display lines
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusLines {
    pub top: Line,
    pub bottom: Line,
}

impl StatusLines {
    /// Render the display for a snapshot
    pub fn render(snapshot: &StatusSnapshot) -> Self {
        let mut lines = StatusLines::default();

        // Writes into `Line` never fail
        let _ = match snapshot.time {
            Some(t) => write!(lines.top, "{:02}:{:02} ", t.hour, t.minute),
            None => write!(lines.top, "--:-- "),
        };
        let _ = lines.top.write_str(snapshot.mode.label());

        let _ = match snapshot.mode {
            Mode::Idle => match snapshot.distance.and_then(|d| d.cm()) {
                Some(cm) => write!(lines.bottom, "Dist: {:3}cm", cm),
                None => write!(lines.bottom, "Dist: ---cm"),
            },
            Mode::Teaching(kind) => {
                write!(lines.bottom, "{} Step: {}", kind_tag(kind), snapshot.frame_count)
            }
            Mode::Playing(_) => write!(
                lines.bottom,
                "Step {}/{}",
                snapshot.frame_index + 1,
                snapshot.frame_count
            ),
            Mode::ObstacleStop => write!(lines.bottom, "OBSTACLE!"),
            Mode::HelpAlert => write!(lines.bottom, "NURSE NEEDED!"),
        };

        lines
    }
}

fn kind_tag(kind: crate::mode::ModeKind) -> &'static str {
    &kind.name()[..3]
}

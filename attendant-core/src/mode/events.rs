//! Events that trigger mode transitions

use super::machine::{Mode, ModeKind};

/// Events that can trigger mode transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeEvent {
    // Teaching events
    /// Operator started teaching a routine
    StartTeach(ModeKind),
    /// Operator finished teaching
    EndTeach,

    // Playback events
    /// Manual or scheduled playback request
    StartPlay(ModeKind),
    /// Player ran past the last frame
    PlaybackFinished,

    // Operator events
    /// Cancel / stop everything
    Stop,
    /// Resident pressed the help button
    HelpRequested,
    /// Help alert finished its beep pattern
    AlertFinished,

    // Interlock events
    /// Range sensor reported an obstacle inside the threshold
    ObstacleDetected,
    /// Obstacle gone; carries the mode to restore
    ObstacleCleared(Mode),
}

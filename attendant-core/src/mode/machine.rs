//! Mode definitions and transition table
//!
//! All actuation, indicator and display behavior is a function of the
//! current mode and an event.

use super::events::ModeEvent;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The four routines the robot can be taught
///
/// The discriminant is the sequence slot index and the wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum ModeKind {
    Water = 0,
    Medicine = 1,
    Garbage = 2,
    Cleaning = 3,
}

impl ModeKind {
    /// All kinds in slot order
    pub const ALL: [ModeKind; 4] = [
        ModeKind::Water,
        ModeKind::Medicine,
        ModeKind::Garbage,
        ModeKind::Cleaning,
    ];

    /// Slot index of this kind
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Kind for a slot index
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Upper-case name used on the display and in config files
    pub const fn name(self) -> &'static str {
        match self {
            ModeKind::Water => "WATER",
            ModeKind::Medicine => "MEDICINE",
            ModeKind::Garbage => "GARBAGE",
            ModeKind::Cleaning => "CLEANING",
        }
    }

    /// Parse a kind name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

/// Robot modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Waiting for a command or a scheduled routine
    Idle,
    /// Operator is capturing frames for a routine
    Teaching(ModeKind),
    /// A routine is being replayed
    Playing(ModeKind),
    /// Obstacle inside the threshold; all motion halted
    ObstacleStop,
    /// Resident asked for help; buzzer pattern running
    HelpAlert,
}

impl Mode {
    /// Routine kind associated with this mode, if any
    pub fn kind(&self) -> Option<ModeKind> {
        match self {
            Mode::Teaching(kind) | Mode::Playing(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Check if manual servo/drive commands are accepted
    pub fn manual_motion_allowed(&self) -> bool {
        matches!(self, Mode::Idle | Mode::Teaching(_))
    }

    /// Check if this mode moves the robot on its own
    pub fn is_playing(&self) -> bool {
        matches!(self, Mode::Playing(_))
    }

    /// Upper-case label for the status line
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Idle => "IDLE",
            Mode::Teaching(_) => "TEACH",
            Mode::Playing(kind) => kind.name(),
            Mode::ObstacleStop => "STOP",
            Mode::HelpAlert => "HELP",
        }
    }

    /// Process an event and return the next mode
    ///
    /// Returns `None` when the event is not valid in the current mode;
    /// the caller keeps the current mode and reports a rejection.
    pub fn transition(self, event: ModeEvent) -> Option<Self> {
        use Mode::*;
        use ModeEvent::*;

        let next = match (self, event) {
            // Teaching
            (Idle, StartTeach(kind)) => Teaching(kind),
            (Teaching(_), EndTeach) => Idle,

            // Playback
            (Idle, StartPlay(kind)) => Playing(kind),
            (Playing(_), PlaybackFinished) => Idle,

            // Cancel is always accepted; the interlock keeps its hold
            (ObstacleStop, Stop) => ObstacleStop,
            (_, Stop) => Idle,

            // Interlock
            (ObstacleStop, ObstacleDetected) => return None,
            (_, ObstacleDetected) => ObstacleStop,
            (ObstacleStop, ObstacleCleared(saved)) => saved,

            // Help alert
            (ObstacleStop | HelpAlert, HelpRequested) => return None,
            (_, HelpRequested) => HelpAlert,
            (HelpAlert, AlertFinished) => Idle,

            _ => return None,
        };

        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teach_flow() {
        let teaching = Mode::Idle.transition(ModeEvent::StartTeach(ModeKind::Water));
        assert_eq!(teaching, Some(Mode::Teaching(ModeKind::Water)));

        let idle = teaching.unwrap().transition(ModeEvent::EndTeach);
        assert_eq!(idle, Some(Mode::Idle));
    }

    #[test]
    fn test_teach_rejected_unless_idle() {
        let busy = [
            Mode::Teaching(ModeKind::Water),
            Mode::Playing(ModeKind::Garbage),
            Mode::ObstacleStop,
            Mode::HelpAlert,
        ];

        for mode in busy {
            assert_eq!(mode.transition(ModeEvent::StartTeach(ModeKind::Medicine)), None);
            assert_eq!(mode.transition(ModeEvent::StartPlay(ModeKind::Medicine)), None);
        }
    }

    #[test]
    fn test_end_teach_rejected_outside_teaching() {
        assert_eq!(Mode::Idle.transition(ModeEvent::EndTeach), None);
        assert_eq!(
            Mode::Playing(ModeKind::Water).transition(ModeEvent::EndTeach),
            None
        );
    }

    #[test]
    fn test_stop_from_every_mode() {
        let modes = [
            Mode::Idle,
            Mode::Teaching(ModeKind::Cleaning),
            Mode::Playing(ModeKind::Medicine),
            Mode::HelpAlert,
        ];

        for mode in modes {
            assert_eq!(mode.transition(ModeEvent::Stop), Some(Mode::Idle));
        }

        // Accepted, but the interlock still holds
        assert_eq!(
            Mode::ObstacleStop.transition(ModeEvent::Stop),
            Some(Mode::ObstacleStop)
        );
    }

    #[test]
    fn test_obstacle_restores_saved_mode() {
        let playing = Mode::Playing(ModeKind::Garbage);
        let stopped = playing.transition(ModeEvent::ObstacleDetected).unwrap();
        assert_eq!(stopped, Mode::ObstacleStop);

        let restored = stopped.transition(ModeEvent::ObstacleCleared(playing));
        assert_eq!(restored, Some(playing));
    }

    #[test]
    fn test_obstacle_does_not_nest() {
        assert_eq!(Mode::ObstacleStop.transition(ModeEvent::ObstacleDetected), None);
        assert_eq!(
            Mode::Idle.transition(ModeEvent::ObstacleCleared(Mode::Idle)),
            None
        );
    }

    #[test]
    fn test_help_alert() {
        let alert = Mode::Playing(ModeKind::Water).transition(ModeEvent::HelpRequested);
        assert_eq!(alert, Some(Mode::HelpAlert));
        assert_eq!(Mode::HelpAlert.transition(ModeEvent::AlertFinished), Some(Mode::Idle));

        assert_eq!(Mode::ObstacleStop.transition(ModeEvent::HelpRequested), None);
        assert_eq!(Mode::HelpAlert.transition(ModeEvent::HelpRequested), None);
    }

    #[test]
    fn test_kind_names() {
        for kind in ModeKind::ALL {
            assert_eq!(ModeKind::from_name(kind.name()), Some(kind));
            assert_eq!(ModeKind::from_index(kind.index() as u8), Some(kind));
        }
        assert_eq!(ModeKind::from_name("cleaning"), Some(ModeKind::Cleaning));
        assert_eq!(ModeKind::from_name("laundry"), None);
        assert_eq!(ModeKind::from_index(4), None);
    }

    #[test]
    fn test_manual_motion_allowed() {
        assert!(Mode::Idle.manual_motion_allowed());
        assert!(Mode::Teaching(ModeKind::Water).manual_motion_allowed());
        assert!(!Mode::Playing(ModeKind::Water).manual_motion_allowed());
        assert!(!Mode::ObstacleStop.manual_motion_allowed());
        assert!(!Mode::HelpAlert.manual_motion_allowed());
    }
}

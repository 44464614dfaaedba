//! Obstacle interlock implementation

use crate::mode::Mode;

/// Default obstacle threshold
pub const DEFAULT_THRESHOLD_CM: u16 = 20;

/// Distance reading from the ranging sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RangeReading {
    /// Distance in centimeters
    Cm(u16),
    /// Echo timed out
    NoEcho,
}

impl RangeReading {
    /// Convert an echo pulse width to a reading (speed of sound, round trip)
    pub fn from_echo_us(echo_us: Option<u32>) -> Self {
        match echo_us {
            Some(us) if us > 0 => RangeReading::Cm((us / 58).min(u16::MAX as u32) as u16),
            _ => RangeReading::NoEcho,
        }
    }

    /// Distance if a valid echo was received
    pub fn cm(&self) -> Option<u16> {
        match self {
            RangeReading::Cm(cm) if *cm > 0 => Some(*cm),
            _ => None,
        }
    }
}

/// Interlock transition reported by [`Interlock::poll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterlockEvent {
    /// Obstacle appeared; motion must stop now
    Engaged,
    /// Obstacle gone; restore this mode
    Cleared(Mode),
}

/// Interlock state
#[derive(Debug, Clone)]
pub struct Interlock {
    threshold_cm: u16,
    last_reading: Option<RangeReading>,
    /// Mode to restore on clearance; `Some` while engaged
    saved: Option<Mode>,
}

impl Interlock {
    /// Create a disengaged interlock
    pub const fn new(threshold_cm: u16) -> Self {
        Self {
            threshold_cm,
            last_reading: None,
            saved: None,
        }
    }

    /// Check if the interlock is holding the robot
    pub fn is_active(&self) -> bool {
        self.saved.is_some()
    }

    /// Most recent reading
    pub fn last_reading(&self) -> Option<RangeReading> {
        self.last_reading
    }

    /// Mode that will be restored on clearance
    pub fn saved_mode(&self) -> Option<Mode> {
        self.saved
    }

    /// Check if a reading is inside the threshold
    ///
    /// No-echo and zero readings never count as obstacles.
    pub fn is_obstacle(&self, reading: RangeReading) -> bool {
        matches!(reading.cm(), Some(cm) if cm < self.threshold_cm)
    }

    /// Feed one reading
    ///
    /// `current` is the mode before this poll; it is saved on engage.
    pub fn poll(&mut self, reading: RangeReading, current: Mode) -> Option<InterlockEvent> {
        self.last_reading = Some(reading);
        let obstacle = self.is_obstacle(reading);

        match (self.saved, obstacle) {
            (None, true) => {
                self.saved = Some(current);
                Some(InterlockEvent::Engaged)
            }
            (Some(saved), false) => {
                self.saved = None;
                Some(InterlockEvent::Cleared(saved))
            }
            _ => None,
        }
    }

    /// Forget the saved mode; clearance returns to Idle
    pub fn cancel_saved(&mut self) {
        if self.saved.is_some() {
            self.saved = Some(Mode::Idle);
        }
    }
}

impl Default for Interlock {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_CM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::ModeKind;

    #[test]
    fn test_engage_and_clear() {
        let mut interlock = Interlock::default();
        let playing = Mode::Playing(ModeKind::Garbage);

        assert_eq!(interlock.poll(RangeReading::Cm(50), playing), None);
        assert_eq!(
            interlock.poll(RangeReading::Cm(12), playing),
            Some(InterlockEvent::Engaged)
        );
        assert!(interlock.is_active());
        assert_eq!(interlock.saved_mode(), Some(playing));

        // Still close: no new event
        assert_eq!(interlock.poll(RangeReading::Cm(5), Mode::ObstacleStop), None);

        assert_eq!(
            interlock.poll(RangeReading::Cm(20), Mode::ObstacleStop),
            Some(InterlockEvent::Cleared(playing))
        );
        assert!(!interlock.is_active());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let interlock = Interlock::new(20);
        assert!(interlock.is_obstacle(RangeReading::Cm(19)));
        assert!(!interlock.is_obstacle(RangeReading::Cm(20)));
    }

    #[test]
    fn test_no_echo_and_zero_are_clear() {
        let mut interlock = Interlock::default();
        assert_eq!(interlock.poll(RangeReading::NoEcho, Mode::Idle), None);
        assert_eq!(interlock.poll(RangeReading::Cm(0), Mode::Idle), None);
        assert!(!interlock.is_active());

        interlock.poll(RangeReading::Cm(3), Mode::Idle);
        assert_eq!(
            interlock.poll(RangeReading::NoEcho, Mode::ObstacleStop),
            Some(InterlockEvent::Cleared(Mode::Idle))
        );
    }

    #[test]
    fn test_cancel_saved() {
        let mut interlock = Interlock::default();
        interlock.poll(RangeReading::Cm(3), Mode::Teaching(ModeKind::Water));
        interlock.cancel_saved();
        assert_eq!(
            interlock.poll(RangeReading::Cm(100), Mode::ObstacleStop),
            Some(InterlockEvent::Cleared(Mode::Idle))
        );

        // No effect while disengaged
        interlock.cancel_saved();
        assert_eq!(interlock.saved_mode(), None);
    }

    #[test]
    fn test_echo_conversion() {
        assert_eq!(RangeReading::from_echo_us(Some(1160)), RangeReading::Cm(20));
        assert_eq!(RangeReading::from_echo_us(Some(0)), RangeReading::NoEcho);
        assert_eq!(RangeReading::from_echo_us(None), RangeReading::NoEcho);
    }
}

//! Elapsed-time sequence player
//!
//! The player never blocks. Each call to [`Player::step`] looks at the
//! current time, advances at most one frame, and applies a frame's targets
//! exactly once, the first time its index is observed.

use super::frame::ActuatorTargets;
use super::store::Sequence;
use crate::mode::ModeKind;

/// Position inside a playing sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaybackCursor {
    /// Routine being played
    pub kind: ModeKind,
    /// Current frame index
    pub index: usize,
    /// Time the current frame was entered (ms)
    pub entered_at: u64,
    /// Whether the current frame's targets have been applied
    pub applied: bool,
}

/// Result of one player step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepResult {
    /// Nothing is playing
    Idle,
    /// Current frame still holding
    Holding,
    /// A new frame was entered; command these targets
    Applied {
        index: usize,
        targets: ActuatorTargets,
    },
    /// Ran past the last frame; cursor cleared
    Finished,
}

#[derive(Debug, Clone, Copy)]
struct Suspended {
    cursor: PlaybackCursor,
    elapsed_ms: u64,
}

/// Sequence player
#[derive(Debug, Clone, Default)]
pub struct Player {
    cursor: Option<PlaybackCursor>,
    suspended: Option<Suspended>,
}

impl Player {
    /// Create an idle player
    pub const fn new() -> Self {
        Self {
            cursor: None,
            suspended: None,
        }
    }

    /// Active cursor, if playing
    pub fn cursor(&self) -> Option<&PlaybackCursor> {
        self.cursor.as_ref()
    }

    /// Begin playing from frame 0
    pub fn start(&mut self, kind: ModeKind, now_ms: u64) {
        self.suspended = None;
        self.cursor = Some(PlaybackCursor {
            kind,
            index: 0,
            entered_at: now_ms,
            applied: false,
        });
    }

    /// Advance playback
    pub fn step(&mut self, now_ms: u64, sequence: &Sequence) -> StepResult {
        let Some(cursor) = self.cursor.as_mut() else {
            return StepResult::Idle;
        };

        if cursor.applied {
            let duration = sequence
                .get(cursor.index)
                .map(|f| f.duration_ms as u64)
                .unwrap_or(0);

            if now_ms.saturating_sub(cursor.entered_at) < duration {
                return StepResult::Holding;
            }

            cursor.index += 1;
            cursor.applied = false;
        }

        match sequence.get(cursor.index) {
            Some(frame) => {
                // Hold time counts from the poll that commands the frame
                cursor.entered_at = now_ms;
                cursor.applied = true;
                StepResult::Applied {
                    index: cursor.index,
                    targets: frame.targets,
                }
            }
            None => {
                self.cursor = None;
                StepResult::Finished
            }
        }
    }

    /// Freeze playback, remembering how long the current frame has run
    pub fn suspend(&mut self, now_ms: u64) {
        if let Some(cursor) = self.cursor.take() {
            self.suspended = Some(Suspended {
                cursor,
                elapsed_ms: now_ms.saturating_sub(cursor.entered_at),
            });
        }
    }

    /// Continue a suspended playback with the remaining frame time
    ///
    /// Returns the targets of the interrupted frame so they can be
    /// commanded again; the frame does not count as newly applied.
    pub fn resume(&mut self, now_ms: u64, sequence: &Sequence) -> Option<ActuatorTargets> {
        let Suspended {
            mut cursor,
            elapsed_ms,
        } = self.suspended.take()?;

        cursor.entered_at = now_ms.saturating_sub(elapsed_ms);
        self.cursor = Some(cursor);

        if cursor.applied {
            sequence.get(cursor.index).map(|f| f.targets)
        } else {
            None
        }
    }

    /// Drop any active or suspended playback
    pub fn clear(&mut self) {
        self.cursor = None;
        self.suspended = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Frame;

    fn medicine() -> Sequence {
        let mut seq = Sequence::new();
        seq.push(Frame::new([10; 6], 0, 0, 500)).unwrap();
        seq.push(Frame::new([20; 6], 100, 100, 800)).unwrap();
        seq.push(Frame::new([30; 6], 0, 0, 1000)).unwrap();
        seq
    }

    #[test]
    fn test_idle_step() {
        let mut player = Player::new();
        assert_eq!(player.step(0, &medicine()), StepResult::Idle);
    }

    #[test]
    fn test_each_frame_applied_once_in_order() {
        let seq = medicine();
        let mut player = Player::new();
        player.start(ModeKind::Medicine, 0);

        let mut applied = heapless::Vec::<(usize, u64), 8>::new();
        let mut finished_at = None;

        let mut now = 0;
        while now <= 3000 {
            match player.step(now, &seq) {
                StepResult::Applied { index, .. } => applied.push((index, now)).unwrap(),
                StepResult::Finished => {
                    finished_at = Some(now);
                    break;
                }
                _ => {}
            }
            now += 10;
        }

        assert_eq!(applied.as_slice(), &[(0usize, 0u64), (1, 500), (2, 1300)][..]);
        assert_eq!(finished_at, Some(2300));
        assert!(player.cursor().is_none());
    }

    #[test]
    fn test_zero_duration_advances_next_poll() {
        let mut seq = Sequence::new();
        seq.push(Frame::new([0; 6], 0, 0, 0)).unwrap();
        seq.push(Frame::new([90; 6], 0, 0, 100)).unwrap();

        let mut player = Player::new();
        player.start(ModeKind::Water, 0);
        assert!(matches!(player.step(0, &seq), StepResult::Applied { index: 0, .. }));
        assert!(matches!(player.step(0, &seq), StepResult::Applied { index: 1, .. }));
        assert_eq!(player.step(50, &seq), StepResult::Holding);
    }

    #[test]
    fn test_suspend_resume_keeps_remaining_time() {
        let seq = medicine();
        let mut player = Player::new();
        player.start(ModeKind::Medicine, 0);
        player.step(0, &seq);
        player.step(500, &seq); // frame 1 entered at 500

        // Interrupted 300ms into frame 1
        player.suspend(800);
        assert!(player.cursor().is_none());
        assert_eq!(player.step(900, &seq), StepResult::Idle);

        // Resume much later: 500ms of frame 1 remain
        let targets = player.resume(5000, &seq).unwrap();
        assert_eq!(targets.angles, [20; 6]);
        assert_eq!(player.step(5400, &seq), StepResult::Holding);
        assert!(matches!(
            player.step(5500, &seq),
            StepResult::Applied { index: 2, .. }
        ));
    }

    #[test]
    fn test_hold_counts_from_first_apply() {
        let seq = medicine();
        let mut player = Player::new();
        player.start(ModeKind::Medicine, 100);

        // First observed one poll after start
        assert!(matches!(
            player.step(120, &seq),
            StepResult::Applied { index: 0, .. }
        ));
        assert_eq!(player.step(610, &seq), StepResult::Holding);
        assert!(matches!(
            player.step(620, &seq),
            StepResult::Applied { index: 1, .. }
        ));
    }

    #[test]
    fn test_suspend_before_first_apply() {
        let seq = medicine();
        let mut player = Player::new();
        player.start(ModeKind::Medicine, 0);
        player.suspend(10);

        // Nothing was commanded yet, so nothing to re-command
        assert_eq!(player.resume(400, &seq), None);
        assert!(matches!(
            player.step(400, &seq),
            StepResult::Applied { index: 0, .. }
        ));
        assert_eq!(player.step(890, &seq), StepResult::Holding);
        assert!(matches!(
            player.step(900, &seq),
            StepResult::Applied { index: 1, .. }
        ));
    }

    #[test]
    fn test_clear_drops_suspended() {
        let seq = medicine();
        let mut player = Player::new();
        player.start(ModeKind::Medicine, 0);
        player.step(0, &seq);
        player.suspend(100);
        player.clear();
        assert_eq!(player.resume(200, &seq), None);
        assert_eq!(player.step(300, &seq), StepResult::Idle);
    }

    #[test]
    fn test_empty_sequence_finishes() {
        let mut player = Player::new();
        player.start(ModeKind::Water, 0);
        assert_eq!(player.step(0, &Sequence::new()), StepResult::Finished);
    }
}

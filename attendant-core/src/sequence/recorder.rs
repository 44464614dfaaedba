//! Teaching session
//!
//! A session clears the target sequence and appends one frame per capture.
//! The previous sequence is kept aside until the session ends, so an
//! interrupted session leaves the stored routine untouched.

use super::frame::{ActuatorTargets, Frame};
use super::store::{Sequence, SequenceStore};
use crate::controller::Rejection;
use crate::mode::ModeKind;

#[derive(Debug, Clone)]
struct Session {
    kind: ModeKind,
    previous: Sequence,
}

/// Sequence recorder
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    session: Option<Session>,
}

impl Recorder {
    /// Create an idle recorder
    pub const fn new() -> Self {
        Self { session: None }
    }

    /// Kind being taught, if a session is open
    pub fn active(&self) -> Option<ModeKind> {
        self.session.as_ref().map(|s| s.kind)
    }

    /// Open a session: the target sequence is emptied
    pub fn start(&mut self, store: &mut SequenceStore, kind: ModeKind) {
        let previous = store.replace(kind, Sequence::new());
        self.session = Some(Session { kind, previous });
    }

    /// Append a snapshot of the commanded state
    ///
    /// Returns the new frame count.
    pub fn capture(
        &mut self,
        store: &mut SequenceStore,
        targets: ActuatorTargets,
        duration_ms: u16,
    ) -> Result<usize, Rejection> {
        let kind = self.active().ok_or(Rejection::WrongMode)?;
        if duration_ms == 0 {
            return Err(Rejection::InvalidDuration);
        }

        let sequence = store.get_mut(kind);
        sequence.push(Frame::capture(targets, duration_ms))?;
        Ok(sequence.len())
    }

    /// Close the session, keeping the captured frames
    ///
    /// Returns the kind that must be persisted.
    pub fn finish(&mut self) -> Option<ModeKind> {
        self.session.take().map(|s| s.kind)
    }

    /// Close the session and put the previous sequence back
    pub fn abandon(&mut self, store: &mut SequenceStore) -> Option<ModeKind> {
        let session = self.session.take()?;
        store.replace(session.kind, session.previous);
        Some(session.kind)
    }
}

//! Bounded sequences and the per-kind sequence store
//!
//! The store owns one sequence per routine kind. Persistence goes through
//! a byte-addressable [`RecordMedium`]; slot `i` occupies the fixed-size
//! record at offset `i * RECORD_SIZE`.

use heapless::Vec;

use super::frame::Frame;
use super::record::{self, RecordError, RECORD_SIZE};
use crate::controller::Rejection;
use crate::mode::ModeKind;

/// Maximum number of frames in one sequence
pub const SEQUENCE_CAPACITY: usize = 20;

/// Ordered, bounded list of frames for one routine
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sequence {
    frames: Vec<Frame, SEQUENCE_CAPACITY>,
}

impl Sequence {
    /// Create an empty sequence
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if there are no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Check if the sequence is at capacity
    pub fn is_full(&self) -> bool {
        self.frames.is_full()
    }

    /// Append a frame
    ///
    /// At capacity the sequence is left unchanged.
    pub fn push(&mut self, frame: Frame) -> Result<(), Rejection> {
        self.frames
            .push(frame)
            .map_err(|_| Rejection::CapacityExceeded)
    }

    /// Get a frame by index
    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// All frames in order
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Total play time in milliseconds
    pub fn total_duration_ms(&self) -> u32 {
        self.frames.iter().map(|f| f.duration_ms as u32).sum()
    }

    /// Remove all frames
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

/// Built-in cleaning routine
///
/// Neutral pose, forward, sweep left, sweep right, back, stop.
pub fn demo_cleaning() -> Sequence {
    const ARM: [u8; 6] = [90, 90, 90, 90, 90, 60];
    let frames = [
        Frame::new(ARM, 0, 0, 800),
        Frame::new(ARM, 140, 140, 1800),
        Frame::new(ARM, -120, 120, 800),
        Frame::new(ARM, 120, -120, 800),
        Frame::new(ARM, -140, -140, 1800),
        Frame::new(ARM, 0, 0, 1000),
    ];

    let mut seq = Sequence::new();
    for frame in frames {
        // Six frames always fit
        let _ = seq.push(frame);
    }
    seq
}

/// Outcome of loading one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadStatus {
    /// Valid record with this many frames
    Loaded(u8),
    /// Storage never written for this slot
    Empty,
    /// Record failed validation and was replaced by an empty sequence
    Corrupt(RecordError),
}

/// Byte-addressable persistent medium
pub trait RecordMedium {
    /// Medium error type
    type Error;

    /// Read `buffer.len()` bytes starting at `offset`
    fn read(&mut self, offset: usize, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Write `data` starting at `offset`
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), Self::Error>;
}

/// A plain byte slice as a medium (RAM mirror, tests)
impl RecordMedium for [u8] {
    type Error = RecordError;

    fn read(&mut self, offset: usize, buffer: &mut [u8]) -> Result<(), Self::Error> {
        let src = self
            .get(offset..offset + buffer.len())
            .ok_or(RecordError::BadLength)?;
        buffer.copy_from_slice(src);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), Self::Error> {
        let dst = self
            .get_mut(offset..offset + data.len())
            .ok_or(RecordError::BadLength)?;
        dst.copy_from_slice(data);
        Ok(())
    }
}

/// One sequence per routine kind
#[derive(Debug, Clone, Default)]
pub struct SequenceStore {
    sequences: [Sequence; 4],
}

impl SequenceStore {
    /// Create a store with every sequence empty
    pub const fn new() -> Self {
        Self {
            sequences: [
                Sequence::new(),
                Sequence::new(),
                Sequence::new(),
                Sequence::new(),
            ],
        }
    }

    /// Sequence for a kind
    pub fn get(&self, kind: ModeKind) -> &Sequence {
        &self.sequences[kind.index()]
    }

    /// Mutable sequence for a kind
    pub fn get_mut(&mut self, kind: ModeKind) -> &mut Sequence {
        &mut self.sequences[kind.index()]
    }

    /// Replace a sequence wholesale, returning the old one
    pub fn replace(&mut self, kind: ModeKind, sequence: Sequence) -> Sequence {
        core::mem::replace(&mut self.sequences[kind.index()], sequence)
    }

    /// Install the built-in cleaning routine if the slot is empty
    ///
    /// Returns true if the routine was installed.
    pub fn seed_demo_cleaning(&mut self) -> bool {
        let slot = self.get_mut(ModeKind::Cleaning);
        if slot.is_empty() {
            *slot = demo_cleaning();
            true
        } else {
            false
        }
    }

    /// Encode one slot as a persisted record
    pub fn record(&self, kind: ModeKind) -> [u8; RECORD_SIZE] {
        record::encode(kind, self.get(kind))
    }

    /// Restore one slot from a persisted record
    ///
    /// Blank or invalid records leave the slot empty.
    pub fn restore(&mut self, kind: ModeKind, bytes: &[u8]) -> LoadStatus {
        if record::is_blank(bytes) {
            self.get_mut(kind).clear();
            return LoadStatus::Empty;
        }

        match record::decode(kind, bytes) {
            Ok(sequence) => {
                let count = sequence.len() as u8;
                self.replace(kind, sequence);
                LoadStatus::Loaded(count)
            }
            Err(e) => {
                self.get_mut(kind).clear();
                LoadStatus::Corrupt(e)
            }
        }
    }

    /// Load every slot from a medium
    pub fn load<M: RecordMedium + ?Sized>(
        &mut self,
        medium: &mut M,
    ) -> Result<[LoadStatus; 4], M::Error> {
        let mut status = [LoadStatus::Empty; 4];
        let mut buffer = [0u8; RECORD_SIZE];

        for kind in ModeKind::ALL {
            medium.read(kind.index() * RECORD_SIZE, &mut buffer)?;
            status[kind.index()] = self.restore(kind, &buffer);
        }

        Ok(status)
    }

    /// Save one slot to a medium
    pub fn save_slot<M: RecordMedium + ?Sized>(
        &self,
        kind: ModeKind,
        medium: &mut M,
    ) -> Result<(), M::Error> {
        medium.write(kind.index() * RECORD_SIZE, &self.record(kind))
    }

    /// Save every slot to a medium
    pub fn save<M: RecordMedium + ?Sized>(&self, medium: &mut M) -> Result<(), M::Error> {
        for kind in ModeKind::ALL {
            self.save_slot(kind, medium)?;
        }
        Ok(())
    }
}

//! Taught motion sequences
//!
//! Frames, bounded sequences, their persisted record format, and the
//! recorder/player pair that fills and replays them.

pub mod frame;
pub mod player;
pub mod record;
pub mod recorder;
pub mod store;

pub use frame::{
    ActuatorTargets, DriveCommand, DrivePreset, Frame, AXIS_COUNT, MAX_ANGLE, MAX_SPEED,
    WIPER_CHANNEL,
};
pub use player::{PlaybackCursor, Player, StepResult};
pub use record::{RecordError, RECORD_SIZE};
pub use recorder::Recorder;
pub use store::{LoadStatus, RecordMedium, Sequence, SequenceStore, SEQUENCE_CAPACITY};

//! Mode state machine
//!
//! Defines the authoritative runtime behavior of the robot.
//! Exactly one mode is active at a time and every transition is explicit.

pub mod events;
pub mod machine;

pub use events::ModeEvent;
pub use machine::{Mode, ModeKind};

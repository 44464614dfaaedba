//! Wheel drive outputs

pub mod hbridge;

pub use hbridge::{DifferentialDrive, DriveError, HBridgeChannel};

use attendant_core::sequence::DriveCommand;

/// Anything that can set both wheel speeds at once
pub trait WheelDrive {
    type Error;

    /// Apply signed speeds (-255..=255) to both sides
    fn set_speeds(&mut self, command: DriveCommand) -> Result<(), Self::Error>;

    /// Stop both wheels
    fn stop(&mut self) -> Result<(), Self::Error> {
        self.set_speeds(DriveCommand::STOP)
    }
}

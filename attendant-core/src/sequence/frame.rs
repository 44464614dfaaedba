//! Frame and actuator target types

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of arm joints captured in a frame
pub const AXIS_COUNT: usize = 6;

/// Largest joint angle in degrees
pub const MAX_ANGLE: u8 = 180;

/// Largest drive speed magnitude
pub const MAX_SPEED: i16 = 255;

/// Servo channel of the front wiper (not part of a frame)
pub const WIPER_CHANNEL: u8 = 6;

/// Clamp a joint angle to the servo range
pub fn clamp_angle(angle: u8) -> u8 {
    angle.min(MAX_ANGLE)
}

/// Differential drive command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriveCommand {
    /// Left wheel speed, negative is reverse
    pub left: i16,
    /// Right wheel speed, negative is reverse
    pub right: i16,
}

impl DriveCommand {
    /// Both wheels stopped
    pub const STOP: DriveCommand = DriveCommand { left: 0, right: 0 };

    /// Create a command with both speeds clamped to [-255, 255]
    pub fn new(left: i16, right: i16) -> Self {
        Self {
            left: left.clamp(-MAX_SPEED, MAX_SPEED),
            right: right.clamp(-MAX_SPEED, MAX_SPEED),
        }
    }

    /// Check if both wheels are stopped
    pub fn is_stopped(&self) -> bool {
        self.left == 0 && self.right == 0
    }
}

/// Manual drive presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DrivePreset {
    Forward,
    Backward,
    Left,
    Right,
}

impl DrivePreset {
    /// Wheel speeds for this preset
    pub fn command(self) -> DriveCommand {
        match self {
            DrivePreset::Forward => DriveCommand::new(200, 200),
            DrivePreset::Backward => DriveCommand::new(-200, -200),
            DrivePreset::Left => DriveCommand::new(-150, 150),
            DrivePreset::Right => DriveCommand::new(150, -150),
        }
    }

    /// Preset from its wire code
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(DrivePreset::Forward),
            1 => Some(DrivePreset::Backward),
            2 => Some(DrivePreset::Left),
            3 => Some(DrivePreset::Right),
            _ => None,
        }
    }
}

/// Commanded state of every actuator in a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActuatorTargets {
    /// Joint angles in degrees, one per arm channel
    pub angles: [u8; AXIS_COUNT],
    /// Wheel speeds
    pub drive: DriveCommand,
}

impl ActuatorTargets {
    /// Arm in the given pose with the drive stopped
    pub fn at_pose(angles: [u8; AXIS_COUNT]) -> Self {
        let mut pose = angles;
        for angle in &mut pose {
            *angle = clamp_angle(*angle);
        }
        Self {
            angles: pose,
            drive: DriveCommand::STOP,
        }
    }

    /// Same arm pose, drive stopped
    pub fn halted(&self) -> Self {
        Self {
            angles: self.angles,
            drive: DriveCommand::STOP,
        }
    }
}

/// One captured step of a taught routine
///
/// Immutable once captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// Actuator targets applied when the frame is entered
    pub targets: ActuatorTargets,
    /// How long the frame is held before advancing
    pub duration_ms: u16,
}

impl Frame {
    /// Create a frame from explicit values (angles clamped, speeds clamped)
    pub fn new(angles: [u8; AXIS_COUNT], left: i16, right: i16, duration_ms: u16) -> Self {
        let mut targets = ActuatorTargets::at_pose(angles);
        targets.drive = DriveCommand::new(left, right);
        Self {
            targets,
            duration_ms,
        }
    }

    /// Snapshot of the commanded state
    pub fn capture(targets: ActuatorTargets, duration_ms: u16) -> Self {
        Self {
            targets,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_clamped() {
        let cmd = DriveCommand::new(400, -1000);
        assert_eq!(cmd, DriveCommand { left: 255, right: -255 });
        assert!(!cmd.is_stopped());
        assert!(DriveCommand::STOP.is_stopped());
    }

    #[test]
    fn test_angles_clamped() {
        let frame = Frame::new([0, 90, 180, 200, 255, 45], 0, 0, 100);
        assert_eq!(frame.targets.angles, [0, 90, 180, 180, 180, 45]);
    }

    #[test]
    fn test_presets() {
        assert_eq!(DrivePreset::Forward.command(), DriveCommand::new(200, 200));
        assert_eq!(DrivePreset::Backward.command(), DriveCommand::new(-200, -200));
        assert_eq!(DrivePreset::Left.command(), DriveCommand::new(-150, 150));
        assert_eq!(DrivePreset::Right.command(), DriveCommand::new(150, -150));
        assert_eq!(DrivePreset::from_u8(4), None);
    }

    #[test]
    fn test_halted_keeps_pose() {
        let mut targets = ActuatorTargets::at_pose([10, 20, 30, 40, 50, 60]);
        targets.drive = DriveCommand::new(100, 100);
        let halted = targets.halted();
        assert_eq!(halted.angles, targets.angles);
        assert!(halted.drive.is_stopped());
    }
}

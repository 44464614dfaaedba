//! Configuration type definitions

use heapless::Vec;

use crate::schedule::trigger::{ScheduleEntry, DEFAULT_SCHEDULE, MAX_SCHEDULE_ENTRIES};
use crate::sequence::frame::{AXIS_COUNT, MAX_ANGLE};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Current configuration format version
pub const CONFIG_VERSION: u8 = 1;

/// Maximum serialized configuration size
pub const MAX_CONFIG_SIZE: usize = 256;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// Too many items (exceeded heapless capacity)
    TooManyItems,
    /// Key not valid in its section
    UnknownKey,
}

/// Help alert beep pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlertConfig {
    /// Number of beeps before the alert ends on its own
    pub beeps: u8,
    /// Tone length (ms)
    pub on_ms: u16,
    /// Silence between tones (ms)
    pub off_ms: u16,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            beeps: 10,
            on_ms: 150,
            off_ms: 300,
        }
    }
}

/// Front wiper sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WiperConfig {
    /// Degrees per step
    pub step_deg: u8,
    /// Time between steps (ms)
    pub step_interval_ms: u16,
    /// Lower sweep limit
    pub min_angle: u8,
    /// Upper sweep limit
    pub max_angle: u8,
    /// Rest angle outside cleaning
    pub park_angle: u8,
}

impl Default for WiperConfig {
    fn default() -> Self {
        // 3 degree steps over a ~2s half period
        Self {
            step_deg: 3,
            step_interval_ms: 33,
            min_angle: 0,
            max_angle: 180,
            park_angle: 0,
        }
    }
}

/// Complete robot configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RobotConfig {
    /// Format version
    pub version: u8,
    /// Obstacle threshold (cm); closer readings stop the robot
    pub obstacle_threshold_cm: u16,
    /// Frame duration used when a capture gives none (ms)
    pub default_frame_ms: u16,
    /// Install the built-in cleaning routine when its slot is empty
    pub seed_demo_cleaning: bool,
    /// Arm pose after a cancel
    pub home_pose: [u8; AXIS_COUNT],
    /// Help alert pattern
    pub alert: AlertConfig,
    /// Wiper sweep
    pub wiper: WiperConfig,
    /// Daily timetable
    pub schedule: Vec<ScheduleEntry, MAX_SCHEDULE_ENTRIES>,
}

impl Default for RobotConfig {
    fn default() -> Self {
        let mut schedule = Vec::new();
        for entry in DEFAULT_SCHEDULE {
            // Default table is smaller than the capacity
            let _ = schedule.push(entry);
        }

        Self {
            version: CONFIG_VERSION,
            obstacle_threshold_cm: 20,
            default_frame_ms: 1000,
            seed_demo_cleaning: true,
            home_pose: [90; AXIS_COUNT],
            alert: AlertConfig::default(),
            wiper: WiperConfig::default(),
            schedule,
        }
    }
}

impl RobotConfig {
    /// Check value ranges that the parser cannot check per key
    pub fn validate(&self) -> Result<(), ConfigError> {
        let wiper = &self.wiper;
        let wiper_ok = wiper.step_deg > 0
            && wiper.min_angle <= wiper.park_angle
            && wiper.park_angle <= wiper.max_angle
            && wiper.max_angle <= MAX_ANGLE;

        let ok = self.obstacle_threshold_cm > 0
            && self.default_frame_ms > 0
            && self.alert.on_ms > 0
            && self.home_pose.iter().all(|&a| a <= MAX_ANGLE)
            && self.schedule.iter().all(|e| e.is_valid())
            && wiper_ok;

        if ok {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue)
        }
    }
}

#[cfg(feature = "serde")]
impl RobotConfig {
    /// Serialize in the stored override format
    #[cfg(test)]
    pub(crate) fn to_bytes<'a>(&self, buffer: &'a mut [u8]) -> Option<&'a mut [u8]> {
        postcard::to_slice(self, buffer).ok()
    }

    /// Deserialize a stored override, checking version and ranges
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let config: RobotConfig = postcard::from_bytes(bytes).ok()?;
        if config.version != CONFIG_VERSION || config.validate().is_err() {
            return None;
        }
        Some(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let config = RobotConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.schedule.len(), 8);
        assert_eq!(config.obstacle_threshold_cm, 20);
    }

    #[test]
    fn test_bad_wiper_limits() {
        let mut config = RobotConfig::default();
        config.wiper.park_angle = 200;
        assert_eq!(config.validate(), Err(ConfigError::InvalidValue));
    }

    #[test]
    fn test_bad_home_pose() {
        let mut config = RobotConfig::default();
        config.home_pose[2] = 181;
        assert_eq!(config.validate(), Err(ConfigError::InvalidValue));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_binary_override() {
        let mut config = RobotConfig::default();
        config.obstacle_threshold_cm = 35;

        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let len = config.to_bytes(&mut buffer).unwrap().len();
        assert_eq!(RobotConfig::from_bytes(&buffer[..len]), Some(config));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_binary_override_version_checked() {
        let mut config = RobotConfig::default();
        config.version = 7;

        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let len = config.to_bytes(&mut buffer).unwrap().len();
        assert_eq!(RobotConfig::from_bytes(&buffer[..len]), None);
    }
}

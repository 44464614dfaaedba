//! Minimal TOML parser for the robot configuration
//!
//! Handles only the subset used by `robot.toml`. It does NOT support the
//! full TOML spec.
//!
//! Supported:
//! - `key = value` pairs (integer, boolean, string, integer array)
//! - `[interlock]`, `[teach]`, `[alert]`, `[wiper]`, `[home]` sections
//! - `[[schedule]]` array-of-tables entries
//! - Comments (`# ...`), also after values
//!
//! The first `[[schedule]]` entry replaces the default timetable.

use heapless::Vec;

use super::types::{ConfigError, RobotConfig};
use crate::mode::ModeKind;
use crate::schedule::trigger::ScheduleEntry;
use crate::sequence::frame::AXIS_COUNT;

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Interlock,
    Teach,
    Alert,
    Wiper,
    Home,
    Schedule,
}

/// Schedule entry under construction
#[derive(Debug, Default)]
struct PendingEntry {
    hour: Option<u8>,
    minute: Option<u8>,
    kind: Option<ModeKind>,
}

impl PendingEntry {
    fn finish(self) -> Result<ScheduleEntry, ConfigError> {
        let entry = ScheduleEntry::new(
            self.hour.ok_or(ConfigError::InvalidValue)?,
            self.minute.ok_or(ConfigError::InvalidValue)?,
            self.kind.ok_or(ConfigError::InvalidValue)?,
        );
        if entry.is_valid() {
            Ok(entry)
        } else {
            Err(ConfigError::InvalidValue)
        }
    }
}

/// Parse TOML text into a validated `RobotConfig`
///
/// Keys that are absent keep their defaults.
pub fn parse_config(input: &str) -> Result<RobotConfig, ConfigError> {
    let mut config = RobotConfig::default();
    let mut section = Section::Root;
    let mut pending: Option<PendingEntry> = None;
    let mut custom_schedule = false;

    for line in input.lines() {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }

        // Array-of-tables header
        if let Some(name) = line.strip_prefix("[[").and_then(|l| l.strip_suffix("]]")) {
            if name.trim() != "schedule" {
                return Err(ConfigError::InvalidSection);
            }
            flush_entry(&mut pending, &mut config)?;
            if !custom_schedule {
                config.schedule.clear();
                custom_schedule = true;
            }
            section = Section::Schedule;
            pending = Some(PendingEntry::default());
            continue;
        }

        // Table header
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            flush_entry(&mut pending, &mut config)?;
            section = parse_section_header(name.trim())?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ConfigError::InvalidValue)?;
        apply_value(section, key, value, &mut config, &mut pending)?;
    }

    flush_entry(&mut pending, &mut config)?;
    config.validate()?;
    Ok(config)
}

fn parse_section_header(name: &str) -> Result<Section, ConfigError> {
    match name {
        "interlock" => Ok(Section::Interlock),
        "teach" => Ok(Section::Teach),
        "alert" => Ok(Section::Alert),
        "wiper" => Ok(Section::Wiper),
        "home" => Ok(Section::Home),
        _ => Err(ConfigError::InvalidSection),
    }
}

fn flush_entry(
    pending: &mut Option<PendingEntry>,
    config: &mut RobotConfig,
) -> Result<(), ConfigError> {
    if let Some(entry) = pending.take() {
        config
            .schedule
            .push(entry.finish()?)
            .map_err(|_| ConfigError::TooManyItems)?;
    }
    Ok(())
}

/// Drop a trailing comment that is not inside a string
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Parse an integer value
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue),
    }
}

/// Parse an array of joint angles like `[90, 90, 90, 90, 90, 90]`
fn parse_pose(value: &str) -> Result<[u8; AXIS_COUNT], ConfigError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(ConfigError::InvalidValue)?;

    let mut angles: Vec<u8, AXIS_COUNT> = Vec::new();
    for part in inner.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        angles
            .push(parse_int(part)?)
            .map_err(|_| ConfigError::TooManyItems)?;
    }

    if angles.len() != AXIS_COUNT {
        return Err(ConfigError::InvalidValue);
    }
    let mut pose = [0u8; AXIS_COUNT];
    pose.copy_from_slice(&angles);
    Ok(pose)
}

/// Parse a routine name
fn parse_kind(value: &str) -> Result<ModeKind, ConfigError> {
    ModeKind::from_name(parse_string(value)).ok_or(ConfigError::InvalidValue)
}

/// Apply a parsed value to the appropriate config field
fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut RobotConfig,
    pending: &mut Option<PendingEntry>,
) -> Result<(), ConfigError> {
    match (section, key) {
        (Section::Root, "version") => config.version = parse_int(value)?,

        (Section::Interlock, "threshold_cm") => config.obstacle_threshold_cm = parse_int(value)?,

        (Section::Teach, "default_frame_ms") => config.default_frame_ms = parse_int(value)?,
        (Section::Teach, "seed_demo_cleaning") => config.seed_demo_cleaning = parse_bool(value)?,

        (Section::Alert, "beeps") => config.alert.beeps = parse_int(value)?,
        (Section::Alert, "on_ms") => config.alert.on_ms = parse_int(value)?,
        (Section::Alert, "off_ms") => config.alert.off_ms = parse_int(value)?,

        (Section::Wiper, "step_deg") => config.wiper.step_deg = parse_int(value)?,
        (Section::Wiper, "step_interval_ms") => config.wiper.step_interval_ms = parse_int(value)?,
        (Section::Wiper, "min_angle") => config.wiper.min_angle = parse_int(value)?,
        (Section::Wiper, "max_angle") => config.wiper.max_angle = parse_int(value)?,
        (Section::Wiper, "park_angle") => config.wiper.park_angle = parse_int(value)?,

        (Section::Home, "angles") => config.home_pose = parse_pose(value)?,

        (Section::Schedule, _) => {
            let entry = pending.as_mut().ok_or(ConfigError::InvalidSection)?;
            match key {
                "hour" => entry.hour = Some(parse_int(value)?),
                "minute" => entry.minute = Some(parse_int(value)?),
                "mode" => entry.kind = Some(parse_kind(value)?),
                _ => return Err(ConfigError::UnknownKey),
            }
        }

        _ => return Err(ConfigError::UnknownKey),
    }

    Ok(())
}

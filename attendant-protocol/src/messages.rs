//! Message types for the command link
//!
//! - Terminal → Robot: commands, one per packet
//! - Robot → Terminal: accept, reject or status replies

use crate::packet::{Packet, PacketError};

// Message type IDs: Terminal → Robot
pub const MSG_TEACH_START: u8 = 0x10;
pub const MSG_TEACH_STEP: u8 = 0x11;
pub const MSG_TEACH_END: u8 = 0x12;
pub const MSG_PLAY: u8 = 0x13;
pub const MSG_STOP: u8 = 0x14;
pub const MSG_SET_SERVO: u8 = 0x15;
pub const MSG_SET_DRIVE: u8 = 0x16;
pub const MSG_DRIVE: u8 = 0x17;
pub const MSG_HELP: u8 = 0x18;
pub const MSG_STATUS: u8 = 0x19;
pub const MSG_SET_TIME: u8 = 0x1A;

// Message type IDs: Robot → Terminal
pub const MSG_ACCEPT: u8 = 0x80;
pub const MSG_REJECT: u8 = 0x81;
pub const MSG_STATUS_REPORT: u8 = 0x82;

/// Routine byte used when no routine is active
pub const NO_KIND: u8 = 0xFF;

/// Distance value used when there is no echo
pub const NO_DISTANCE: u16 = 0xFFFF;

/// Commands sent to the robot
///
/// Routine kinds and drive presets travel as raw bytes; the controller
/// validates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Begin teaching a routine
    TeachStart { kind: u8 },
    /// Capture the current pose; no duration means the configured default
    TeachStep { duration_ms: Option<u16> },
    /// Finish teaching and persist
    TeachEnd,
    /// Play a routine
    Play { kind: u8 },
    /// Cancel everything
    Stop,
    /// Move one servo
    SetServo { channel: u8, angle: u8 },
    /// Set wheel speeds
    SetDrive { left: i16, right: i16 },
    /// Drive preset (0 forward, 1 backward, 2 left, 3 right)
    Drive { preset: u8 },
    /// Raise the help alert
    Help,
    /// Query status
    Status,
    /// Set the wall clock (24-hour time)
    SetTime { hour: u8, minute: u8, second: u8 },
}

impl Command {
    /// Parse a command from a packet
    pub fn from_packet(packet: &Packet) -> Result<Self, PacketError> {
        let cmd = match packet.msg_type {
            MSG_TEACH_START => Command::TeachStart {
                kind: packet.byte(0)?,
            },
            MSG_TEACH_STEP => Command::TeachStep {
                duration_ms: if packet.payload.is_empty() {
                    None
                } else {
                    Some(packet.u16_le(0)?)
                },
            },
            MSG_TEACH_END => Command::TeachEnd,
            MSG_PLAY => Command::Play {
                kind: packet.byte(0)?,
            },
            MSG_STOP => Command::Stop,
            MSG_SET_SERVO => Command::SetServo {
                channel: packet.byte(0)?,
                angle: packet.byte(1)?,
            },
            MSG_SET_DRIVE => Command::SetDrive {
                left: packet.i16_le(0)?,
                right: packet.i16_le(2)?,
            },
            MSG_DRIVE => Command::Drive {
                preset: packet.byte(0)?,
            },
            MSG_HELP => Command::Help,
            MSG_STATUS => Command::Status,
            MSG_SET_TIME => Command::SetTime {
                hour: packet.byte(0)?,
                minute: packet.byte(1)?,
                second: packet.byte(2)?,
            },
            _ => return Err(PacketError::InvalidPacket),
        };
        Ok(cmd)
    }

    /// Encode this command into a packet (terminal side and tests)
    pub fn to_packet(&self) -> Result<Packet, PacketError> {
        match *self {
            Command::TeachStart { kind } => Packet::new(MSG_TEACH_START, &[kind]),
            Command::TeachStep { duration_ms: None } => Ok(Packet::empty(MSG_TEACH_STEP)),
            Command::TeachStep {
                duration_ms: Some(ms),
            } => Packet::new(MSG_TEACH_STEP, &ms.to_le_bytes()),
            Command::TeachEnd => Ok(Packet::empty(MSG_TEACH_END)),
            Command::Play { kind } => Packet::new(MSG_PLAY, &[kind]),
            Command::Stop => Ok(Packet::empty(MSG_STOP)),
            Command::SetServo { channel, angle } => Packet::new(MSG_SET_SERVO, &[channel, angle]),
            Command::SetDrive { left, right } => {
                let l = left.to_le_bytes();
                let r = right.to_le_bytes();
                Packet::new(MSG_SET_DRIVE, &[l[0], l[1], r[0], r[1]])
            }
            Command::Drive { preset } => Packet::new(MSG_DRIVE, &[preset]),
            Command::Help => Ok(Packet::empty(MSG_HELP)),
            Command::Status => Ok(Packet::empty(MSG_STATUS)),
            Command::SetTime {
                hour,
                minute,
                second,
            } => Packet::new(MSG_SET_TIME, &[hour, minute, second]),
        }
    }
}

/// Reason a command was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RejectCode {
    /// Not allowed in the current mode
    WrongMode = 1,
    /// Routine has no frames
    EmptySequence = 2,
    /// Routine is full
    CapacityExceeded = 3,
    /// Frame duration must be non-zero
    InvalidDuration = 4,
    /// No such servo channel
    InvalidChannel = 5,
    /// Interlock holding the robot
    ObstacleActive = 6,
    /// Unknown routine, preset or malformed argument
    InvalidArgument = 7,
    /// No wall clock fitted
    ClockUnavailable = 8,
}

impl RejectCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(RejectCode::WrongMode),
            2 => Some(RejectCode::EmptySequence),
            3 => Some(RejectCode::CapacityExceeded),
            4 => Some(RejectCode::InvalidDuration),
            5 => Some(RejectCode::InvalidChannel),
            6 => Some(RejectCode::ObstacleActive),
            7 => Some(RejectCode::InvalidArgument),
            8 => Some(RejectCode::ClockUnavailable),
            _ => None,
        }
    }
}

/// Status report payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    /// 0 idle, 1 teaching, 2 playing, 3 obstacle stop, 4 help alert
    pub mode: u8,
    /// Active routine or `NO_KIND`
    pub kind: u8,
    /// Current playback frame
    pub frame_index: u8,
    /// Frames in the active routine
    pub frame_count: u8,
    /// Last distance reading (cm) or `NO_DISTANCE`
    pub distance_cm: u16,
}

/// Replies sent by the robot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    /// Command accepted
    Accept,
    /// Command refused
    Reject(RejectCode),
    /// Answer to `Status`
    Status(StatusReport),
}

impl Reply {
    /// Encode this reply into a packet
    pub fn to_packet(&self) -> Result<Packet, PacketError> {
        match self {
            Reply::Accept => Ok(Packet::empty(MSG_ACCEPT)),
            Reply::Reject(code) => Packet::new(MSG_REJECT, &[*code as u8]),
            Reply::Status(s) => {
                let d = s.distance_cm.to_le_bytes();
                Packet::new(
                    MSG_STATUS_REPORT,
                    &[s.mode, s.kind, s.frame_index, s.frame_count, d[0], d[1]],
                )
            }
        }
    }

    /// Parse a reply (terminal side and tests)
    pub fn from_packet(packet: &Packet) -> Result<Self, PacketError> {
        match packet.msg_type {
            MSG_ACCEPT => Ok(Reply::Accept),
            MSG_REJECT => RejectCode::from_u8(packet.byte(0)?)
                .map(Reply::Reject)
                .ok_or(PacketError::InvalidPacket),
            MSG_STATUS_REPORT => Ok(Reply::Status(StatusReport {
                mode: packet.byte(0)?,
                kind: packet.byte(1)?,
                frame_index: packet.byte(2)?,
                frame_count: packet.byte(3)?,
                distance_cm: packet.u16_le(4)?,
            })),
            _ => Err(PacketError::InvalidPacket),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    extern crate std;
    use std::vec;

    #[test]
    fn test_teach_step_optional_duration() {
        let bare = Packet::empty(MSG_TEACH_STEP);
        assert_eq!(
            Command::from_packet(&bare),
            Ok(Command::TeachStep { duration_ms: None })
        );

        let timed = Packet::new(MSG_TEACH_STEP, &[0xE8, 0x03]).unwrap();
        assert_eq!(
            Command::from_packet(&timed),
            Ok(Command::TeachStep {
                duration_ms: Some(1000)
            })
        );
    }

    #[test]
    fn test_missing_arguments() {
        assert_eq!(
            Command::from_packet(&Packet::empty(MSG_PLAY)),
            Err(PacketError::InvalidPacket)
        );
        assert_eq!(
            Command::from_packet(&Packet::new(MSG_SET_SERVO, &[2]).unwrap()),
            Err(PacketError::InvalidPacket)
        );
        assert_eq!(
            Command::from_packet(&Packet::new(MSG_SET_DRIVE, &[1, 2, 3]).unwrap()),
            Err(PacketError::InvalidPacket)
        );
    }

    #[test]
    fn test_set_time_payload() {
        let packet = Packet::new(MSG_SET_TIME, &[8, 0, 30]).unwrap();
        assert_eq!(
            Command::from_packet(&packet),
            Ok(Command::SetTime {
                hour: 8,
                minute: 0,
                second: 30
            })
        );
        assert_eq!(
            Command::from_packet(&Packet::new(MSG_SET_TIME, &[8, 0]).unwrap()),
            Err(PacketError::InvalidPacket)
        );
    }

    #[test]
    fn test_unknown_type() {
        assert_eq!(
            Command::from_packet(&Packet::empty(0x7F)),
            Err(PacketError::InvalidPacket)
        );
    }

    #[test]
    fn test_reject_reply() {
        let packet = Reply::Reject(RejectCode::EmptySequence).to_packet().unwrap();
        assert_eq!(packet.msg_type, MSG_REJECT);
        assert_eq!(packet.payload.as_slice(), &[2]);
        assert_eq!(
            Reply::from_packet(&packet),
            Ok(Reply::Reject(RejectCode::EmptySequence))
        );
    }

    #[test]
    fn test_status_reply() {
        let report = StatusReport {
            mode: 2,
            kind: 1,
            frame_index: 0,
            frame_count: 3,
            distance_cm: NO_DISTANCE,
        };
        let packet = Reply::Status(report).to_packet().unwrap();
        assert_eq!(packet.payload.len(), 6);
        assert_eq!(Reply::from_packet(&packet), Ok(Reply::Status(report)));
    }

    fn arb_command() -> impl Strategy<Value = Command> {
        prop_oneof![
            any::<u8>().prop_map(|kind| Command::TeachStart { kind }),
            proptest::option::of(any::<u16>()).prop_map(|duration_ms| Command::TeachStep { duration_ms }),
            Just(Command::TeachEnd),
            any::<u8>().prop_map(|kind| Command::Play { kind }),
            Just(Command::Stop),
            (any::<u8>(), any::<u8>()).prop_map(|(channel, angle)| Command::SetServo { channel, angle }),
            (any::<i16>(), any::<i16>()).prop_map(|(left, right)| Command::SetDrive { left, right }),
            any::<u8>().prop_map(|preset| Command::Drive { preset }),
            Just(Command::Help),
            Just(Command::Status),
            (any::<u8>(), any::<u8>(), any::<u8>())
                .prop_map(|(hour, minute, second)| Command::SetTime { hour, minute, second }),
        ]
    }

    proptest! {
        #[test]
        fn prop_command_survives_the_wire(cmd in arb_command()) {
            let bytes = cmd.to_packet().unwrap().encode_to_vec().unwrap();
            let mut parser = crate::PacketParser::new();
            let mut parsed = None;
            for &b in bytes.iter() {
                if let Some(p) = parser.feed(b).unwrap() {
                    parsed = Some(p);
                }
            }
            let packet = parsed.unwrap();
            prop_assert_eq!(Command::from_packet(&packet), Ok(cmd));
        }
    }
}

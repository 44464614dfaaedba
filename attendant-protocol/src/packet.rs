//! Link packets
//!
//! ```text
//! 0xAA | len | type | payload[len] | xor(len, type, payload)
//! ```
//!
//! `len` is at most [`MAX_PAYLOAD_SIZE`]. The checksum skips the start byte.

use heapless::Vec;

/// Packet synchronization byte
pub const PACKET_START: u8 = 0xAA;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 32;

/// Maximum complete packet size (START + LENGTH + TYPE + MAX_PAYLOAD + CHECKSUM)
pub const MAX_PACKET_SIZE: usize = 1 + 1 + 1 + MAX_PAYLOAD_SIZE + 1;

/// Packet errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketError {
    /// Length byte or payload above `MAX_PAYLOAD_SIZE`
    PayloadTooLarge,
    /// Checksum did not match
    InvalidChecksum,
    /// Unknown message type or missing payload bytes
    InvalidPacket,
    /// Encode target too short
    BufferTooSmall,
}

/// A parsed or constructed packet
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Packet {
    /// Message type identifier
    pub msg_type: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Packet {
    /// Create a packet with the given message type and payload
    pub fn new(msg_type: u8, payload: &[u8]) -> Result<Self, PacketError> {
        let payload = Vec::from_slice(payload).map_err(|_| PacketError::PayloadTooLarge)?;
        Ok(Self { msg_type, payload })
    }

    /// Create a packet with no payload
    pub fn empty(msg_type: u8) -> Self {
        Self {
            msg_type,
            payload: Vec::new(),
        }
    }

    fn checksum(length: u8, msg_type: u8, payload: &[u8]) -> u8 {
        payload.iter().fold(length ^ msg_type, |acc, &b| acc ^ b)
    }

    /// Encode this packet into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, PacketError> {
        let n = self.payload.len();
        let packet_len = n + 4;
        if buffer.len() < packet_len {
            return Err(PacketError::BufferTooSmall);
        }

        buffer[0] = PACKET_START;
        buffer[1] = n as u8;
        buffer[2] = self.msg_type;
        buffer[3..3 + n].copy_from_slice(&self.payload);
        buffer[3 + n] = Self::checksum(n as u8, self.msg_type, &self.payload);

        Ok(packet_len)
    }

    /// Encode this packet into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_PACKET_SIZE>, PacketError> {
        let mut buffer = [0u8; MAX_PACKET_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| PacketError::BufferTooSmall)
    }

    /// Payload byte at `index`, or `InvalidPacket` if missing
    pub fn byte(&self, index: usize) -> Result<u8, PacketError> {
        self.payload
            .get(index)
            .copied()
            .ok_or(PacketError::InvalidPacket)
    }

    /// Little-endian i16 at `index`
    pub fn i16_le(&self, index: usize) -> Result<i16, PacketError> {
        Ok(i16::from_le_bytes([self.byte(index)?, self.byte(index + 1)?]))
    }

    /// Little-endian u16 at `index`
    pub fn u16_le(&self, index: usize) -> Result<u16, PacketError> {
        Ok(u16::from_le_bytes([self.byte(index)?, self.byte(index + 1)?]))
    }
}

/// Byte-at-a-time packet parser
///
/// Anything outside a packet is skipped up to the next start byte, and an
/// error always drops back to waiting for one.
#[derive(Debug, Clone, Default)]
pub struct PacketParser {
    stage: Stage,
    payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

/// What the next byte is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Stage {
    #[default]
    Sync,
    Length,
    Type { len: u8 },
    Payload { len: u8, msg_type: u8 },
    Checksum { len: u8, msg_type: u8 },
}

impl PacketParser {
    pub const fn new() -> Self {
        Self {
            stage: Stage::Sync,
            payload: Vec::new(),
        }
    }

    /// Check if the parser is in the middle of a packet
    pub fn is_mid_packet(&self) -> bool {
        self.stage != Stage::Sync
    }

    /// Feed one received byte
    ///
    /// Yields a packet once its checksum byte has been accepted.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Packet>, PacketError> {
        self.stage = match self.stage {
            Stage::Sync if byte == PACKET_START => Stage::Length,
            Stage::Sync => Stage::Sync,
            Stage::Length if byte as usize > MAX_PAYLOAD_SIZE => {
                self.stage = Stage::Sync;
                return Err(PacketError::PayloadTooLarge);
            }
            Stage::Length => Stage::Type { len: byte },
            Stage::Type { len } => {
                self.payload.clear();
                if len == 0 {
                    Stage::Checksum { len, msg_type: byte }
                } else {
                    Stage::Payload { len, msg_type: byte }
                }
            }
            Stage::Payload { len, msg_type } => {
                if self.payload.push(byte).is_err() {
                    self.stage = Stage::Sync;
                    return Err(PacketError::PayloadTooLarge);
                }
                if self.payload.len() == len as usize {
                    Stage::Checksum { len, msg_type }
                } else {
                    Stage::Payload { len, msg_type }
                }
            }
            Stage::Checksum { len, msg_type } => {
                self.stage = Stage::Sync;
                let payload = core::mem::take(&mut self.payload);
                if byte != Packet::checksum(len, msg_type, &payload) {
                    return Err(PacketError::InvalidChecksum);
                }
                return Ok(Some(Packet { msg_type, payload }));
            }
        };
        Ok(None)
    }
}

//! Persisted sequence record format
//!
//! Every sequence is stored as one fixed-size little-endian record so a
//! slot can be rewritten in place:
//!
//! ```text
//! offset  size  field
//! 0       2     magic (0x5351, "SQ")
//! 2       1     format version
//! 3       1     kind (slot index)
//! 4       1     frame count
//! 5       1     reserved (0)
//! 6       240   20 frames x 12 bytes, unused slots zeroed
//! 246     4     CRC32 over bytes 0..246
//! ```
//!
//! Frame layout: 6 joint angles (u8), left speed (i16), right speed (i16),
//! duration in ms (u16).

use super::frame::{Frame, AXIS_COUNT};
use super::store::{Sequence, SEQUENCE_CAPACITY};
use crate::mode::ModeKind;

/// Magic number identifying a sequence record
pub const RECORD_MAGIC: u16 = 0x5351; // "SQ"

/// Current record format version
pub const RECORD_VERSION: u8 = 1;

/// Header size in bytes
pub const HEADER_SIZE: usize = 6;

/// Encoded size of one frame
pub const FRAME_SIZE: usize = AXIS_COUNT + 6;

/// Encoded size of one record
pub const RECORD_SIZE: usize = HEADER_SIZE + SEQUENCE_CAPACITY * FRAME_SIZE + 4;

const CRC_OFFSET: usize = RECORD_SIZE - 4;

/// Record decoding errors
///
/// Any of these means the slot is treated as empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordError {
    /// Input is not exactly one record long
    BadLength,
    /// Magic number mismatch (uninitialized or foreign data)
    BadMagic,
    /// Unsupported format version
    BadVersion,
    /// Frame count larger than capacity
    BadFrameCount,
    /// Record belongs to another slot
    WrongSlot,
    /// CRC mismatch
    ChecksumMismatch,
}

/// Check if a record area has never been written
///
/// Erased flash reads as 0xFF; a zero-filled medium is also treated as blank.
pub fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| b == 0xFF) || bytes.iter().all(|&b| b == 0x00)
}

/// Encode a sequence into its fixed-size record
pub fn encode(kind: ModeKind, sequence: &Sequence) -> [u8; RECORD_SIZE] {
    let mut out = [0u8; RECORD_SIZE];

    out[0..2].copy_from_slice(&RECORD_MAGIC.to_le_bytes());
    out[2] = RECORD_VERSION;
    out[3] = kind as u8;
    out[4] = sequence.len() as u8;

    for (i, frame) in sequence.frames().iter().enumerate() {
        let start = HEADER_SIZE + i * FRAME_SIZE;
        encode_frame(frame, &mut out[start..start + FRAME_SIZE]);
    }

    let crc = crc32(&out[..CRC_OFFSET]);
    out[CRC_OFFSET..].copy_from_slice(&crc.to_le_bytes());

    out
}

/// Decode a record for the given slot
pub fn decode(kind: ModeKind, bytes: &[u8]) -> Result<Sequence, RecordError> {
    if bytes.len() != RECORD_SIZE {
        return Err(RecordError::BadLength);
    }

    let magic = u16::from_le_bytes([bytes[0], bytes[1]]);
    if magic != RECORD_MAGIC {
        return Err(RecordError::BadMagic);
    }

    if bytes[2] != RECORD_VERSION {
        return Err(RecordError::BadVersion);
    }

    let stored_crc = u32::from_le_bytes([
        bytes[CRC_OFFSET],
        bytes[CRC_OFFSET + 1],
        bytes[CRC_OFFSET + 2],
        bytes[CRC_OFFSET + 3],
    ]);
    if stored_crc != crc32(&bytes[..CRC_OFFSET]) {
        return Err(RecordError::ChecksumMismatch);
    }

    if bytes[3] != kind as u8 {
        return Err(RecordError::WrongSlot);
    }

    let count = bytes[4] as usize;
    if count > SEQUENCE_CAPACITY {
        return Err(RecordError::BadFrameCount);
    }

    let mut sequence = Sequence::new();
    for i in 0..count {
        let start = HEADER_SIZE + i * FRAME_SIZE;
        let frame = decode_frame(&bytes[start..start + FRAME_SIZE]);
        sequence
            .push(frame)
            .map_err(|_| RecordError::BadFrameCount)?;
    }

    Ok(sequence)
}

fn encode_frame(frame: &Frame, out: &mut [u8]) {
    out[..AXIS_COUNT].copy_from_slice(&frame.targets.angles);
    out[AXIS_COUNT..AXIS_COUNT + 2].copy_from_slice(&frame.targets.drive.left.to_le_bytes());
    out[AXIS_COUNT + 2..AXIS_COUNT + 4].copy_from_slice(&frame.targets.drive.right.to_le_bytes());
    out[AXIS_COUNT + 4..AXIS_COUNT + 6].copy_from_slice(&frame.duration_ms.to_le_bytes());
}

fn decode_frame(bytes: &[u8]) -> Frame {
    let mut angles = [0u8; AXIS_COUNT];
    angles.copy_from_slice(&bytes[..AXIS_COUNT]);
    let left = i16::from_le_bytes([bytes[AXIS_COUNT], bytes[AXIS_COUNT + 1]]);
    let right = i16::from_le_bytes([bytes[AXIS_COUNT + 2], bytes[AXIS_COUNT + 3]]);
    let duration_ms = u16::from_le_bytes([bytes[AXIS_COUNT + 4], bytes[AXIS_COUNT + 5]]);
    Frame::new(angles, left, right, duration_ms)
}

/// CRC32 (IEEE 802.3 polynomial)
pub fn crc32(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB88320;
    let mut crc: u32 = 0xFFFFFFFF;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    !crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> Sequence {
        let mut seq = Sequence::new();
        seq.push(Frame::new([90, 45, 120, 0, 180, 60], 140, -140, 800))
            .unwrap();
        seq.push(Frame::new([10, 20, 30, 40, 50, 60], -255, 255, 65535))
            .unwrap();
        seq
    }

    #[test]
    fn test_record_size() {
        assert_eq!(RECORD_SIZE, 250);
    }

    #[test]
    fn test_crc32_known_value() {
        // Standard check value for "123456789"
        assert_eq!(crc32(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_encode_decode() {
        let seq = sample();
        let bytes = encode(ModeKind::Garbage, &seq);
        assert_eq!(decode(ModeKind::Garbage, &bytes), Ok(seq));
    }

    #[test]
    fn test_blank_storage() {
        assert!(is_blank(&[0xFF; RECORD_SIZE]));
        assert!(is_blank(&[0x00; RECORD_SIZE]));
        assert_eq!(
            decode(ModeKind::Water, &[0xFF; RECORD_SIZE]),
            Err(RecordError::BadMagic)
        );
    }

    #[test]
    fn test_corruption_detected() {
        let mut bytes = encode(ModeKind::Water, &sample());
        bytes[HEADER_SIZE + 3] ^= 0x01;
        assert_eq!(
            decode(ModeKind::Water, &bytes),
            Err(RecordError::ChecksumMismatch)
        );
    }

    #[test]
    fn test_wrong_slot_rejected() {
        let bytes = encode(ModeKind::Water, &sample());
        assert_eq!(
            decode(ModeKind::Cleaning, &bytes),
            Err(RecordError::WrongSlot)
        );
        assert_eq!(decode(ModeKind::Water, &bytes), Ok(sample()));
    }

    #[test]
    fn test_bad_version_and_length() {
        let mut bytes = encode(ModeKind::Water, &sample());
        bytes[2] = 9;
        assert_eq!(decode(ModeKind::Water, &bytes), Err(RecordError::BadVersion));
        assert_eq!(
            decode(ModeKind::Water, &bytes[..100]),
            Err(RecordError::BadLength)
        );
    }

    #[test]
    fn test_overlong_count_rejected() {
        let mut bytes = encode(ModeKind::Water, &sample());
        bytes[4] = (SEQUENCE_CAPACITY + 1) as u8;
        let crc = crc32(&bytes[..CRC_OFFSET]);
        bytes[CRC_OFFSET..].copy_from_slice(&crc.to_le_bytes());
        assert_eq!(
            decode(ModeKind::Water, &bytes),
            Err(RecordError::BadFrameCount)
        );
    }

    fn arb_frame() -> impl Strategy<Value = Frame> {
        (
            proptest::array::uniform6(0u8..=180),
            -255i16..=255,
            -255i16..=255,
            1u16..=u16::MAX,
        )
            .prop_map(|(angles, left, right, dur)| Frame::new(angles, left, right, dur))
    }

    proptest! {
        #[test]
        fn prop_record_roundtrip(frames in proptest::collection::vec(arb_frame(), 0..=SEQUENCE_CAPACITY)) {
            let mut seq = Sequence::new();
            for frame in &frames {
                seq.push(*frame).unwrap();
            }
            for kind in ModeKind::ALL {
                let bytes = encode(kind, &seq);
                prop_assert_eq!(decode(kind, &bytes), Ok(seq.clone()));
            }
        }
    }
}

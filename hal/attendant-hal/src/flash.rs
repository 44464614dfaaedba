//! Flash storage abstractions
//!
//! Provides traits for persistent key-value storage that can be implemented
//! by chip-specific HALs using their flash memory.

/// Number of taught-sequence slots (one per task kind)
pub const SEQUENCE_SLOTS: u8 = 4;

/// Storage keys for persisted data
///
/// Each taught sequence occupies its own key so that saving one routine
/// never rewrites the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// Robot configuration override (binary postcard format)
    RobotConfig = 0,
    /// Taught sequence for the water round
    WaterSequence = 1,
    /// Taught sequence for the medicine round
    MedicineSequence = 2,
    /// Taught sequence for the garbage round
    GarbageSequence = 3,
    /// Taught sequence for the cleaning round
    CleaningSequence = 4,
}

impl StorageKey {
    /// Get the key as a byte value
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create a key from a byte value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StorageKey::RobotConfig),
            1 => Some(StorageKey::WaterSequence),
            2 => Some(StorageKey::MedicineSequence),
            3 => Some(StorageKey::GarbageSequence),
            4 => Some(StorageKey::CleaningSequence),
            _ => None,
        }
    }

    /// Key for the sequence slot with the given index (0-based)
    pub fn sequence(slot: u8) -> Option<Self> {
        if slot < SEQUENCE_SLOTS {
            Self::from_u8(slot + 1)
        } else {
            None
        }
    }

    /// Sequence slot index for this key, if it is a sequence key
    pub fn sequence_slot(self) -> Option<u8> {
        match self {
            StorageKey::RobotConfig => None,
            key => Some(key.as_u8() - 1),
        }
    }
}

/// Errors from flash storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Flash operation failed
    Flash,
    /// Storage operation failed
    Storage,
    /// Key not found
    NotFound,
    /// Buffer too small for the data
    BufferTooSmall,
    /// Data corrupted or invalid
    Corrupted,
    /// Storage is full
    Full,
}

/// Persistent key-value storage
///
/// One item per key; writing a key replaces its previous value.
/// Implementations are expected to wear-level and to detect torn writes.
pub trait FlashStorage {
    /// Read the value for `key` into `buffer`
    ///
    /// # Returns
    /// The number of bytes read, or `NotFound` if the key was never written.
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> impl core::future::Future<Output = Result<usize, FlashError>>;

    /// Write the value for `key`
    fn write(&mut self, key: StorageKey, data: &[u8]) -> impl core::future::Future<Output = Result<(), FlashError>>;
}

// Implement the sequential-storage Key trait when the feature is enabled
#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for StorageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        buffer[0] = self.as_u8();
        Ok(1)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        match StorageKey::from_u8(buffer[0]) {
            Some(key) => Ok((key, 1)),
            None => Err(sequential_storage::map::SerializationError::InvalidFormat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_byte_roundtrip() {
        for value in 0..=4 {
            let key = StorageKey::from_u8(value).unwrap();
            assert_eq!(key.as_u8(), value);
        }
        assert_eq!(StorageKey::from_u8(5), None);
    }

    #[test]
    fn test_sequence_slots() {
        assert_eq!(StorageKey::sequence(0), Some(StorageKey::WaterSequence));
        assert_eq!(StorageKey::sequence(3), Some(StorageKey::CleaningSequence));
        assert_eq!(StorageKey::sequence(4), None);

        assert_eq!(StorageKey::MedicineSequence.sequence_slot(), Some(1));
        assert_eq!(StorageKey::RobotConfig.sequence_slot(), None);
    }
}

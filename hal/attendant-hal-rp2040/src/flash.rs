//! Flash storage driver for RP2040
//!
//! Keeps the robot configuration override and the four taught routines in
//! a sequential-storage map at the top of flash. The linker script leaves
//! this region out of the program image.

use core::ops::Range;

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

// Re-export shared types from attendant-hal
pub use attendant_hal::flash::{FlashError, StorageKey};

/// Total flash on the board
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Reserved data region: 16 erase sectors
pub const DATA_PARTITION_SIZE: usize = 64 * 1024;
pub const DATA_PARTITION_START: usize = FLASH_SIZE - DATA_PARTITION_SIZE;

const DATA_RANGE: Range<u32> = (DATA_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Scratch size for one stored item (a routine record is the largest)
const ITEM_BUFFER_SIZE: usize = 512;

/// RP2040 flash-backed storage
///
/// Rewriting a key appends a new copy; sequential-storage reclaims the
/// stale one when its page is recycled.
pub struct Rp2040FlashStorage<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
    scratch: [u8; ITEM_BUFFER_SIZE],
}

impl<'d> Rp2040FlashStorage<'d> {
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
            scratch: [0; ITEM_BUFFER_SIZE],
        }
    }
}

fn storage_error<E>(error: sequential_storage::Error<E>) -> FlashError {
    match error {
        sequential_storage::Error::FullStorage => FlashError::Full,
        sequential_storage::Error::Corrupted { .. } => FlashError::Corrupted,
        sequential_storage::Error::Storage { .. } => FlashError::Flash,
        _ => FlashError::Storage,
    }
}

impl<'d> attendant_hal::FlashStorage for Rp2040FlashStorage<'d> {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let item = map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            DATA_RANGE,
            &mut NoCache::new(),
            &mut self.scratch,
            &key,
        )
        .await
        .map_err(storage_error)?
        .ok_or(FlashError::NotFound)?;

        let dest = buffer
            .get_mut(..item.len())
            .ok_or(FlashError::BufferTooSmall)?;
        dest.copy_from_slice(item);
        Ok(item.len())
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        map::store_item(
            &mut self.flash,
            DATA_RANGE,
            &mut NoCache::new(),
            &mut self.scratch,
            &key,
            &data,
        )
        .await
        .map_err(storage_error)
    }
}

/// Type alias used by the firmware
pub type FlashStorage<'d> = Rp2040FlashStorage<'d>;

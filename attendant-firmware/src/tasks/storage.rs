//! Routine storage task
//!
//! Writes finished routines to their flash slots. Flash writes can take
//! tens of milliseconds, so they run here instead of in the control loop.

use defmt::*;

use attendant_hal_rp2040::flash::{FlashStorage, StorageKey};
use attendant_hal_rp2040::FlashStorageTrait;

use crate::channels::PERSIST;

/// Storage task - persists routines as they are taught
#[embassy_executor::task]
pub async fn storage_task(mut storage: FlashStorage<'static>) {
    info!("Storage task started");

    loop {
        let request = PERSIST.receive().await;

        let Some(key) = StorageKey::sequence(request.kind.index() as u8) else {
            warn!("No storage slot for {} routine", request.kind.name());
            continue;
        };

        match storage.write(key, &request.record).await {
            Ok(()) => info!("{} routine saved", request.kind.name()),
            Err(e) => warn!("Failed to save {} routine: {:?}", request.kind.name(), e),
        }
    }
}

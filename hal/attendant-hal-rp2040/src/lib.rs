//! RP2040-specific HAL for the Attendant firmware
//!
//! This crate provides RP2040-specific implementations of the shared
//! `attendant-hal` traits:
//!
//! - Flash storage driver (implements `attendant_hal::FlashStorage`)

#![no_std]

pub mod flash;

// Re-export shared traits from attendant-hal for convenience
pub use attendant_hal::{FlashStorage as FlashStorageTrait, StorageKey};

//! Configuration and routine loading
//!
//! Loads the robot configuration from flash or embedded defaults, and the
//! taught routines from their flash slots.

pub mod loader;

pub use loader::ConfigPersistence;

//! Configuration
//!
//! Board-agnostic robot configuration. The source of truth is a TOML file
//! embedded in the firmware; an override may be stored in flash as
//! postcard binary data.

pub mod parse;
pub mod types;

pub use parse::parse_config;
pub use types::*;

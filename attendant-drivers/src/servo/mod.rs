//! Servo outputs
//!
//! Arm joints and the wiper share one PCA9685 expander.

pub mod pca9685;

pub use pca9685::{Pca9685, Pca9685Config, ServoError};

//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `ehal`: Generic H-bridge over `embedded-hal` 1.0 pins (requires `ehal` feature)
//! - `esp32`: ESP32-C3 SuperMini with a dual H-bridge (requires `esp32` feature)

pub mod mock;

#[cfg(feature = "ehal")]
pub mod ehal;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use mock::*;

#[cfg(feature = "ehal")]
pub use ehal::{EhalBridge, EhalBridgeError};

#[cfg(feature = "esp32")]
pub use esp32::*;

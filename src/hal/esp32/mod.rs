//! ESP32-C3 hardware abstraction layer for the two-wheeled drivetrain.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 SuperMini (RISC-V 160MHz)
//! - **Motor Driver**: dual H-bridge with IN1/IN2/PWM per channel (TB6612FNG or L298N)
//! - **Encoders**: one single-channel wheel encoder per side
//!
//! # Pin Assignments
//!
//! Pins are chosen by the firmware binary (`src/bin/esp32_main.rs`), which
//! passes the peripherals in and reports the GPIO numbers it used.

mod bridge;
mod clock;
mod encoder;

pub use bridge::Esp32Bridge;
pub use clock::{micros, Esp32Clock};
pub use encoder::Esp32EncoderPin;

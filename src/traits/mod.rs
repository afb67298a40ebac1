//! Trait definitions for hardware abstraction.
//!
//! The drivetrain core only touches hardware through two seams:
//!
//! - [`HBridge`]: direction pins and PWM duty for one wheel
//! - [`Clock`]: monotonic microsecond time source
//!
//! Encoder edges are pushed in by the platform (see
//! [`SpeedEstimator::on_edge`](crate::encoder::SpeedEstimator::on_edge)), so
//! no encoder trait is needed.

pub mod hardware;

pub use hardware::*;

//! # rs-drivetrain
//!
//! Closed-loop velocity control for a two-wheeled robot: interrupt-fed
//! encoder speed estimation, a discrete-time PID controller and an H-bridge
//! driver for each wheel.
//!
//! ## Features
//!
//! - **Lock-free encoder input**: edge timestamps from an interrupt handler, shared through atomics
//! - **Asymmetry-tolerant estimate**: rising and falling edges timed independently
//! - **PID with anti-windup**: integral clamp, output clamp, live retuning with memory reset
//! - **Single-write actuation**: direction pattern and duty always written together
//! - **Hardware abstraction**: mock HAL for desktop tests, `embedded-hal` and ESP32 backends
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware abstractions (`HBridge`, `Clock`)
//! - `encoder` - Edge timestamps to ticks per second
//! - `pid` - Velocity controller
//! - `actuator` - Control signal to H-bridge command
//! - `wheel` - One wheel's control loop
//! - `drivetrain` - Both wheels plus tick scheduling
//! - `timing` - Wrapping microsecond arithmetic, debounce, intervals
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use rs_drivetrain::{Config, Drivetrain, Gains};
//! use rs_drivetrain::encoder::SpeedEstimator;
//! use rs_drivetrain::hal::MockBridge;
//! use rs_drivetrain::traits::{DriveMode, Polarity};
//!
//! static LEFT: SpeedEstimator = SpeedEstimator::new();
//! static RIGHT: SpeedEstimator = SpeedEstimator::new();
//!
//! let config = Config::default().with_gains(Gains::new(0.5, 0.1, 0.0));
//! let mut drivetrain =
//!     Drivetrain::new(&LEFT, MockBridge::new(), &RIGHT, MockBridge::new(), &config);
//! drivetrain.set_target_speeds(80.0, 80.0);
//!
//! // The encoder interrupt feeds edges...
//! for i in 0..4u32 {
//!     LEFT.on_edge(Polarity::from_level(i % 2 == 0), i * 10_000);
//! }
//!
//! // ...and the main loop polls
//! let tick = drivetrain.poll(30_000).unwrap().unwrap();
//! assert_eq!(tick.left.measured_speed, 100.0);
//! assert_eq!(tick.right.command.mode, DriveMode::Forward);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// H-bridge driver mapping a control signal to pins and duty.
pub mod actuator;
/// Shared configuration system for desktop and ESP32.
pub mod config;
/// Two-wheel drivetrain with fixed-period scheduling.
pub mod drivetrain;
/// Interrupt-fed encoder speed estimation.
pub mod encoder;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// PID velocity controller.
pub mod pid;
/// Wrapping microsecond time arithmetic.
pub mod timing;
/// Core traits for hardware abstraction.
pub mod traits;
/// Per-wheel control loop.
pub mod wheel;

// Re-exports for convenience
pub use actuator::Actuator;
pub use drivetrain::{Drivetrain, DrivetrainState, DrivetrainTick, WheelSide};
pub use encoder::SpeedEstimator;
pub use pid::{Gains, PidTerms, PidUpdate, SkipReason, VelocityPid};
pub use traits::{Clock, DriveCommand, DriveMode, HBridge, Polarity};
pub use wheel::{TickReport, WheelState, WheelUnit};

// Config re-exports
pub use config::{ActuatorConfig, Config, EncoderConfig, PidConfig, StopMode, WheelConfig};

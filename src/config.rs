//! Drivetrain configuration shared by desktop tests and firmware.
//!
//! Uses `heapless::String` for `no_std` compatibility. Every section has a
//! `Default` matching the robot's stock tuning and `with_*` builders for
//! overrides.
//!
//! # Example
//!
//! ```rust
//! use rs_drivetrain::config::{Config, PidConfig, WheelConfig};
//! use rs_drivetrain::Gains;
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.control_period_ms, 200);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_control_period_ms(100)
//!     .with_left(WheelConfig::left().with_pid(
//!         PidConfig::default().with_gains(Gains::new(0.01, 0.002, 0.5)),
//!     ));
//! assert_eq!(config.left.pid.gains.kd, 0.5);
//! ```

use heapless::String as HString;

use crate::pid::Gains;
use crate::traits::DriveMode;

/// Maximum length for short config strings (wheel names)
pub const MAX_SHORT_STRING: usize = 16;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let take = s.len().min(MAX_SHORT_STRING);
    // Find valid UTF-8 boundary
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete drivetrain configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Left wheel
    pub left: WheelConfig,
    /// Right wheel
    pub right: WheelConfig,
    /// Nominal control tick period in milliseconds
    pub control_period_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            left: WheelConfig::left(),
            right: WheelConfig::right(),
            control_period_ms: 200,
        }
    }
}

impl Config {
    /// Set the left wheel configuration
    pub fn with_left(mut self, left: WheelConfig) -> Self {
        self.left = left;
        self
    }

    /// Set the right wheel configuration
    pub fn with_right(mut self, right: WheelConfig) -> Self {
        self.right = right;
        self
    }

    /// Set the control period
    pub fn with_control_period_ms(mut self, ms: u32) -> Self {
        self.control_period_ms = ms;
        self
    }

    /// Apply the same PID gains to both wheels
    pub fn with_gains(mut self, gains: Gains) -> Self {
        self.left.pid.gains = gains;
        self.right.pid.gains = gains;
        self
    }
}

// ============================================================================
// Wheel Config
// ============================================================================

/// Configuration for one wheel unit
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WheelConfig {
    /// Name used in log output
    pub name: ShortString,
    /// Encoder timing
    pub encoder: EncoderConfig,
    /// Controller tuning
    pub pid: PidConfig,
    /// H-bridge behaviour
    pub actuator: ActuatorConfig,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            name: short_string("wheel"),
            encoder: EncoderConfig::default(),
            pid: PidConfig::default(),
            actuator: ActuatorConfig::default(),
        }
    }
}

impl WheelConfig {
    /// Default configuration named "left"
    pub fn left() -> Self {
        Self::default().with_name("left")
    }

    /// Default configuration named "right"
    pub fn right() -> Self {
        Self::default().with_name("right")
    }

    /// Set the name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }

    /// Set the encoder configuration
    pub fn with_encoder(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = encoder;
        self
    }

    /// Set the PID configuration
    pub fn with_pid(mut self, pid: PidConfig) -> Self {
        self.pid = pid;
        self
    }

    /// Set the actuator configuration
    pub fn with_actuator(mut self, actuator: ActuatorConfig) -> Self {
        self.actuator = actuator;
        self
    }
}

// ============================================================================
// Encoder Config
// ============================================================================

/// Encoder edge timing configuration
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncoderConfig {
    /// Minimum spacing between accepted edges of the same polarity
    pub debounce_us: u32,
    /// Time without an edge after which the wheel reads as stopped
    pub stale_after_us: u32,
    /// Bound each half-period speed by the time since its last edge
    pub interval_decay: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            debounce_us: 10_000,
            stale_after_us: 1_000_000,
            interval_decay: false,
        }
    }
}

impl EncoderConfig {
    /// Set the debounce interval
    pub fn with_debounce_us(mut self, us: u32) -> Self {
        self.debounce_us = us;
        self
    }

    /// Set the staleness threshold
    pub fn with_stale_after_us(mut self, us: u32) -> Self {
        self.stale_after_us = us;
        self
    }

    /// Enable or disable interval-bound decay
    pub fn with_interval_decay(mut self, enabled: bool) -> Self {
        self.interval_decay = enabled;
        self
    }
}

// ============================================================================
// PID Config
// ============================================================================

/// Velocity controller configuration
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidConfig {
    /// Initial gains
    pub gains: Gains,
    /// Symmetric clamp on the integral accumulator
    pub integral_limit: f32,
    /// Upper clamp on the control signal (lower clamp is always 0)
    pub output_max: f32,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            gains: Gains::default(),
            integral_limit: 255.0,
            output_max: 255.0,
        }
    }
}

impl PidConfig {
    /// Set the initial gains
    pub fn with_gains(mut self, gains: Gains) -> Self {
        self.gains = gains;
        self
    }

    /// Set the integral clamp
    pub fn with_integral_limit(mut self, limit: f32) -> Self {
        self.integral_limit = limit;
        self
    }

    /// Set the output clamp, limited to the 8-bit duty range
    pub fn with_output_max(mut self, max: f32) -> Self {
        self.output_max = max.clamp(0.0, 255.0);
        self
    }
}

// ============================================================================
// Actuator Config
// ============================================================================

/// Pin pattern used when the wheel is not driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StopMode {
    /// Both direction pins low.
    #[default]
    Coast,
    /// Both direction pins high.
    Brake,
}

impl StopMode {
    /// The H-bridge pattern for this stop mode.
    #[inline]
    pub const fn drive_mode(self) -> DriveMode {
        match self {
            StopMode::Coast => DriveMode::Coast,
            StopMode::Brake => DriveMode::Brake,
        }
    }
}

/// H-bridge actuation configuration
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActuatorConfig {
    /// Targets slower than this (ticks/s) are treated as stop
    pub min_feasible_speed: f32,
    /// Stop discipline
    pub stop_mode: StopMode,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            min_feasible_speed: 4.0,
            stop_mode: StopMode::Coast,
        }
    }
}

impl ActuatorConfig {
    /// Set the minimum feasible target speed
    pub fn with_min_feasible_speed(mut self, speed: f32) -> Self {
        self.min_feasible_speed = speed;
        self
    }

    /// Set the stop discipline
    pub fn with_stop_mode(mut self, mode: StopMode) -> Self {
        self.stop_mode = mode;
        self
    }
}

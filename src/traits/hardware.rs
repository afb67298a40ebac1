//! Hardware abstraction traits for the H-bridge output and the time source.
//!
//! This module defines the hardware interfaces that let the drivetrain core
//! run on different platforms (ESP32, any `embedded-hal` board, desktop mocks).
//!
//! # Key Types
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`HBridge`] | Two direction pins + one PWM pin, written together |
//! | [`Clock`] | Monotonic microsecond time source |
//! | [`DriveMode`] | H-bridge direction pin pattern |
//! | [`DriveCommand`] | Pin pattern plus duty cycle |
//! | [`Polarity`] | Encoder edge polarity |
//!
//! # Example
//!
//! ```rust
//! use rs_drivetrain::traits::{DriveCommand, DriveMode, HBridge};
//! use rs_drivetrain::hal::MockBridge;
//!
//! let mut bridge = MockBridge::new();
//! bridge.write(DriveCommand::new(DriveMode::Forward, 120)).unwrap();
//!
//! assert_eq!(bridge.pins(), (true, false));
//! assert_eq!(bridge.duty, 120);
//! ```

/// Polarity of an encoder signal transition.
///
/// Rising and falling edges are tracked independently so that an encoder
/// with an asymmetric duty cycle still yields an unbiased speed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Polarity {
    /// Low-to-high transition.
    Rising,
    /// High-to-low transition.
    Falling,
}

impl Polarity {
    /// Returns the polarity of the edge that left the pin at `level`.
    ///
    /// ```
    /// use rs_drivetrain::traits::Polarity;
    ///
    /// assert_eq!(Polarity::from_level(true), Polarity::Rising);
    /// assert_eq!(Polarity::from_level(false), Polarity::Falling);
    /// ```
    #[inline]
    pub const fn from_level(high: bool) -> Self {
        if high {
            Polarity::Rising
        } else {
            Polarity::Falling
        }
    }

    /// Slot index used for per-polarity state.
    #[inline]
    pub(crate) const fn index(self) -> usize {
        match self {
            Polarity::Rising => 0,
            Polarity::Falling => 1,
        }
    }
}

/// Direction pin pattern of a dual H-bridge channel.
///
/// | Mode | IN1 | IN2 |
/// |------|-----|-----|
/// | [`Forward`](Self::Forward) | high | low |
/// | [`Reverse`](Self::Reverse) | low | high |
/// | [`Coast`](Self::Coast) | low | low |
/// | [`Brake`](Self::Brake) | high | high |
///
/// # Default
///
/// Defaults to [`Coast`](Self::Coast) for safety.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DriveMode {
    /// Wheel driven forward.
    Forward,
    /// Wheel driven backward.
    Reverse,
    /// Both outputs floating, the wheel freewheels.
    #[default]
    Coast,
    /// Both outputs shorted, the wheel is actively braked.
    Brake,
}

impl DriveMode {
    /// Returns the `(IN1, IN2)` levels for this mode.
    ///
    /// ```
    /// use rs_drivetrain::traits::DriveMode;
    ///
    /// assert_eq!(DriveMode::Forward.pins(), (true, false));
    /// assert_eq!(DriveMode::Reverse.pins(), (false, true));
    /// assert_eq!(DriveMode::Coast.pins(), (false, false));
    /// assert_eq!(DriveMode::Brake.pins(), (true, true));
    /// ```
    #[inline]
    pub const fn pins(self) -> (bool, bool) {
        match self {
            DriveMode::Forward => (true, false),
            DriveMode::Reverse => (false, true),
            DriveMode::Coast => (false, false),
            DriveMode::Brake => (true, true),
        }
    }

    /// Returns true for the two patterns that move the wheel.
    #[inline]
    pub const fn is_driving(self) -> bool {
        matches!(self, DriveMode::Forward | DriveMode::Reverse)
    }

    /// Returns the mode as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DriveMode::Forward => "forward",
            DriveMode::Reverse => "reverse",
            DriveMode::Coast => "coast",
            DriveMode::Brake => "brake",
        }
    }
}

/// A complete H-bridge output: pin pattern and PWM duty.
///
/// Both parts are always handed to the hardware together through
/// [`HBridge::write`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriveCommand {
    /// Direction pin pattern.
    pub mode: DriveMode,
    /// PWM duty cycle, 0-255.
    pub duty: u8,
}

impl DriveCommand {
    /// Creates a command. Non-driving modes always carry zero duty.
    ///
    /// ```
    /// use rs_drivetrain::traits::{DriveCommand, DriveMode};
    ///
    /// assert_eq!(DriveCommand::new(DriveMode::Brake, 200).duty, 0);
    /// assert_eq!(DriveCommand::new(DriveMode::Reverse, 200).duty, 200);
    /// ```
    #[inline]
    pub const fn new(mode: DriveMode, duty: u8) -> Self {
        let duty = if mode.is_driving() { duty } else { 0 };
        Self { mode, duty }
    }

    /// A stop command using the given pattern.
    #[inline]
    pub const fn stopped(mode: DriveMode) -> Self {
        Self { mode, duty: 0 }
    }

    /// Level of the first direction pin.
    #[inline]
    pub const fn in1(&self) -> bool {
        self.mode.pins().0
    }

    /// Level of the second direction pin.
    #[inline]
    pub const fn in2(&self) -> bool {
        self.mode.pins().1
    }
}

/// H-bridge output trait - two direction pins and one PWM pin per wheel.
///
/// Implement this for your motor driver. A single [`write`](Self::write)
/// call carries the pin pattern and the duty so an implementation can apply
/// them without exposing a state where they disagree.
///
/// # Implementation Notes
///
/// - When the pattern changes between driving directions, drop the PWM to 0
///   before switching the pins, then raise it.
/// - `duty` is already in 0-255; scale it to the timer resolution.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use rs_drivetrain::traits::{DriveCommand, HBridge};
///
/// struct MyBridge { /* pin handles */ }
///
/// impl HBridge for MyBridge {
///     type Error = ();
///
///     fn write(&mut self, cmd: DriveCommand) -> Result<(), ()> {
///         // set IN1/IN2 from cmd.in1()/cmd.in2(), PWM from cmd.duty
///         Ok(())
///     }
/// }
/// ```
pub trait HBridge {
    /// Error type for pin writes.
    type Error;

    /// Apply the pin pattern and duty cycle.
    fn write(&mut self, cmd: DriveCommand) -> Result<(), Self::Error>;

    /// Convenience method to let the wheel freewheel.
    fn coast(&mut self) -> Result<(), Self::Error> {
        self.write(DriveCommand::stopped(DriveMode::Coast))
    }
}

/// Monotonic microsecond time source.
///
/// Readings are a free-running 32-bit counter; consumers compare them with
/// wrapping subtraction, so a rollover between two nearby readings is
/// harmless.
///
/// # Example
///
/// ```rust
/// use rs_drivetrain::traits::Clock;
/// use rs_drivetrain::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_us(), 0);
///
/// clock.advance_ms(5);
/// assert_eq!(clock.now_us(), 5_000);
/// ```
pub trait Clock {
    /// Returns current time in microseconds since an arbitrary epoch.
    fn now_us(&self) -> u32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_mode_default_is_coast() {
        assert_eq!(DriveMode::default(), DriveMode::Coast);
    }

    #[test]
    fn drive_mode_driving() {
        assert!(DriveMode::Forward.is_driving());
        assert!(DriveMode::Reverse.is_driving());
        assert!(!DriveMode::Coast.is_driving());
        assert!(!DriveMode::Brake.is_driving());
    }

    #[test]
    fn drive_mode_as_str() {
        assert_eq!(DriveMode::Forward.as_str(), "forward");
        assert_eq!(DriveMode::Brake.as_str(), "brake");
    }

    #[test]
    fn drive_command_pins_follow_mode() {
        let cmd = DriveCommand::new(DriveMode::Reverse, 120);
        assert!(!cmd.in1());
        assert!(cmd.in2());
        assert_eq!(cmd.duty, 120);
    }

    #[test]
    fn drive_command_stop_patterns_zero_duty() {
        assert_eq!(DriveCommand::new(DriveMode::Coast, 255).duty, 0);
        assert_eq!(DriveCommand::stopped(DriveMode::Brake).duty, 0);
        assert_eq!(DriveCommand::default(), DriveCommand::stopped(DriveMode::Coast));
    }

    #[test]
    fn polarity_index_distinct() {
        assert_ne!(Polarity::Rising.index(), Polarity::Falling.index());
    }

    // =========================================================================
    // HBridge Default Methods Tests
    // =========================================================================

    struct TestBridge {
        last: Option<DriveCommand>,
    }

    impl HBridge for TestBridge {
        type Error = ();

        fn write(&mut self, cmd: DriveCommand) -> Result<(), ()> {
            self.last = Some(cmd);
            Ok(())
        }
    }

    #[test]
    fn hbridge_coast_default_impl() {
        let mut bridge = TestBridge { last: None };
        bridge.write(DriveCommand::new(DriveMode::Forward, 90)).unwrap();
        bridge.coast().unwrap();

        let last = bridge.last.unwrap();
        assert_eq!(last.mode, DriveMode::Coast);
        assert_eq!(last.duty, 0);
    }
}

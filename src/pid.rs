//! Discrete-time PID velocity controller.
//!
//! [`VelocityPid`] drives a measured wheel speed toward the magnitude of a
//! signed target and produces an unsigned control signal in `[0, 255]`.
//! Direction is not its concern; the actuator takes it from the target's
//! sign.
//!
//! # Update
//!
//! Each call to [`update`](VelocityPid::update) with the measured elapsed
//! time `dt`:
//!
//! ```text
//! error      = |target| - measured
//! integral   = clamp(integral + error * dt, -limit, limit)
//! derivative = (error - previous_error) / dt
//! signal     = clamp(kp * error + ki * integral + kd * derivative, 0, output_max)
//! ```
//!
//! A `dt` that is zero, negative or not finite skips the update and holds
//! the previous signal.
//!
//! # Live tuning
//!
//! Changing `ki` zeroes the integral and changing `kd` zeroes the previous
//! error, so a retune does not replay history accumulated under the old
//! gain. Gains are not range-checked, but an output that comes out NaN or
//! infinite is forced to 0, so the signal never leaves `[0, output_max]`.
//!
//! # Example
//!
//! ```rust
//! use rs_drivetrain::pid::{Gains, PidUpdate, VelocityPid};
//! use rs_drivetrain::config::PidConfig;
//!
//! let mut pid = VelocityPid::new(PidConfig::default().with_gains(Gains::new(2.0, 0.0, 0.0)));
//!
//! // Reverse target: only the magnitude matters here
//! let outcome = pid.update(-50.0, 20.0, 0.2);
//! assert_eq!(outcome.signal(), 60.0);
//!
//! // A zero-length tick is skipped
//! assert!(matches!(pid.update(-50.0, 20.0, 0.0), PidUpdate::Skipped { .. }));
//! assert_eq!(pid.signal(), 60.0);
//! ```

use libm::fabsf;
use log::warn;

use crate::config::PidConfig;

/// Proportional, integral and derivative gains.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gains {
    /// Proportional gain.
    pub kp: f32,
    /// Integral gain.
    pub ki: f32,
    /// Derivative gain.
    pub kd: f32,
}

impl Gains {
    /// Creates a gain set.
    pub const fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self { kp, ki, kd }
    }
}

impl Default for Gains {
    /// Pure proportional control with unit gain.
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }
}

/// Per-term contributions to the last applied update, gains included.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidTerms {
    /// `kp * error`
    pub proportional: f32,
    /// `ki * integral`
    pub integral: f32,
    /// `kd * derivative`
    pub derivative: f32,
}

impl PidTerms {
    /// Sum of the three contributions before clamping.
    #[inline]
    pub fn total(&self) -> f32 {
        self.proportional + self.integral + self.derivative
    }
}

/// Why an update was skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SkipReason {
    /// Elapsed time was zero or negative.
    NonPositiveElapsed,
    /// Elapsed time was NaN or infinite.
    NonFiniteElapsed,
    /// The wheel's encoder went stale while it was driven and the controller
    /// was reset instead.
    Stalled,
}

/// Result of a controller update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PidUpdate {
    /// The controller ran.
    Applied {
        /// New control signal in `[0, output_max]`.
        signal: f32,
        /// Term breakdown.
        terms: PidTerms,
        /// True if the raw output was clamped.
        saturated: bool,
    },
    /// The controller did not run; the previous signal is held, or zero
    /// after a stall reset.
    Skipped {
        /// The held signal.
        signal: f32,
        /// Why the update was skipped.
        reason: SkipReason,
    },
}

impl PidUpdate {
    /// The control signal after this update.
    #[inline]
    pub fn signal(&self) -> f32 {
        match *self {
            PidUpdate::Applied { signal, .. } | PidUpdate::Skipped { signal, .. } => signal,
        }
    }

    /// Returns true if the controller ran.
    #[inline]
    pub fn is_applied(&self) -> bool {
        matches!(self, PidUpdate::Applied { .. })
    }
}

/// PID controller for one wheel's speed.
#[derive(Clone, Debug)]
pub struct VelocityPid {
    gains: Gains,
    integral: f32,
    previous_error: f32,
    signal: f32,
    last_terms: PidTerms,
    integral_limit: f32,
    output_max: f32,
}

impl VelocityPid {
    /// Creates a controller with zeroed memory.
    ///
    /// A non-finite integral limit or output limit falls back to 255.
    pub fn new(config: PidConfig) -> Self {
        Self {
            gains: config.gains,
            integral: 0.0,
            previous_error: 0.0,
            signal: 0.0,
            last_terms: PidTerms::default(),
            integral_limit: finite_limit(fabsf(config.integral_limit), "integral"),
            output_max: finite_limit(config.output_max, "output").clamp(0.0, 255.0),
        }
    }

    /// Runs one controller step.
    ///
    /// `elapsed_s` must be the measured time since the previous step.
    pub fn update(&mut self, target_speed: f32, measured_speed: f32, elapsed_s: f32) -> PidUpdate {
        if !elapsed_s.is_finite() {
            warn!("PID update skipped: elapsed time {} is not finite", elapsed_s);
            return self.skipped(SkipReason::NonFiniteElapsed);
        }
        if elapsed_s <= 0.0 {
            warn!("PID update skipped: elapsed time {}s", elapsed_s);
            return self.skipped(SkipReason::NonPositiveElapsed);
        }

        let error = fabsf(target_speed) - measured_speed;

        self.integral =
            (self.integral + error * elapsed_s).clamp(-self.integral_limit, self.integral_limit);

        let derivative = (error - self.previous_error) / elapsed_s;
        self.previous_error = error;

        let terms = PidTerms {
            proportional: self.gains.kp * error,
            integral: self.gains.ki * self.integral,
            derivative: self.gains.kd * derivative,
        };
        let raw = terms.total();
        let signal = if raw.is_finite() {
            raw.clamp(0.0, self.output_max)
        } else {
            warn!("PID output {} is not finite, forcing 0", raw);
            0.0
        };

        self.signal = signal;
        self.last_terms = terms;

        PidUpdate::Applied {
            signal,
            terms,
            saturated: raw != signal,
        }
    }

    fn skipped(&self, reason: SkipReason) -> PidUpdate {
        PidUpdate::Skipped {
            signal: self.signal,
            reason,
        }
    }

    /// Sets the proportional gain. No controller memory is touched.
    pub fn set_kp(&mut self, kp: f32) {
        self.gains.kp = kp;
    }

    /// Sets the integral gain and zeroes the integral accumulator.
    pub fn set_ki(&mut self, ki: f32) {
        self.gains.ki = ki;
        self.integral = 0.0;
    }

    /// Sets the derivative gain and zeroes the previous error.
    pub fn set_kd(&mut self, kd: f32) {
        self.gains.kd = kd;
        self.previous_error = 0.0;
    }

    /// Replaces all three gains at once, resetting the memory of each term
    /// whose gain changed.
    pub fn set_gains(&mut self, gains: Gains) {
        let old = self.gains;
        self.gains = gains;
        if gains.ki != old.ki {
            self.integral = 0.0;
        }
        if gains.kd != old.kd {
            self.previous_error = 0.0;
        }
    }

    /// Zeroes the integral, previous error and output.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
        self.signal = 0.0;
        self.last_terms = PidTerms::default();
    }

    /// Current gains.
    #[inline]
    pub fn gains(&self) -> Gains {
        self.gains
    }

    /// Last control signal.
    #[inline]
    pub fn signal(&self) -> f32 {
        self.signal
    }

    /// Integral accumulator.
    #[inline]
    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// Error from the last applied update.
    #[inline]
    pub fn previous_error(&self) -> f32 {
        self.previous_error
    }

    /// Term breakdown from the last applied update.
    #[inline]
    pub fn last_terms(&self) -> PidTerms {
        self.last_terms
    }
}

fn finite_limit(limit: f32, what: &str) -> f32 {
    if limit.is_finite() {
        limit
    } else {
        warn!("PID {} limit {} is not finite, using 255", what, limit);
        255.0
    }
}

impl Default for VelocityPid {
    fn default() -> Self {
        Self::new(PidConfig::default())
    }
}

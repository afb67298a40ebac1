//! One wheel: encoder estimate, velocity controller and H-bridge together.
//!
//! [`WheelUnit`] is the per-wheel control loop. It borrows the wheel's
//! [`SpeedEstimator`] (which the edge interrupt also holds) and owns the
//! controller and the actuator.
//!
//! Each [`tick`](WheelUnit::tick):
//!
//! 1. Reads the measured speed from the estimator.
//! 2. If the target is not feasible (zero, or slower than the actuator's
//!    minimum), resets the controller so no stale integral survives an idle
//!    period.
//! 3. If the encoder has just gone stale while the wheel is driven, resets
//!    the controller once and outputs zero for this tick. Windup gathered
//!    while the wheel was turning does not carry into the stall.
//! 4. Otherwise runs one controller update with the given elapsed time.
//! 5. Writes the resulting command to the bridge.
//!
//! A wheel that stays stalled is driven again from the next tick, with the
//! integral building up from standstill.
//!
//! # Example
//!
//! ```rust
//! use rs_drivetrain::config::WheelConfig;
//! use rs_drivetrain::encoder::SpeedEstimator;
//! use rs_drivetrain::hal::MockBridge;
//! use rs_drivetrain::traits::DriveMode;
//! use rs_drivetrain::WheelUnit;
//!
//! let encoder = SpeedEstimator::new();
//! let mut wheel = WheelUnit::new(&encoder, MockBridge::new(), &WheelConfig::left());
//!
//! wheel.set_target_speed(50.0);
//! let report = wheel.tick(0, 0.2).unwrap();
//! assert_eq!(report.command.mode, DriveMode::Forward);
//!
//! wheel.set_target_speed(0.0);
//! let report = wheel.tick(200_000, 0.2).unwrap();
//! assert_eq!(report.command.mode, DriveMode::Coast);
//! assert_eq!(wheel.control_signal(), 0.0);
//! ```

use log::{debug, info, warn};

use crate::actuator::Actuator;
use crate::config::{ShortString, WheelConfig};
use crate::encoder::SpeedEstimator;
use crate::pid::{Gains, PidTerms, PidUpdate, SkipReason, VelocityPid};
use crate::traits::{DriveCommand, HBridge};

/// What one control tick did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    /// Speed read from the estimator, ticks/s.
    pub measured_speed: f32,
    /// Controller outcome, `None` when the wheel was idle.
    pub pid: Option<PidUpdate>,
    /// Command written to the bridge.
    pub command: DriveCommand,
}

impl TickReport {
    /// Returns true if the wheel was idle this tick.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.pid.is_none()
    }
}

/// Per-wheel control loop.
pub struct WheelUnit<'a, H: HBridge> {
    name: ShortString,
    encoder: &'a SpeedEstimator,
    pid: VelocityPid,
    actuator: Actuator<H>,
    target_speed: f32,
    idle: bool,
    saturated: bool,
    /// Estimator staleness seen on the previous tick.
    encoder_stale: bool,
}

impl<'a, H: HBridge> WheelUnit<'a, H> {
    /// Creates a wheel unit.
    ///
    /// The estimator is built separately (usually as a `static`) from
    /// `config.encoder` so the edge interrupt can hold it as well.
    pub fn new(encoder: &'a SpeedEstimator, bridge: H, config: &WheelConfig) -> Self {
        info!(
            "{} wheel: kp={} ki={} kd={} stop={:?}",
            config.name.as_str(),
            config.pid.gains.kp,
            config.pid.gains.ki,
            config.pid.gains.kd,
            config.actuator.stop_mode
        );
        Self {
            name: config.name.clone(),
            encoder,
            pid: VelocityPid::new(config.pid),
            actuator: Actuator::new(bridge, config.actuator),
            target_speed: 0.0,
            idle: true,
            saturated: false,
            encoder_stale: true,
        }
    }

    /// Runs one control step.
    ///
    /// `elapsed_s` is the measured time since the previous tick. Only a
    /// bridge write failure is an error.
    pub fn tick(&mut self, now_us: u32, elapsed_s: f32) -> Result<TickReport, H::Error> {
        let measured_speed = self.encoder.current_speed(now_us);
        let stale = self.encoder.is_stale(now_us);
        let went_stale = stale && !self.encoder_stale;
        self.encoder_stale = stale;

        let pid = if self.actuator.is_feasible(self.target_speed) {
            self.idle = false;
            if went_stale {
                debug!("{} wheel stalled, controller reset", self.name.as_str());
                self.pid.reset();
                self.saturated = false;
                Some(PidUpdate::Skipped {
                    signal: self.pid.signal(),
                    reason: SkipReason::Stalled,
                })
            } else {
                let update = self.pid.update(self.target_speed, measured_speed, elapsed_s);
                if let PidUpdate::Applied { saturated, .. } = update {
                    self.saturated = saturated;
                }
                Some(update)
            }
        } else {
            if !self.idle {
                debug!("{} wheel idle, controller reset", self.name.as_str());
                self.idle = true;
            }
            self.pid.reset();
            self.saturated = false;
            None
        };

        let command = self.actuator.apply(self.target_speed, self.pid.signal())?;

        Ok(TickReport {
            measured_speed,
            pid,
            command,
        })
    }

    /// Sets the signed target speed in ticks/s. Takes effect on the next
    /// tick. A non-finite target is treated as zero.
    pub fn set_target_speed(&mut self, target: f32) {
        let target = if target.is_finite() {
            target
        } else {
            warn!("{} wheel: ignoring non-finite target {}", self.name.as_str(), target);
            0.0
        };
        debug!("{} wheel target {}", self.name.as_str(), target);
        self.target_speed = target;
    }

    /// Sets the proportional gain.
    pub fn set_kp(&mut self, kp: f32) {
        debug!("{} wheel kp={}", self.name.as_str(), kp);
        self.pid.set_kp(kp);
    }

    /// Sets the integral gain, zeroing the integral.
    pub fn set_ki(&mut self, ki: f32) {
        debug!("{} wheel ki={}", self.name.as_str(), ki);
        self.pid.set_ki(ki);
    }

    /// Sets the derivative gain, zeroing the previous error.
    pub fn set_kd(&mut self, kd: f32) {
        debug!("{} wheel kd={}", self.name.as_str(), kd);
        self.pid.set_kd(kd);
    }

    /// Replaces all gains at once.
    pub fn set_gains(&mut self, gains: Gains) {
        debug!(
            "{} wheel gains kp={} ki={} kd={}",
            self.name.as_str(),
            gains.kp,
            gains.ki,
            gains.kd
        );
        self.pid.set_gains(gains);
    }

    /// Zeroes the target, resets the controller and writes the stop pattern.
    pub fn stop(&mut self) -> Result<(), H::Error> {
        self.target_speed = 0.0;
        self.idle = true;
        self.saturated = false;
        self.pid.reset();
        self.actuator.stop()
    }

    /// Snapshot for telemetry.
    pub fn state(&self, now_us: u32) -> WheelState {
        WheelState {
            name: self.name.clone(),
            target_speed: self.target_speed,
            measured_speed: self.encoder.current_speed(now_us),
            stale: self.encoder.is_stale(now_us),
            control_signal: self.pid.signal(),
            saturated: self.saturated,
            gains: self.pid.gains(),
            integral: self.pid.integral(),
            terms: self.pid.last_terms(),
            command: self.actuator.last_command(),
        }
    }

    /// Wheel name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Current signed target.
    #[inline]
    pub fn target_speed(&self) -> f32 {
        self.target_speed
    }

    /// Last control signal.
    #[inline]
    pub fn control_signal(&self) -> f32 {
        self.pid.signal()
    }

    /// Current gains.
    #[inline]
    pub fn gains(&self) -> Gains {
        self.pid.gains()
    }

    /// The controller.
    pub fn pid(&self) -> &VelocityPid {
        &self.pid
    }

    /// The estimator this unit reads.
    pub fn encoder(&self) -> &'a SpeedEstimator {
        self.encoder
    }

    /// The actuator.
    pub fn actuator(&self) -> &Actuator<H> {
        &self.actuator
    }

    /// The actuator, mutably.
    pub fn actuator_mut(&mut self) -> &mut Actuator<H> {
        &mut self.actuator
    }
}

/// Telemetry snapshot of one wheel.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WheelState {
    /// Wheel name.
    pub name: ShortString,
    /// Signed target, ticks/s.
    pub target_speed: f32,
    /// Measured speed magnitude, ticks/s.
    pub measured_speed: f32,
    /// True if the estimator has no fresh edges.
    pub stale: bool,
    /// Control signal in `[0, 255]`.
    pub control_signal: f32,
    /// True if the last applied update was clamped.
    pub saturated: bool,
    /// Current gains.
    pub gains: Gains,
    /// Integral accumulator.
    pub integral: f32,
    /// Term breakdown of the last applied update.
    pub terms: PidTerms,
    /// Last command written to the bridge.
    pub command: DriveCommand,
}

//! Two-wheel drivetrain with fixed-period tick scheduling.
//!
//! [`Drivetrain`] owns a left and a right [`WheelUnit`] and decides when to
//! tick them. Call [`poll`](Drivetrain::poll) from the main loop as often as
//! you like; it runs both wheels once per control period and passes each the
//! real elapsed time since the previous tick, not the nominal period.
//!
//! # Example
//!
//! ```rust
//! use rs_drivetrain::{Config, Drivetrain, WheelSide};
//! use rs_drivetrain::encoder::SpeedEstimator;
//! use rs_drivetrain::hal::MockBridge;
//!
//! let config = Config::default();
//! let left = SpeedEstimator::with_config(config.left.encoder);
//! let right = SpeedEstimator::with_config(config.right.encoder);
//!
//! let mut drivetrain =
//!     Drivetrain::new(&left, MockBridge::new(), &right, MockBridge::new(), &config);
//! drivetrain.set_target_speeds(40.0, -40.0);
//!
//! assert!(drivetrain.poll(0).unwrap().is_some());
//! assert!(drivetrain.poll(100_000).unwrap().is_none()); // not due yet
//! let tick = drivetrain.poll(210_000).unwrap().unwrap();
//! assert_eq!(tick.elapsed_s, 0.21);
//!
//! assert_eq!(drivetrain.wheel(WheelSide::Right).target_speed(), -40.0);
//! ```

use log::info;

use crate::config::Config;
use crate::encoder::SpeedEstimator;
use crate::pid::Gains;
use crate::timing::{Interval, Stopwatch, MICROS_PER_SEC};
use crate::traits::HBridge;
use crate::wheel::{TickReport, WheelState, WheelUnit};

/// Selects one wheel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WheelSide {
    /// Left wheel.
    Left,
    /// Right wheel.
    Right,
}

impl WheelSide {
    /// Both sides, left first.
    pub const ALL: [WheelSide; 2] = [WheelSide::Left, WheelSide::Right];

    /// Lowercase name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            WheelSide::Left => "left",
            WheelSide::Right => "right",
        }
    }
}

/// Result of a poll that ran a control tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrivetrainTick {
    /// Elapsed time passed to both wheels, in seconds.
    pub elapsed_s: f32,
    /// Left wheel report.
    pub left: TickReport,
    /// Right wheel report.
    pub right: TickReport,
}

/// Telemetry snapshot of both wheels.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DrivetrainState {
    /// Left wheel.
    pub left: WheelState,
    /// Right wheel.
    pub right: WheelState,
}

/// Left and right wheel units plus the control tick schedule.
pub struct Drivetrain<'a, H: HBridge> {
    left: WheelUnit<'a, H>,
    right: WheelUnit<'a, H>,
    interval: Interval,
    stopwatch: Stopwatch,
}

impl<'a, H: HBridge> Drivetrain<'a, H> {
    /// Builds both wheel units from `config`.
    pub fn new(
        left_encoder: &'a SpeedEstimator,
        left_bridge: H,
        right_encoder: &'a SpeedEstimator,
        right_bridge: H,
        config: &Config,
    ) -> Self {
        Self::from_units(
            WheelUnit::new(left_encoder, left_bridge, &config.left),
            WheelUnit::new(right_encoder, right_bridge, &config.right),
            config.control_period_ms,
        )
    }

    /// Wraps two already-built units.
    pub fn from_units(left: WheelUnit<'a, H>, right: WheelUnit<'a, H>, control_period_ms: u32) -> Self {
        info!("drivetrain: control period {} ms", control_period_ms);
        Self {
            left,
            right,
            interval: Interval::from_ms(control_period_ms),
            stopwatch: Stopwatch::new(),
        }
    }

    /// Runs a control tick on both wheels if one is due.
    ///
    /// The first tick has no previous tick to measure against and uses the
    /// nominal period. Returns `Ok(None)` when no tick was due.
    pub fn poll(&mut self, now_us: u32) -> Result<Option<DrivetrainTick>, H::Error> {
        if !self.interval.is_due(now_us) {
            return Ok(None);
        }
        let elapsed_s = self
            .stopwatch
            .lap_secs(now_us)
            .unwrap_or_else(|| self.nominal_period_s());

        let left = self.left.tick(now_us, elapsed_s)?;
        let right = self.right.tick(now_us, elapsed_s)?;

        Ok(Some(DrivetrainTick {
            elapsed_s,
            left,
            right,
        }))
    }

    /// Nominal control period in seconds.
    pub fn nominal_period_s(&self) -> f32 {
        self.interval.period_us() as f32 / MICROS_PER_SEC as f32
    }

    /// Sets both signed targets.
    pub fn set_target_speeds(&mut self, left: f32, right: f32) {
        self.left.set_target_speed(left);
        self.right.set_target_speed(right);
    }

    /// Applies the same gains to both wheels.
    pub fn set_gains(&mut self, gains: Gains) {
        self.left.set_gains(gains);
        self.right.set_gains(gains);
    }

    /// Stops both wheels. The schedule restarts on the next poll.
    pub fn stop(&mut self) -> Result<(), H::Error> {
        self.left.stop()?;
        self.right.stop()?;
        self.interval.reset();
        self.stopwatch.reset();
        Ok(())
    }

    /// Snapshot of both wheels.
    pub fn state(&self, now_us: u32) -> DrivetrainState {
        DrivetrainState {
            left: self.left.state(now_us),
            right: self.right.state(now_us),
        }
    }

    /// One wheel.
    pub fn wheel(&self, side: WheelSide) -> &WheelUnit<'a, H> {
        match side {
            WheelSide::Left => &self.left,
            WheelSide::Right => &self.right,
        }
    }

    /// One wheel, mutably, for per-wheel targets and tuning.
    pub fn wheel_mut(&mut self, side: WheelSide) -> &mut WheelUnit<'a, H> {
        match side {
            WheelSide::Left => &mut self.left,
            WheelSide::Right => &mut self.right,
        }
    }

    /// Left wheel.
    pub fn left(&self) -> &WheelUnit<'a, H> {
        &self.left
    }

    /// Right wheel.
    pub fn right(&self) -> &WheelUnit<'a, H> {
        &self.right
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockBridge;
    use crate::traits::DriveMode;

    #[test]
    fn first_poll_uses_nominal_period() {
        let (l, r) = (SpeedEstimator::new(), SpeedEstimator::new());
        let mut dt = Drivetrain::new(&l, MockBridge::new(), &r, MockBridge::new(), &Config::default());
        assert_eq!(dt.nominal_period_s(), 0.2);

        let tick = dt.poll(5_000).unwrap().unwrap();
        assert_eq!(tick.elapsed_s, 0.2);
        assert!(tick.left.is_idle());
        assert!(tick.right.is_idle());
    }

    #[test]
    fn polls_once_per_period() {
        let (l, r) = (SpeedEstimator::new(), SpeedEstimator::new());
        let mut dt = Drivetrain::new(&l, MockBridge::new(), &r, MockBridge::new(), &Config::default());

        let ran: usize = (0..=10u32)
            .map(|i| dt.poll(i * 100_000).unwrap().is_some() as usize)
            .sum();
        // 0, 200, 400, 600, 800, 1000 ms
        assert_eq!(ran, 6);
    }

    #[test]
    fn elapsed_is_measured() {
        let (l, r) = (SpeedEstimator::new(), SpeedEstimator::new());
        let mut dt = Drivetrain::new(&l, MockBridge::new(), &r, MockBridge::new(), &Config::default());
        dt.poll(0).unwrap();

        let tick = dt.poll(250_000).unwrap().unwrap();
        assert_eq!(tick.elapsed_s, 0.25);
    }

    #[test]
    fn wheels_are_independent() {
        let (l, r) = (SpeedEstimator::new(), SpeedEstimator::new());
        let mut dt = Drivetrain::new(&l, MockBridge::new(), &r, MockBridge::new(), &Config::default());
        dt.set_target_speeds(30.0, -60.0);
        dt.wheel_mut(WheelSide::Left).set_kp(2.0);

        let tick = dt.poll(0).unwrap().unwrap();
        assert_eq!(tick.left.command.mode, DriveMode::Forward);
        assert_eq!(tick.left.command.duty, 60);
        assert_eq!(tick.right.command.mode, DriveMode::Reverse);
        assert_eq!(tick.right.command.duty, 60);
        assert_eq!(dt.right().gains().kp, 1.0);
    }

    #[test]
    fn stop_halts_both_and_restarts_schedule() {
        let (l, r) = (SpeedEstimator::new(), SpeedEstimator::new());
        let mut dt = Drivetrain::new(&l, MockBridge::new(), &r, MockBridge::new(), &Config::default());
        dt.set_target_speeds(50.0, 50.0);
        dt.poll(0).unwrap();

        dt.stop().unwrap();
        let state = dt.state(10_000);
        assert_eq!(state.left.command.mode, DriveMode::Coast);
        assert_eq!(state.right.command.mode, DriveMode::Coast);
        assert_eq!(state.left.target_speed, 0.0);

        // Due immediately after a stop
        assert!(dt.poll(10_000).unwrap().is_some());
    }

    #[test]
    fn side_names() {
        assert_eq!(WheelSide::ALL.map(|s| s.as_str()), ["left", "right"]);
    }
}

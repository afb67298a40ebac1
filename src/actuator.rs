//! Maps a signed target and an unsigned control signal onto an H-bridge.
//!
//! | Condition | Pattern | PWM |
//! |-----------|---------|-----|
//! | `target == 0`, `|target| < min_feasible_speed`, or signal rounds to 0 | stop ([`StopMode`]) | 0 |
//! | `target > 0` | forward (IN1 high, IN2 low) | signal |
//! | `target < 0` | reverse (IN1 low, IN2 high) | signal |
//!
//! The pattern and duty always reach the hardware in a single
//! [`HBridge::write`]. When the wheel is commanded straight from one
//! direction to the other, the actuator first writes the stop pattern so the
//! PWM is never applied through the old pattern with the new duty.
//!
//! # Example
//!
//! ```rust
//! use rs_drivetrain::actuator::Actuator;
//! use rs_drivetrain::config::ActuatorConfig;
//! use rs_drivetrain::hal::MockBridge;
//! use rs_drivetrain::traits::DriveMode;
//!
//! let mut actuator = Actuator::new(MockBridge::new(), ActuatorConfig::default());
//!
//! let cmd = actuator.apply(-50.0, 120.0).unwrap();
//! assert_eq!(cmd.mode, DriveMode::Reverse);
//! assert_eq!(cmd.duty, 120);
//! assert_eq!(actuator.bridge().pins(), (false, true));
//! ```

use libm::{fabsf, roundf};

use crate::config::{ActuatorConfig, StopMode};
use crate::traits::{DriveCommand, DriveMode, HBridge};

/// H-bridge driver for one wheel.
pub struct Actuator<H: HBridge> {
    bridge: H,
    min_feasible_speed: f32,
    stop_mode: StopMode,
    last: DriveCommand,
}

impl<H: HBridge> Actuator<H> {
    /// Wraps a bridge. Nothing is written until the first command; call
    /// [`stop`](Self::stop) during bring-up to force a known state.
    pub fn new(bridge: H, config: ActuatorConfig) -> Self {
        Self {
            bridge,
            min_feasible_speed: config.min_feasible_speed,
            stop_mode: config.stop_mode,
            last: DriveCommand::stopped(config.stop_mode.drive_mode()),
        }
    }

    /// Returns true if the wheel can be driven at `target_speed`.
    ///
    /// Zero, NaN and anything slower than the minimum feasible speed are not.
    #[inline]
    pub fn is_feasible(&self, target_speed: f32) -> bool {
        target_speed != 0.0 && fabsf(target_speed) >= self.min_feasible_speed
    }

    /// The command that [`apply`](Self::apply) would write, without writing.
    pub fn command_for(&self, target_speed: f32, control_signal: f32) -> DriveCommand {
        let duty = roundf(control_signal.clamp(0.0, 255.0)) as u8;
        if !self.is_feasible(target_speed) || duty == 0 {
            return self.stop_command();
        }

        let mode = if target_speed > 0.0 {
            DriveMode::Forward
        } else {
            DriveMode::Reverse
        };
        DriveCommand::new(mode, duty)
    }

    /// Maps and writes one command, returning what was written.
    pub fn apply(&mut self, target_speed: f32, control_signal: f32) -> Result<DriveCommand, H::Error> {
        let cmd = self.command_for(target_speed, control_signal);
        self.write(cmd)?;
        Ok(cmd)
    }

    /// Writes the stop pattern with zero duty.
    pub fn stop(&mut self) -> Result<(), H::Error> {
        let cmd = self.stop_command();
        self.write(cmd)
    }

    fn write(&mut self, cmd: DriveCommand) -> Result<(), H::Error> {
        let reversing = self.last.mode.is_driving() && cmd.mode.is_driving() && self.last.mode != cmd.mode;
        if reversing {
            self.bridge.write(self.stop_command())?;
            self.last = self.stop_command();
        }
        self.bridge.write(cmd)?;
        self.last = cmd;
        Ok(())
    }

    #[inline]
    fn stop_command(&self) -> DriveCommand {
        DriveCommand::stopped(self.stop_mode.drive_mode())
    }

    /// The last command written.
    #[inline]
    pub fn last_command(&self) -> DriveCommand {
        self.last
    }

    /// The configured stop discipline.
    #[inline]
    pub fn stop_mode(&self) -> StopMode {
        self.stop_mode
    }

    /// Borrow the underlying bridge.
    #[inline]
    pub fn bridge(&self) -> &H {
        &self.bridge
    }

    /// Mutably borrow the underlying bridge.
    #[inline]
    pub fn bridge_mut(&mut self) -> &mut H {
        &mut self.bridge
    }

    /// Unwraps the bridge.
    pub fn into_inner(self) -> H {
        self.bridge
    }
}

//! Mock implementations for testing without hardware.
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockBridge`] | [`HBridge`] | Records pin patterns and duty writes |
//! | [`MockClock`] | [`Clock`] | Controllable microsecond time source |
//!
//! # Example
//!
//! ```rust
//! use rs_drivetrain::hal::{MockBridge, MockClock};
//! use rs_drivetrain::traits::{Clock, DriveCommand, DriveMode, HBridge};
//!
//! let mut bridge = MockBridge::new();
//! bridge.write(DriveCommand::new(DriveMode::Reverse, 64)).unwrap();
//! assert_eq!(bridge.mode, DriveMode::Reverse);
//! assert_eq!(bridge.history.len(), 1);
//!
//! let mut clock = MockClock::new();
//! clock.advance_us(250);
//! assert_eq!(clock.now_us(), 250);
//! ```
//!
//! [`HBridge`]: crate::traits::HBridge
//! [`Clock`]: crate::traits::Clock

use alloc::vec::Vec;

use crate::traits::{Clock, DriveCommand, DriveMode, HBridge};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock H-bridge for testing.
///
/// Keeps the current pin pattern and duty plus every command written, in
/// order. Set [`fail_writes`](Self::fail_writes) to make writes fail.
#[derive(Debug, Default)]
pub struct MockBridge {
    /// Current pin pattern.
    pub mode: DriveMode,
    /// Current PWM duty.
    pub duty: u8,
    /// Every successful write, oldest first.
    pub history: Vec<DriveCommand>,
    /// When true, writes return `Err(())` and change nothing.
    pub fail_writes: bool,
}

impl MockBridge {
    /// Creates a new mock bridge in the coast state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current `(IN1, IN2)` levels.
    pub fn pins(&self) -> (bool, bool) {
        self.mode.pins()
    }

    /// The most recent successful write.
    pub fn last_write(&self) -> Option<DriveCommand> {
        self.history.last().copied()
    }

    /// Forgets recorded writes, keeping the current state.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

impl HBridge for MockBridge {
    type Error = ();

    fn write(&mut self, cmd: DriveCommand) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        self.mode = cmd.mode;
        self.duty = cmd.duty;
        self.history.push(cmd);
        Ok(())
    }
}

/// Mock clock for testing.
///
/// Wraps on overflow like a hardware microsecond counter.
#[derive(Debug, Default)]
pub struct MockClock {
    current_us: u32,
}

impl MockClock {
    /// Creates a new mock clock starting at 0.
    pub fn new() -> Self {
        Self { current_us: 0 }
    }

    /// Sets the current time in microseconds.
    pub fn set_us(&mut self, us: u32) {
        self.current_us = us;
    }

    /// Advances the clock by the given number of microseconds.
    pub fn advance_us(&mut self, us: u32) {
        self.current_us = self.current_us.wrapping_add(us);
    }

    /// Advances the clock by the given number of milliseconds.
    pub fn advance_ms(&mut self, ms: u32) {
        self.advance_us(ms.wrapping_mul(1000));
    }
}

impl Clock for MockClock {
    fn now_us(&self) -> u32 {
        self.current_us
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_bridge_default() {
        let bridge = MockBridge::new();
        assert_eq!(bridge.mode, DriveMode::Coast);
        assert_eq!(bridge.duty, 0);
        assert!(bridge.history.is_empty());
        assert_eq!(bridge.last_write(), None);
    }

    #[test]
    fn mock_bridge_records_writes() {
        let mut bridge = MockBridge::new();
        bridge.write(DriveCommand::new(DriveMode::Forward, 10)).unwrap();
        bridge.write(DriveCommand::new(DriveMode::Brake, 10)).unwrap();

        assert_eq!(bridge.history.len(), 2);
        assert_eq!(bridge.pins(), (true, true));
        assert_eq!(bridge.duty, 0);
        assert_eq!(bridge.last_write(), Some(DriveCommand::stopped(DriveMode::Brake)));

        bridge.clear_history();
        assert!(bridge.history.is_empty());
        assert_eq!(bridge.mode, DriveMode::Brake);
    }

    #[test]
    fn mock_bridge_fail_writes() {
        let mut bridge = MockBridge::new();
        bridge.fail_writes = true;
        assert_eq!(bridge.write(DriveCommand::new(DriveMode::Forward, 10)), Err(()));
        assert_eq!(bridge.mode, DriveMode::Coast);
        assert!(bridge.history.is_empty());
    }

    #[test]
    fn mock_clock_set_and_advance() {
        let mut clock = MockClock::new();
        assert_eq!(clock.now_us(), 0);
        clock.set_us(1_000);
        clock.advance_ms(2);
        assert_eq!(clock.now_us(), 3_000);
    }

    #[test]
    fn mock_clock_wraps() {
        let mut clock = MockClock::new();
        clock.set_us(u32::MAX);
        clock.advance_us(2);
        assert_eq!(clock.now_us(), 1);
    }
}

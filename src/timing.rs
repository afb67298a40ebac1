//! Timing helpers shared by the encoder and the control loop.
//!
//! All timestamps are `u32` microseconds from a free-running counter (see
//! [`Clock`](crate::traits::Clock)). Differences are taken with wrapping
//! subtraction so a counter rollover between two readings does not matter.
//!
//! # Example
//!
//! ```rust
//! use rs_drivetrain::timing::{Interval, Stopwatch};
//!
//! let mut interval = Interval::from_ms(200);
//! let mut stopwatch = Stopwatch::new();
//!
//! assert!(interval.is_due(0));
//! assert_eq!(stopwatch.lap_secs(0), None); // nothing to measure yet
//!
//! assert!(!interval.is_due(150_000));
//! assert!(interval.is_due(203_000));
//! assert_eq!(stopwatch.lap_secs(203_000), Some(0.203));
//! ```

/// Microseconds per second.
pub const MICROS_PER_SEC: u32 = 1_000_000;

/// Microseconds elapsed from `since` to `now`.
#[inline]
pub const fn elapsed_us(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// Returns true once `now` has reached or passed `deadline`.
///
/// Only meaningful while the two readings are less than ~35 minutes apart.
#[inline]
pub const fn reached(now: u32, deadline: u32) -> bool {
    (now.wrapping_sub(deadline) as i32) >= 0
}

/// Minimum spacing between two accepted events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Debounce {
    interval_us: u32,
}

impl Debounce {
    /// Creates a debounce filter with the given minimum spacing.
    pub const fn new(interval_us: u32) -> Self {
        Self { interval_us }
    }

    /// Returns true if an event at `now` is far enough from one at `last`.
    #[inline]
    pub const fn accepts(&self, now: u32, last: u32) -> bool {
        elapsed_us(now, last) >= self.interval_us
    }

    /// The configured spacing.
    #[inline]
    pub const fn interval_us(&self) -> u32 {
        self.interval_us
    }
}

/// Measures the real time between successive control ticks.
///
/// The first lap has nothing to measure against and returns `None`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Stopwatch {
    last_us: Option<u32>,
}

impl Stopwatch {
    /// Creates a stopwatch with no reference point.
    pub const fn new() -> Self {
        Self { last_us: None }
    }

    /// Returns seconds since the previous lap and starts a new one.
    pub fn lap_secs(&mut self, now_us: u32) -> Option<f32> {
        let previous = self.last_us.replace(now_us)?;
        Some(elapsed_us(now_us, previous) as f32 / MICROS_PER_SEC as f32)
    }

    /// Forgets the reference point.
    pub fn reset(&mut self) {
        self.last_us = None;
    }
}

/// Fixed-period repeating deadline, in the spirit of a ticker callback.
///
/// The first poll is always due. A caller that falls more than a whole
/// period behind is resynchronised instead of firing a burst of catch-up
/// ticks.
#[derive(Clone, Copy, Debug)]
pub struct Interval {
    period_us: u32,
    next_due_us: Option<u32>,
}

impl Interval {
    /// Creates an interval with the given period in microseconds.
    pub const fn new(period_us: u32) -> Self {
        Self {
            period_us,
            next_due_us: None,
        }
    }

    /// Creates an interval with the given period in milliseconds.
    pub const fn from_ms(period_ms: u32) -> Self {
        Self::new(period_ms.saturating_mul(1000))
    }

    /// The configured period in microseconds.
    #[inline]
    pub const fn period_us(&self) -> u32 {
        self.period_us
    }

    /// Returns true if a tick is due at `now_us`, and schedules the next one.
    pub fn is_due(&mut self, now_us: u32) -> bool {
        match self.next_due_us {
            None => {
                self.next_due_us = Some(now_us.wrapping_add(self.period_us));
                true
            }
            Some(due) if reached(now_us, due) => {
                let next = due.wrapping_add(self.period_us);
                self.next_due_us = Some(if reached(now_us, next) {
                    now_us.wrapping_add(self.period_us)
                } else {
                    next
                });
                true
            }
            Some(_) => false,
        }
    }

    /// Makes the next poll due immediately.
    pub fn reset(&mut self) {
        self.next_due_us = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_handles_rollover() {
        assert_eq!(elapsed_us(5, u32::MAX - 4), 10);
        assert_eq!(elapsed_us(1_000, 400), 600);
    }

    #[test]
    fn reached_across_rollover() {
        assert!(reached(3, u32::MAX - 2));
        assert!(!reached(u32::MAX - 2, 3));
        assert!(reached(100, 100));
    }

    #[test]
    fn debounce_boundary() {
        let debounce = Debounce::new(10_000);
        assert!(!debounce.accepts(9_999, 0));
        assert!(debounce.accepts(10_000, 0));
        assert_eq!(debounce.interval_us(), 10_000);
    }

    #[test]
    fn stopwatch_first_lap_is_none() {
        let mut sw = Stopwatch::new();
        assert_eq!(sw.lap_secs(1_000), None);
        assert_eq!(sw.lap_secs(201_000), Some(0.2));
        assert_eq!(sw.lap_secs(201_000), Some(0.0));
    }

    #[test]
    fn stopwatch_reset() {
        let mut sw = Stopwatch::new();
        let _ = sw.lap_secs(0);
        sw.reset();
        assert_eq!(sw.lap_secs(500_000), None);
    }

    #[test]
    fn interval_fires_every_period() {
        let mut interval = Interval::from_ms(200);
        assert_eq!(interval.period_us(), 200_000);

        assert!(interval.is_due(0));
        assert!(!interval.is_due(199_999));
        assert!(interval.is_due(200_000));
        assert!(!interval.is_due(399_000));
        assert!(interval.is_due(400_500));
        // Keeps the original phase after a late tick
        assert!(interval.is_due(600_000));
    }

    #[test]
    fn interval_resyncs_after_long_stall() {
        let mut interval = Interval::from_ms(200);
        assert!(interval.is_due(0));
        assert!(interval.is_due(1_000_000));
        // No catch-up burst
        assert!(!interval.is_due(1_000_001));
        assert!(interval.is_due(1_200_000));
    }

    #[test]
    fn interval_reset_fires_immediately() {
        let mut interval = Interval::from_ms(200);
        assert!(interval.is_due(0));
        interval.reset();
        assert!(interval.is_due(10));
    }
}

//! Interrupt-fed wheel encoder speed estimation.
//!
//! [`SpeedEstimator`] turns debounced pin-edge timestamps into a speed in
//! ticks per second. Edges arrive from an interrupt handler through
//! [`on_edge`](SpeedEstimator::on_edge), which takes `&self`, never blocks
//! and never allocates. The control tick reads the estimate with
//! [`current_speed`](SpeedEstimator::current_speed).
//!
//! # Estimate
//!
//! Rising and falling edges are timed independently. Each polarity yields a
//! speed `1_000_000 / interval_us` from the gap between its last two
//! accepted edges, and the reported speed is the sum of the two. An encoder
//! whose high and low phases differ in length therefore reads the same as a
//! symmetric one.
//!
//! A polarity that has never fired, or whose last edge is older than the
//! staleness threshold, makes the whole estimate `0.0`.
//!
//! # Sharing with an interrupt handler
//!
//! Per-polarity state lives in atomics. The handler is the only writer and
//! the control tick the only reader; plain loads and stores are enough, so
//! this works on cores without compare-and-swap.
//!
//! ```rust
//! use rs_drivetrain::encoder::SpeedEstimator;
//! use rs_drivetrain::traits::Polarity;
//!
//! static LEFT: SpeedEstimator = SpeedEstimator::new();
//!
//! // Wired to the pin-change interrupt by the platform layer
//! let on_pin_change = |level: bool, now_us: u32| {
//!     LEFT.on_edge(Polarity::from_level(level), now_us);
//! };
//!
//! on_pin_change(true, 1_000_000);
//! on_pin_change(false, 1_010_000);
//! on_pin_change(true, 1_020_000);
//! on_pin_change(false, 1_030_000);
//!
//! assert_eq!(LEFT.current_speed(1_030_000), 100.0);
//! assert_eq!(LEFT.current_speed(2_100_000), 0.0); // stale
//! ```
//!
//! # Direction
//!
//! A single encoder channel carries no direction. The estimate is a
//! magnitude and the rest of the crate assumes the wheel turns the way it is
//! commanded. Deriving direction from a second (quadrature) channel would
//! need a second input per wheel and is not done here.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::EncoderConfig;
use crate::timing::{elapsed_us, Debounce, MICROS_PER_SEC};
use crate::traits::Polarity;

/// How far an edge timestamp may lead the sampled clock and still count as
/// fresh. The interrupt can store an edge between the tick reading the clock
/// and reading the estimator.
const MAX_EDGE_LEAD_US: u32 = 10_000;

/// Microseconds since `last`, or 0 if `last` leads `now_us` by at most
/// [`MAX_EDGE_LEAD_US`]. Any larger gap is measured forward from `last`, so
/// an hour of silence is never mistaken for an edge from the future.
fn age_us(now_us: u32, last: u32) -> u32 {
    if elapsed_us(last, now_us) <= MAX_EDGE_LEAD_US {
        0
    } else {
        elapsed_us(now_us, last)
    }
}

/// Timing state for one edge polarity.
struct EdgeSlot {
    seen: AtomicBool,
    last_us: AtomicU32,
    speed_bits: AtomicU32,
}

impl EdgeSlot {
    const fn new() -> Self {
        Self {
            seen: AtomicBool::new(false),
            last_us: AtomicU32::new(0),
            speed_bits: AtomicU32::new(0),
        }
    }

    fn speed(&self) -> f32 {
        f32::from_bits(self.speed_bits.load(Ordering::Relaxed))
    }

    fn reset(&self) {
        self.seen.store(false, Ordering::Release);
        self.speed_bits.store(0, Ordering::Relaxed);
        self.last_us.store(0, Ordering::Relaxed);
    }
}

/// Per-wheel encoder speed estimator.
///
/// See the [module documentation](self) for the estimate and the sharing
/// model.
pub struct SpeedEstimator {
    slots: [EdgeSlot; 2],
    debounce: Debounce,
    stale_after_us: u32,
    interval_decay: bool,
}

impl SpeedEstimator {
    /// Creates an estimator with the default timing (10 ms debounce, 1 s
    /// staleness, no decay).
    pub const fn new() -> Self {
        Self {
            slots: [EdgeSlot::new(), EdgeSlot::new()],
            debounce: Debounce::new(10_000),
            stale_after_us: 1_000_000,
            interval_decay: false,
        }
    }

    /// Creates an estimator with the given timing.
    pub const fn with_config(config: EncoderConfig) -> Self {
        Self {
            slots: [EdgeSlot::new(), EdgeSlot::new()],
            debounce: Debounce::new(config.debounce_us),
            stale_after_us: config.stale_after_us,
            interval_decay: config.interval_decay,
        }
    }

    /// Records an encoder edge. Safe to call from interrupt context.
    ///
    /// Returns `false` if the edge fell inside the debounce window of the
    /// previous accepted edge of the same polarity, in which case nothing
    /// changes. The first edge of a polarity only primes its timestamp.
    pub fn on_edge(&self, polarity: Polarity, timestamp_us: u32) -> bool {
        let slot = &self.slots[polarity.index()];

        if !slot.seen.load(Ordering::Acquire) {
            slot.last_us.store(timestamp_us, Ordering::Relaxed);
            slot.seen.store(true, Ordering::Release);
            return true;
        }

        let last = slot.last_us.load(Ordering::Relaxed);
        if !self.debounce.accepts(timestamp_us, last) {
            return false;
        }

        let interval = elapsed_us(timestamp_us, last);
        if interval > 0 {
            let speed = MICROS_PER_SEC as f32 / interval as f32;
            slot.speed_bits.store(speed.to_bits(), Ordering::Relaxed);
        }
        // Publishes the speed stored above
        slot.last_us.store(timestamp_us, Ordering::Release);
        true
    }

    /// Current speed in ticks per second, or `0.0` if either polarity is
    /// unprimed or stale.
    pub fn current_speed(&self, now_us: u32) -> f32 {
        let mut total = 0.0;
        for slot in &self.slots {
            if !slot.seen.load(Ordering::Acquire) {
                return 0.0;
            }
            let since = age_us(now_us, slot.last_us.load(Ordering::Acquire));
            if since > self.stale_after_us {
                return 0.0;
            }

            let mut speed = slot.speed();
            if self.interval_decay && since > 0 {
                speed = speed.min(MICROS_PER_SEC as f32 / since as f32);
            }
            total += speed;
        }
        total
    }

    /// Last half-period speed for one polarity, ignoring staleness.
    pub fn half_speed(&self, polarity: Polarity) -> f32 {
        self.slots[polarity.index()].speed()
    }

    /// Timestamp of the last accepted edge of one polarity.
    pub fn last_edge_us(&self, polarity: Polarity) -> Option<u32> {
        let slot = &self.slots[polarity.index()];
        if slot.seen.load(Ordering::Acquire) {
            Some(slot.last_us.load(Ordering::Acquire))
        } else {
            None
        }
    }

    /// Returns true if either polarity is unprimed or older than the
    /// staleness threshold.
    pub fn is_stale(&self, now_us: u32) -> bool {
        self.slots.iter().any(|slot| {
            !slot.seen.load(Ordering::Acquire)
                || age_us(now_us, slot.last_us.load(Ordering::Acquire)) > self.stale_after_us
        })
    }

    /// Clears all edge history.
    ///
    /// Must not race with [`on_edge`](Self::on_edge); call it with the edge
    /// interrupt masked or before it is attached.
    pub fn reset(&self) {
        for slot in &self.slots {
            slot.reset();
        }
    }
}

impl Default for SpeedEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for SpeedEstimator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpeedEstimator")
            .field("rising_speed", &self.half_speed(Polarity::Rising))
            .field("falling_speed", &self.half_speed(Polarity::Falling))
            .field("rising_last_us", &self.last_edge_us(Polarity::Rising))
            .field("falling_last_us", &self.last_edge_us(Polarity::Falling))
            .finish()
    }
}

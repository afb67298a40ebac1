//! ESP32 clock implementation using the ESP-IDF timer.

use crate::traits::Clock;

/// ESP32 clock using the hardware timer.
///
/// Reads `esp_timer_get_time()`, microseconds since boot, truncated to the
/// wrapping `u32` counter the rest of the crate works with.
///
/// # Example
///
/// ```ignore
/// use rs_drivetrain::hal::esp32::Esp32Clock;
/// use rs_drivetrain::traits::Clock;
/// use rs_drivetrain::timing::elapsed_us;
///
/// let clock = Esp32Clock::new();
/// let start = clock.now_us();
/// // ... do work ...
/// let elapsed = elapsed_us(clock.now_us(), start);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Esp32Clock;

impl Esp32Clock {
    /// Creates a new ESP32 clock instance.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

/// Microseconds since boot, wrapping at `u32::MAX`. Safe to call from an
/// interrupt handler.
#[inline]
pub fn micros() -> u32 {
    // Safe: plain read of the hardware timer, no side effects
    let micros = unsafe { esp_idf_hal::sys::esp_timer_get_time() };
    micros as u32
}

impl Clock for Esp32Clock {
    #[inline]
    fn now_us(&self) -> u32 {
        micros()
    }
}

//! Interrupt-driven wheel encoder input for ESP32.
//!
//! Each wheel has one encoder channel. The pin interrupt fires on both
//! edges and forwards the level and a microsecond timestamp to a
//! [`SpeedEstimator`].

use esp_idf_hal::gpio::{AnyIOPin, Input, InterruptType, PinDriver, Pull};
use esp_idf_hal::sys::{self, EspError};

use super::clock::micros;
use crate::encoder::SpeedEstimator;
use crate::traits::Polarity;

/// Encoder pin wired to a [`SpeedEstimator`].
///
/// The estimator must be `'static` because the interrupt handler holds it
/// for as long as the subscription lives. Dropping this value unsubscribes.
///
/// # Example
///
/// ```ignore
/// use esp_idf_hal::gpio::Pull;
/// use rs_drivetrain::encoder::SpeedEstimator;
/// use rs_drivetrain::hal::esp32::Esp32EncoderPin;
///
/// static LEFT: SpeedEstimator = SpeedEstimator::new();
///
/// let peripherals = Peripherals::take()?;
/// let _left = Esp32EncoderPin::attach(peripherals.pins.gpio0.into(), Pull::Floating, &LEFT)?;
/// ```
pub struct Esp32EncoderPin<'d> {
    pin: PinDriver<'d, AnyIOPin, Input>,
}

impl<'d> Esp32EncoderPin<'d> {
    /// Configures the pin as an any-edge interrupt feeding `estimator`.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO or interrupt setup fails.
    pub fn attach(
        pin: AnyIOPin,
        pull: Pull,
        estimator: &'static SpeedEstimator,
    ) -> Result<Self, EspError> {
        let mut pin = PinDriver::input(pin)?;
        pin.set_pull(pull)?;
        pin.set_interrupt_type(InterruptType::AnyEdge)?;

        let gpio = pin.pin();
        let on_change = move || {
            let now = micros();
            // Safe: register read of a pin this driver owns
            let level = unsafe { sys::gpio_get_level(gpio) } != 0;
            estimator.on_edge(Polarity::from_level(level), now);
            // The HAL disarms the interrupt after each notification
            unsafe {
                sys::gpio_intr_enable(gpio);
            }
        };

        // Safe: the callback only reads registers and stores atomics
        unsafe {
            pin.subscribe(on_change)?;
        }
        pin.enable_interrupt()?;

        Ok(Self { pin })
    }

    /// Current pin level.
    #[inline]
    pub fn is_high(&self) -> bool {
        self.pin.is_high()
    }

    /// GPIO number.
    #[inline]
    pub fn gpio(&self) -> i32 {
        self.pin.pin()
    }
}

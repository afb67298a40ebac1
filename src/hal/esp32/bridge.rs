//! H-bridge driver using two GPIO outputs and ESP32 LEDC PWM.
//!
//! Works with any two-input bridge with a separate enable/PWM line (L298N,
//! TB6612FNG and similar):
//!
//! | Mode | IN1 | IN2 | PWM |
//! |------|-----|-----|-----|
//! | Forward | high | low | duty |
//! | Reverse | low | high | duty |
//! | Coast | low | low | 0 |
//! | Brake | high | high | 0 |

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;
use esp_idf_hal::sys::EspError;

use crate::hal::ehal::{EhalBridge, EhalBridgeError};
use crate::traits::{DriveCommand, HBridge};

/// H-bridge for ESP32.
///
/// Uses the LEDC peripheral for PWM generation at 20kHz with 8-bit
/// resolution, so the duty maps one to one.
///
/// # Example
///
/// ```ignore
/// use rs_drivetrain::hal::esp32::Esp32Bridge;
/// use rs_drivetrain::traits::{DriveCommand, DriveMode, HBridge};
///
/// let peripherals = Peripherals::take()?;
/// let mut bridge = Esp32Bridge::new(
///     peripherals.pins.gpio4.into(),
///     peripherals.pins.gpio5.into(),
///     peripherals.pins.gpio6.into(),
///     peripherals.ledc.timer0,
///     peripherals.ledc.channel0,
/// )?;
///
/// bridge.write(DriveCommand::new(DriveMode::Forward, 128))?;
/// ```
pub struct Esp32Bridge<'d> {
    inner: EhalBridge<PinDriver<'d, AnyOutputPin, Output>, PinDriver<'d, AnyOutputPin, Output>, LedcDriver<'d>>,
}

impl<'d> Esp32Bridge<'d> {
    /// PWM frequency in Hz (20kHz is above audible range)
    const PWM_FREQ_HZ: u32 = 20_000;

    /// PWM resolution (8-bit = 256 steps)
    const PWM_RESOLUTION: Resolution = Resolution::Bits8;

    /// Creates a bridge driver and leaves the motor coasting.
    ///
    /// # Arguments
    ///
    /// * `in1`, `in2` - direction pins
    /// * `pwm_pin` - enable/PWM pin
    /// * `timer` - LEDC timer peripheral
    /// * `channel` - LEDC channel for the PWM pin
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO or PWM initialization fails.
    pub fn new<T, TI, C, CI>(
        in1: AnyOutputPin,
        in2: AnyOutputPin,
        pwm_pin: AnyOutputPin,
        timer: T,
        channel: C,
    ) -> Result<Self, EspError>
    where
        TI: esp_idf_hal::ledc::LedcTimer + 'd,
        T: Peripheral<P = TI> + 'd,
        CI: esp_idf_hal::ledc::LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        C: Peripheral<P = CI> + 'd,
    {
        let timer_config = TimerConfig::default()
            .frequency(Self::PWM_FREQ_HZ.Hz())
            .resolution(Self::PWM_RESOLUTION);
        let timer_driver = LedcTimerDriver::new(timer, &timer_config)?;
        let pwm = LedcDriver::new(channel, &timer_driver, pwm_pin)?;

        let in1 = PinDriver::output(in1)?;
        let in2 = PinDriver::output(in2)?;

        let mut bridge = Self {
            inner: EhalBridge::new(in1, in2, pwm),
        };

        // Ensure motor starts stopped
        bridge.coast()?;

        Ok(bridge)
    }
}

impl HBridge for Esp32Bridge<'_> {
    type Error = EspError;

    fn write(&mut self, cmd: DriveCommand) -> Result<(), Self::Error> {
        self.inner.write(cmd).map_err(|e| match e {
            EhalBridgeError::Pin(e) | EhalBridgeError::Pwm(e) => e,
        })
    }
}

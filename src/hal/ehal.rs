//! [`HBridge`] over `embedded-hal` 1.0 pins.
//!
//! Any two [`OutputPin`]s and one [`SetDutyCycle`] channel make an H-bridge
//! driver (L298N, TB6612 and similar). The duty is written as a fraction of
//! 255, so the PWM channel's own resolution does not matter.
//!
//! When the pin pattern changes, the PWM is dropped to zero before the pins
//! switch and raised afterwards.

use embedded_hal::digital::{OutputPin, PinState};
use embedded_hal::pwm::SetDutyCycle;

use crate::traits::{DriveCommand, HBridge};

/// Error from one of the bridge's outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EhalBridgeError<P, W> {
    /// A direction pin failed.
    Pin(P),
    /// The PWM channel failed.
    Pwm(W),
}

impl<P: core::fmt::Debug, W: core::fmt::Debug> core::fmt::Display for EhalBridgeError<P, W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Pin(e) => write!(f, "direction pin error: {:?}", e),
            Self::Pwm(e) => write!(f, "pwm error: {:?}", e),
        }
    }
}

/// H-bridge built from two direction pins and a PWM channel.
///
/// # Example
///
/// ```ignore
/// use rs_drivetrain::hal::ehal::EhalBridge;
/// use rs_drivetrain::traits::{DriveCommand, DriveMode, HBridge};
///
/// let mut bridge = EhalBridge::new(in1, in2, pwm);
/// bridge.write(DriveCommand::new(DriveMode::Forward, 128))?;
/// ```
pub struct EhalBridge<IN1, IN2, PWM> {
    in1: IN1,
    in2: IN2,
    pwm: PWM,
    /// Pattern currently on the pins, unknown until the first write.
    pins: Option<(bool, bool)>,
}

impl<IN1, IN2, PWM> EhalBridge<IN1, IN2, PWM>
where
    IN1: OutputPin,
    IN2: OutputPin<Error = IN1::Error>,
    PWM: SetDutyCycle,
{
    /// Wraps the outputs. Nothing is written until the first command.
    pub fn new(in1: IN1, in2: IN2, pwm: PWM) -> Self {
        Self {
            in1,
            in2,
            pwm,
            pins: None,
        }
    }

    /// Returns the outputs.
    pub fn release(self) -> (IN1, IN2, PWM) {
        (self.in1, self.in2, self.pwm)
    }

    fn set_duty(&mut self, duty: u8) -> Result<(), EhalBridgeError<IN1::Error, PWM::Error>> {
        self.pwm
            .set_duty_cycle_fraction(u16::from(duty), u16::from(u8::MAX))
            .map_err(EhalBridgeError::Pwm)
    }
}

impl<IN1, IN2, PWM> HBridge for EhalBridge<IN1, IN2, PWM>
where
    IN1: OutputPin,
    IN2: OutputPin<Error = IN1::Error>,
    PWM: SetDutyCycle,
{
    type Error = EhalBridgeError<IN1::Error, PWM::Error>;

    fn write(&mut self, cmd: DriveCommand) -> Result<(), Self::Error> {
        let pattern = cmd.mode.pins();
        if self.pins != Some(pattern) {
            self.set_duty(0)?;
            self.in1
                .set_state(PinState::from(pattern.0))
                .map_err(EhalBridgeError::Pin)?;
            self.in2
                .set_state(PinState::from(pattern.1))
                .map_err(EhalBridgeError::Pin)?;
            self.pins = Some(pattern);
        }
        self.set_duty(cmd.duty)
    }
}

//! ESP32-C3 SuperMini two-wheel drivetrain controller.
//!
//! This is the main entry point for the physical hardware. It:
//! - Attaches an any-edge interrupt to each wheel encoder
//! - Runs the PID velocity loop for both wheels every control period
//! - Prints a telemetry line twice a second
//!
//! Target speeds and gains are taken from compile-time environment
//! variables so a bench test needs no operator input:
//!
//! ```bash
//! LEFT_TARGET=60 RIGHT_TARGET=60 KP=0.01 KI=0.002 KD=0.5 \
//!     cargo build --release --features esp32 --bin esp32_main
//! ```

use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Pin, Pull};
use esp_idf_hal::peripherals::Peripherals;
use rs_drivetrain::encoder::SpeedEstimator;
use rs_drivetrain::hal::esp32::{Esp32Bridge, Esp32Clock, Esp32EncoderPin};
use rs_drivetrain::timing::Interval;
use rs_drivetrain::traits::Clock;
use rs_drivetrain::{Config, Drivetrain, Gains, WheelState};
use std::thread;
use std::time::Duration;

/// Main loop sleep between polls in milliseconds
const LOOP_SLEEP_MS: u64 = 5;

/// Telemetry print interval in milliseconds
const TELEMETRY_INTERVAL_MS: u32 = 500;

static LEFT_ENCODER: SpeedEstimator = SpeedEstimator::new();
static RIGHT_ENCODER: SpeedEstimator = SpeedEstimator::new();

fn env_f32(value: Option<&str>, default: f32) -> f32 {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

fn print_wheel(state: &WheelState) {
    print!(
        "{}: target {:>7.1} measured {:>7.1} signal {:>5.1} {:<7}",
        state.name.as_str(),
        state.target_speed,
        state.measured_speed,
        state.control_signal,
        state.command.mode.as_str(),
    );
}

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();

    #[cfg(feature = "esp32-log")]
    esp_idf_svc::log::EspLogger::initialize_default();

    println!();
    println!("================================");
    println!("  rs-drivetrain SuperMini");
    println!("================================");
    println!();

    // =========================================================================
    // Configuration
    // =========================================================================
    let gains = Gains::new(
        env_f32(option_env!("KP"), 0.01),
        env_f32(option_env!("KI"), 0.002),
        env_f32(option_env!("KD"), 0.5),
    );
    let config = Config::default().with_gains(gains);
    let left_target = env_f32(option_env!("LEFT_TARGET"), 0.0);
    let right_target = env_f32(option_env!("RIGHT_TARGET"), 0.0);

    let peripherals = Peripherals::take()?;
    let clock = Esp32Clock::new();

    // =========================================================================
    // Initialize Motors
    // =========================================================================
    let (in1, in2, pwm): (AnyOutputPin, AnyOutputPin, AnyOutputPin) = (
        peripherals.pins.gpio4.into(),
        peripherals.pins.gpio2.into(),
        peripherals.pins.gpio9.into(),
    );
    let banner = (in1.pin(), in2.pin(), pwm.pin());
    let left_bridge =
        Esp32Bridge::new(in1, in2, pwm, peripherals.ledc.timer0, peripherals.ledc.channel0)?;
    println!(
        "[OK] Left motor initialized (GPIO{}/{} PWM GPIO{})",
        banner.0, banner.1, banner.2
    );

    let (in1, in2, pwm): (AnyOutputPin, AnyOutputPin, AnyOutputPin) = (
        peripherals.pins.gpio7.into(),
        peripherals.pins.gpio8.into(),
        peripherals.pins.gpio10.into(),
    );
    let banner = (in1.pin(), in2.pin(), pwm.pin());
    let right_bridge =
        Esp32Bridge::new(in1, in2, pwm, peripherals.ledc.timer1, peripherals.ledc.channel1)?;
    println!(
        "[OK] Right motor initialized (GPIO{}/{} PWM GPIO{})",
        banner.0, banner.1, banner.2
    );

    // =========================================================================
    // Initialize Encoders
    // =========================================================================
    let left_pin: AnyIOPin = peripherals.pins.gpio20.into();
    let right_pin: AnyIOPin = peripherals.pins.gpio21.into();
    let left_pin = Esp32EncoderPin::attach(left_pin, Pull::Floating, &LEFT_ENCODER)?;
    let right_pin = Esp32EncoderPin::attach(right_pin, Pull::Floating, &RIGHT_ENCODER)?;
    println!(
        "[OK] Encoders attached (GPIO{}, GPIO{})",
        left_pin.gpio(),
        right_pin.gpio()
    );

    let mut drivetrain =
        Drivetrain::new(&LEFT_ENCODER, left_bridge, &RIGHT_ENCODER, right_bridge, &config);
    drivetrain.set_target_speeds(left_target, right_target);

    println!();
    println!(
        "Gains: kp={} ki={} kd={}",
        gains.kp, gains.ki, gains.kd
    );
    println!("Targets: left {} right {} ticks/s", left_target, right_target);
    println!(
        "Starting control loop ({} ms period)...",
        config.control_period_ms
    );
    println!();

    // =========================================================================
    // Main Loop
    // =========================================================================
    let mut telemetry = Interval::from_ms(TELEMETRY_INTERVAL_MS);

    loop {
        let now = clock.now_us();

        if let Err(e) = drivetrain.poll(now) {
            println!("!! Bridge write failed: {:?}, stopping !!", e);
            drivetrain.stop()?;
        }

        if telemetry.is_due(now) {
            let state = drivetrain.state(now);
            print_wheel(&state.left);
            print!(" | ");
            print_wheel(&state.right);
            println!();
        }

        thread::sleep(Duration::from_millis(LOOP_SLEEP_MS));
    }
}

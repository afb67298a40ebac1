//! Integration tests for the per-wheel control loop

use rs_drivetrain::{
    config::PidConfig, hal::MockBridge, Config, DriveCommand, DriveMode, Drivetrain, Gains,
    PidUpdate, Polarity, SpeedEstimator, WheelConfig, WheelSide, WheelUnit,
};

/// Feeds edges `spacing_us` apart with alternating polarity, returning the
/// time of the last edge.
fn feed_steady(est: &SpeedEstimator, start_us: u32, spacing_us: u32, count: u32) -> u32 {
    let mut t = start_us;
    for i in 0..count {
        t = start_us + i * spacing_us;
        est.on_edge(Polarity::from_level(i % 2 == 0), t);
    }
    t
}

fn wheel_config(gains: Gains) -> WheelConfig {
    WheelConfig::left().with_pid(PidConfig::default().with_gains(gains))
}

// ============================================================================
// Estimator Properties
// ============================================================================

#[test]
fn steady_edges_read_one_hundred() {
    let est = SpeedEstimator::new();
    let last = feed_steady(&est, 0, 10_000, 50);
    assert!((est.current_speed(last) - 100.0).abs() < 0.01);
}

#[test]
fn silent_wheel_reads_zero_after_one_second() {
    let est = SpeedEstimator::new();
    let last = feed_steady(&est, 0, 10_000, 20);

    // The older polarity's last edge sets the deadline
    let older = est
        .last_edge_us(Polarity::Rising)
        .unwrap()
        .min(est.last_edge_us(Polarity::Falling).unwrap());
    assert!(est.current_speed(last) > 0.0);
    assert_eq!(est.current_speed(older + 1_000_001), 0.0);
}

#[test]
fn bounce_inside_debounce_window_is_ignored() {
    let est = SpeedEstimator::new();
    est.on_edge(Polarity::Rising, 0);
    est.on_edge(Polarity::Falling, 10_000);
    est.on_edge(Polarity::Rising, 20_000);
    est.on_edge(Polarity::Falling, 30_000);
    let before = est.current_speed(30_000);

    // Contact bounce 3 ms after each edge
    assert!(!est.on_edge(Polarity::Rising, 23_000));
    assert!(!est.on_edge(Polarity::Falling, 33_000));
    assert_eq!(est.current_speed(33_000), before);
}

// ============================================================================
// Controller Properties
// ============================================================================

#[test]
fn control_signal_always_in_duty_range() {
    let est = SpeedEstimator::new();
    let mut wheel = WheelUnit::new(
        &est,
        MockBridge::new(),
        &wheel_config(Gains::new(1000.0, 1000.0, 1000.0)),
    );

    let targets = [500.0, -500.0, 10.0, 1e6, -1e6, 4.0];
    let mut now = 0u32;
    for (i, &target) in targets.iter().cycle().take(60).enumerate() {
        wheel.set_target_speed(target);
        // Alternate between a fast-spinning and a silent encoder
        if i % 3 == 0 {
            feed_steady(&est, now, 5_000, 40);
        }
        now += 200_000;
        wheel.tick(now, 0.2).unwrap();

        let signal = wheel.control_signal();
        assert!((0.0..=255.0).contains(&signal), "signal {} out of range", signal);
    }
}

#[test]
fn set_ki_zeroes_integral_but_keeps_other_terms() {
    let est = SpeedEstimator::new();
    let gains = Gains::new(0.5, 0.1, 0.2);
    let mut tuned = WheelUnit::new(&est, MockBridge::new(), &wheel_config(gains));
    let mut untouched = WheelUnit::new(&est, MockBridge::new(), &wheel_config(gains));
    tuned.set_target_speed(60.0);
    untouched.set_target_speed(60.0);

    for now in [200_000, 400_000] {
        tuned.tick(now, 0.2).unwrap();
        untouched.tick(now, 0.2).unwrap();
    }
    tuned.set_ki(0.1);
    assert_eq!(tuned.pid().integral(), 0.0);

    tuned.tick(600_000, 0.2).unwrap();
    untouched.tick(600_000, 0.2).unwrap();

    let a = tuned.state(600_000).terms;
    let b = untouched.state(600_000).terms;
    assert_eq!(a.proportional, b.proportional);
    assert_eq!(a.derivative, b.derivative);
    assert!(a.integral < b.integral);
}

// ============================================================================
// Actuation Properties
// ============================================================================

#[test]
fn sign_of_target_selects_pattern() {
    let est = SpeedEstimator::new();
    let mut wheel = WheelUnit::new(&est, MockBridge::new(), &WheelConfig::left());

    wheel.set_target_speed(-50.0);
    wheel.tick(0, 0.2).unwrap();
    let bridge = wheel.actuator().bridge();
    assert_eq!(bridge.pins(), (false, true));
    assert_eq!(bridge.duty, 50);

    wheel.set_target_speed(50.0);
    wheel.tick(200_000, 0.2).unwrap();
    let bridge = wheel.actuator().bridge();
    assert_eq!(bridge.pins(), (true, false));
    // Reversal went through the stop pattern
    let history = &bridge.history;
    assert_eq!(history[history.len() - 2], DriveCommand::stopped(DriveMode::Coast));
}

#[test]
fn zero_target_idles_after_saturation() {
    let est = SpeedEstimator::new();
    let mut wheel = WheelUnit::new(
        &est,
        MockBridge::new(),
        &wheel_config(Gains::new(10.0, 5.0, 0.0)),
    );
    wheel.set_target_speed(150.0);
    for i in 1..=10u32 {
        wheel.tick(i * 200_000, 0.2).unwrap();
    }
    assert_eq!(wheel.actuator().bridge().duty, 255);

    wheel.set_target_speed(0.0);
    let report = wheel.tick(2_200_000, 0.2).unwrap();
    assert!(report.pid.is_none());
    assert_eq!(wheel.actuator().bridge().pins(), (false, false));
    assert_eq!(wheel.actuator().bridge().duty, 0);

    // Coming back starts from a clean controller
    wheel.set_target_speed(150.0);
    let report = wheel.tick(2_400_000, 0.2).unwrap();
    let integral = wheel.pid().integral();
    assert!((integral - 30.0).abs() < 1e-4);
    assert!(report.pid.map_or(false, |u| u.is_applied()));
}

// ============================================================================
// Scenario
// ============================================================================

#[test]
fn steady_edges_and_tuned_gains_settle() {
    let est = SpeedEstimator::new();
    let mut wheel = WheelUnit::new(
        &est,
        MockBridge::new(),
        &wheel_config(Gains::new(0.01, 0.002, 0.5)),
    );
    wheel.set_target_speed(100.0);

    let mut signals = Vec::new();
    let mut t = 0u32;
    for _ in 0..20 {
        t = feed_steady(&est, t, 10_000, 21);
        let report = wheel.tick(t, 0.2).unwrap();
        assert!((report.measured_speed - 100.0).abs() < 0.01);
        signals.push(wheel.control_signal());
    }

    assert!(signals.iter().all(|s| (0.0..=255.0).contains(s)));
    // On target: nothing to correct
    assert!(signals.iter().all(|s| s.abs() < 1e-3));
}

#[test]
fn constant_shortfall_settles_monotonically() {
    let est = SpeedEstimator::new();
    let mut wheel = WheelUnit::new(
        &est,
        MockBridge::new(),
        &wheel_config(Gains::new(0.01, 0.002, 0.5)),
    );
    wheel.set_target_speed(100.0);

    // 80 ticks/s: edges 12.5 ms apart
    let mut signals = Vec::new();
    let mut t = 0u32;
    for _ in 0..20 {
        t = feed_steady(&est, t, 12_500, 17);
        let report = wheel.tick(t, 0.2).unwrap();
        assert!((report.measured_speed - 80.0).abs() < 0.01);
        signals.push(wheel.control_signal());
    }

    // First tick carries the derivative kick, then only P and a growing I
    assert!(signals[0] > 50.0);
    for pair in signals[1..].windows(2) {
        assert!(pair[1] >= pair[0]);
    }
    let last = *signals.last().unwrap();
    assert!((last - 0.36).abs() < 1e-3, "settled at {}", last);
}

#[test]
fn closed_loop_reaches_target() {
    let est = SpeedEstimator::new();
    let mut wheel = WheelUnit::new(
        &est,
        MockBridge::new(),
        &wheel_config(Gains::new(0.5, 1.0, 0.0)),
    );
    wheel.set_target_speed(100.0);

    // First-order motor: speed relaxes halfway toward the duty each tick
    let mut plant = 0.0f32;
    let mut level = false;
    let mut next_edge: Option<u32> = None;

    for k in 0..40u32 {
        let start = k * 200_000;
        let end = start + 200_000;
        if plant >= 1.0 {
            let spacing = (1e6 / plant) as u32;
            let mut edge = next_edge.unwrap_or(start + spacing);
            while edge <= end {
                level = !level;
                est.on_edge(Polarity::from_level(level), edge);
                edge += spacing;
            }
            next_edge = Some(edge);
        } else {
            next_edge = None;
        }

        let report = wheel.tick(end, 0.2).unwrap();
        assert!((0.0..=255.0).contains(&wheel.control_signal()));
        plant += 0.5 * (report.command.duty as f32 - plant);
    }

    let measured = wheel.state(40 * 200_000).measured_speed;
    assert!((measured - 100.0).abs() < 3.0, "measured {}", measured);
}

// ============================================================================
// Drivetrain
// ============================================================================

#[test]
fn drivetrain_runs_both_wheels_on_schedule() {
    let (l, r) = (SpeedEstimator::new(), SpeedEstimator::new());
    let config = Config::default().with_control_period_ms(100);
    let mut dt = Drivetrain::new(&l, MockBridge::new(), &r, MockBridge::new(), &config);
    dt.set_target_speeds(20.0, -20.0);

    let mut ticks = Vec::new();
    for ms in (0..=1_000u32).step_by(10) {
        if let Some(tick) = dt.poll(ms * 1000).unwrap() {
            ticks.push(tick);
        }
    }
    assert_eq!(ticks.len(), 11);
    assert!(ticks[1..].iter().all(|t| (t.elapsed_s - 0.1).abs() < 1e-6));
    assert!(ticks
        .iter()
        .all(|t| t.left.command.mode == DriveMode::Forward && t.right.command.mode == DriveMode::Reverse));
}

#[test]
fn drivetrain_skip_is_reported_per_wheel() {
    let (l, r) = (SpeedEstimator::new(), SpeedEstimator::new());
    let mut dt = Drivetrain::new(&l, MockBridge::new(), &r, MockBridge::new(), &Config::default());
    dt.set_target_speeds(50.0, 0.0);

    let tick = dt.poll(0).unwrap().unwrap();
    assert!(matches!(tick.left.pid, Some(PidUpdate::Applied { .. })));
    assert!(tick.right.pid.is_none());
    assert_eq!(dt.wheel(WheelSide::Left).control_signal(), 50.0);
}

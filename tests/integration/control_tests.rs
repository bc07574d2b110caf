//! End-to-end sampling → control → actuation pipeline tests.
//!
//! Drives `FanController` with the simulated sensor bus and asserts on the
//! recorded fan duties and display frames, covering the warm-band ramp and
//! the sensor-loss failsafe.

use crate::mock_hw::{RecordingDisplay, RecordingFan};

use fanbus::app::service::FanController;
use fanbus::adapters::sensor_bus::SimSensorBus;
use fanbus::config::Configuration;

fn run_cycle(
    app: &mut FanController,
    bus: &mut SimSensorBus,
    cfg: &Configuration,
    fan: &mut RecordingFan,
    display: &mut RecordingDisplay,
) {
    app.sample_tick(bus);
    app.control_tick(cfg, fan, display);
}

// ── Warm probe inside the band ────────────────────────────────

#[test]
fn midband_reading_ramps_the_fan_to_half() {
    let cfg = Configuration::defaults(); // threshold 30, hysteresis 5
    let mut app = FanController::new();
    let mut bus = SimSensorBus::new(2);
    bus.set_celsius(0, Some(27.5));
    bus.set_celsius(1, Some(20.0));
    let mut fan = RecordingFan::new();
    let mut display = RecordingDisplay::new();

    run_cycle(&mut app, &mut bus, &cfg, &mut fan, &mut display);

    // The hotter probe drives the law: 27.5 °C → duty 140, 50 %.
    assert_eq!(fan.last_duty(), Some(140));
    assert_eq!(app.output().percent, 50);
    let frame = display.last_frame().unwrap();
    assert_eq!(frame.text.as_str(), "27.5");
    assert_eq!(frame.bar_percent, 50);
}

#[test]
fn cool_bus_keeps_the_fan_off() {
    let cfg = Configuration::defaults();
    let mut app = FanController::new();
    let mut bus = SimSensorBus::new(1);
    bus.set_celsius(0, Some(20.0));
    let mut fan = RecordingFan::new();
    let mut display = RecordingDisplay::new();

    run_cycle(&mut app, &mut bus, &cfg, &mut fan, &mut display);

    assert_eq!(fan.last_duty(), Some(0));
    assert_eq!(app.output().percent, 0);
}

#[test]
fn hot_bus_saturates_the_fan() {
    let cfg = Configuration::defaults();
    let mut app = FanController::new();
    let mut bus = SimSensorBus::new(1);
    bus.set_celsius(0, Some(40.0));
    let mut fan = RecordingFan::new();
    let mut display = RecordingDisplay::new();

    run_cycle(&mut app, &mut bus, &cfg, &mut fan, &mut display);

    assert_eq!(fan.last_duty(), Some(255));
    assert_eq!(app.output().percent, 100);
}

// ── Sensor loss failsafe ──────────────────────────────────────

#[test]
fn probe_loss_forces_max_cooling_and_error_frame() {
    let cfg = Configuration::defaults();
    let mut app = FanController::new();
    let mut bus = SimSensorBus::new(2);
    bus.set_celsius(0, Some(22.0));
    bus.set_celsius(1, Some(23.0));
    let mut fan = RecordingFan::new();
    let mut display = RecordingDisplay::new();

    // Healthy cycle first: cool readings, fan off.
    run_cycle(&mut app, &mut bus, &cfg, &mut fan, &mut display);
    assert_eq!(fan.last_duty(), Some(0));

    // Probe 1 drops off the bus mid-run.
    bus.set_celsius(1, None);
    run_cycle(&mut app, &mut bus, &cfg, &mut fan, &mut display);

    assert_eq!(fan.last_duty(), Some(255));
    assert_eq!(app.output().percent, 100);
    assert_eq!(display.last_frame().unwrap().text.as_str(), "ERR T2");

    // Probe returns; normal control resumes on the next cycle.
    bus.set_celsius(1, Some(23.0));
    run_cycle(&mut app, &mut bus, &cfg, &mut fan, &mut display);
    assert_eq!(fan.last_duty(), Some(0));
    assert_eq!(display.last_frame().unwrap().text.as_str(), "23.0");
}

#[test]
fn empty_bus_fails_safe_from_the_first_cycle() {
    let cfg = Configuration::defaults();
    let mut app = FanController::new();
    let mut bus = SimSensorBus::new(0);
    let mut fan = RecordingFan::new();
    let mut display = RecordingDisplay::new();

    run_cycle(&mut app, &mut bus, &cfg, &mut fan, &mut display);

    assert_eq!(fan.last_duty(), Some(255));
    assert_eq!(app.output().percent, 100);
}

// ── Trend indicators ──────────────────────────────────────────

#[test]
fn steady_temperature_lights_both_arrows() {
    let cfg = Configuration::defaults();
    let mut app = FanController::new();
    let mut bus = SimSensorBus::new(1);
    bus.set_celsius(0, Some(26.0));
    let mut fan = RecordingFan::new();
    let mut display = RecordingDisplay::new();

    run_cycle(&mut app, &mut bus, &cfg, &mut fan, &mut display);
    // First cycle rises from the law's 0.0 starting point.
    assert!(display.last_frame().unwrap().rising);

    run_cycle(&mut app, &mut bus, &cfg, &mut fan, &mut display);
    let frame = display.last_frame().unwrap();
    assert!(frame.rising && frame.falling);

    bus.set_celsius(0, Some(25.0));
    run_cycle(&mut app, &mut bus, &cfg, &mut fan, &mut display);
    let frame = display.last_frame().unwrap();
    assert!(!frame.rising && frame.falling);
}

//! Cooperative main-loop simulation.
//!
//! Replays the firmware's scheduling structure on a simulated millisecond
//! clock: sample and control tickers at their fixed cadences, the register
//! bridge every iteration, the watchdog fed once per iteration, and the
//! restart latch draining through the reset port.

use fanbus::adapters::modbus::RtuRegisterBus;
use fanbus::adapters::nvm::SimNvm;
use fanbus::adapters::restart::SimRestart;
use fanbus::adapters::sensor_bus::SimSensorBus;
use fanbus::app::ports::RegisterIoPort;
use fanbus::app::service::FanController;
use fanbus::drivers::watchdog::Watchdog;
use fanbus::registers::HOLDING_BUS_ADDRESS;
use fanbus::store::ConfigStore;
use fanbus::supervisor::{Supervisor, Ticker, CONTROL_PERIOD_MS};
use fanbus::thermal::SAMPLE_PERIOD_MS;

use crate::mock_hw::{RecordingDisplay, RecordingFan};

const STEP_MS: u64 = 10;

struct SimLoop {
    app: FanController,
    bus: SimSensorBus,
    io: RtuRegisterBus,
    store: ConfigStore<SimNvm>,
    supervisor: Supervisor,
    fan: RecordingFan,
    display: RecordingDisplay,
    watchdog: Watchdog,
    restart: SimRestart,
    sample_ticker: Ticker,
    control_ticker: Ticker,
    now_ms: u64,
    samples: u32,
    controls: u32,
    iterations: u64,
}

impl SimLoop {
    fn new() -> Self {
        let store = ConfigStore::load(SimNvm::new()).unwrap();
        let io = RtuRegisterBus::new(store.config().bus_address as u8);
        let mut bus = SimSensorBus::new(1);
        bus.set_celsius(0, Some(26.0));
        let mut supervisor = Supervisor::new();
        supervisor.mark_running();
        Self {
            app: FanController::new(),
            bus,
            io,
            store,
            supervisor,
            fan: RecordingFan::new(),
            display: RecordingDisplay::new(),
            watchdog: Watchdog::arm(),
            restart: SimRestart::new(),
            sample_ticker: Ticker::new(u64::from(SAMPLE_PERIOD_MS), 0),
            control_ticker: Ticker::new(CONTROL_PERIOD_MS, 0),
            now_ms: 0,
            samples: 0,
            controls: 0,
            iterations: 0,
        }
    }

    /// One loop iteration, mirroring the firmware's `main`.  Returns false
    /// once a restart has been executed.
    fn iterate(&mut self) -> bool {
        if self.sample_ticker.due(self.now_ms) {
            self.app.sample_tick(&mut self.bus);
            self.samples += 1;
        }
        if self.control_ticker.due(self.now_ms) {
            self.app
                .control_tick(self.store.config(), &mut self.fan, &mut self.display);
            self.controls += 1;
        }
        self.app
            .bridge_tick(&mut self.io, &mut self.store, &mut self.supervisor)
            .unwrap();
        self.watchdog.feed();
        self.iterations += 1;
        if self.supervisor.restart_pending() {
            self.supervisor.execute_restart(&mut self.restart);
            return false;
        }
        self.now_ms += STEP_MS;
        true
    }

    fn run_for(&mut self, duration_ms: u64) {
        let end = self.now_ms + duration_ms;
        while self.now_ms < end {
            if !self.iterate() {
                break;
            }
        }
    }
}

#[test]
fn tasks_fire_at_their_cadences() {
    let mut sim = SimLoop::new();
    sim.run_for(10_000);

    // Over t = 0..10 s: sampling fires at 750 ms intervals (last at 9750),
    // control at 1000 ms intervals (last at 9000).
    assert_eq!(sim.samples, 13);
    assert_eq!(sim.controls, 9);
}

#[test]
fn watchdog_is_fed_every_iteration() {
    let mut sim = SimLoop::new();
    sim.run_for(3_000);

    assert_eq!(sim.watchdog.feed_count(), sim.iterations);
    assert_eq!(sim.iterations, 3_000 / STEP_MS);
}

#[test]
fn conversion_requests_track_sampling() {
    let mut sim = SimLoop::new();
    sim.run_for(5_000);

    // Every sample tick ends by kicking off the next conversion.
    assert_eq!(sim.bus.conversion_requests(), sim.samples);
}

#[test]
fn address_write_drains_through_the_reset_port() {
    let mut sim = SimLoop::new();
    sim.run_for(2_000);
    assert!(!sim.restart.was_requested());

    sim.io.set_holding(HOLDING_BUS_ADDRESS, 25).unwrap();
    sim.run_for(1_000);

    assert!(sim.restart.was_requested());
    // The new address is persisted for the post-reset boot.
    let rebooted = ConfigStore::load(sim.store.backend().clone()).unwrap();
    assert_eq!(rebooted.config().bus_address, 25);
}

#[test]
fn stalled_loop_does_not_burst_fire() {
    let mut sim = SimLoop::new();
    sim.run_for(1_000);
    let controls_before = sim.controls;

    // The loop stalls for five control periods (blocking flash write, say).
    sim.now_ms += 5 * CONTROL_PERIOD_MS;
    sim.run_for(50);

    // One catch-up fire, not five.
    assert_eq!(sim.controls, controls_before + 1);
}

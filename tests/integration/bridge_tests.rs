//! Register-surface integration tests.
//!
//! Runs the full bridge cycle against the host-side `RtuRegisterBus` and
//! in-memory NVM: telemetry publication, remote configuration writes (with
//! clamping and persistence), and the slave-address restart handshake.

use fanbus::adapters::nvm::SimNvm;
use fanbus::adapters::modbus::RtuRegisterBus;
use fanbus::adapters::sensor_bus::SimSensorBus;
use fanbus::app::ports::{NvmPort, RegisterIoPort};
use fanbus::app::service::FanController;
use fanbus::config::{Configuration, RECORD_LEN};
use fanbus::registers::{
    input_regs, words_to_celsius, HOLDING_BUS_ADDRESS, HOLDING_ERROR_FLAG, HOLDING_FAN_PERCENT,
    HOLDING_HYSTERESIS, HOLDING_THRESHOLD,
};
use fanbus::store::ConfigStore;
use fanbus::supervisor::Supervisor;

use crate::mock_hw::{RecordingDisplay, RecordingFan};

struct Rig {
    app: FanController,
    bus: SimSensorBus,
    io: RtuRegisterBus,
    store: ConfigStore<SimNvm>,
    supervisor: Supervisor,
    fan: RecordingFan,
    display: RecordingDisplay,
}

impl Rig {
    fn new() -> Self {
        let store = ConfigStore::load(SimNvm::new()).unwrap();
        let io = RtuRegisterBus::new(store.config().bus_address as u8);
        let mut bus = SimSensorBus::new(2);
        bus.set_celsius(0, Some(27.5));
        bus.set_celsius(1, Some(21.25));
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
        }
    }

    /// One full loop iteration: sample, control, bridge.
    fn iterate(&mut self) {
        self.app.sample_tick(&mut self.bus);
        self.app
            .control_tick(self.store.config(), &mut self.fan, &mut self.display);
        self.app
            .bridge_tick(&mut self.io, &mut self.store, &mut self.supervisor)
            .unwrap();
    }

    fn store_backend(&self) -> &SimNvm {
        self.store.backend()
    }
}

// ── Telemetry publication ─────────────────────────────────────

#[test]
fn bridge_publishes_config_telemetry_and_readings() {
    let mut rig = Rig::new();
    rig.iterate();

    assert_eq!(rig.io.holding(HOLDING_BUS_ADDRESS).unwrap(), 20);
    assert_eq!(rig.io.holding(HOLDING_THRESHOLD).unwrap(), 30);
    assert_eq!(rig.io.holding(HOLDING_HYSTERESIS).unwrap(), 5);
    assert_eq!(rig.io.holding(HOLDING_FAN_PERCENT).unwrap(), 50);
    assert_eq!(rig.io.holding(HOLDING_ERROR_FLAG).unwrap(), 0);
}

#[test]
fn error_flag_and_stale_registers_on_probe_loss() {
    let mut rig = Rig::new();
    rig.iterate();

    let (hi_reg, lo_reg) = input_regs(1);
    let before_hi = read_input(&mut rig.io, hi_reg);
    let before_lo = read_input(&mut rig.io, lo_reg);
    assert_eq!(words_to_celsius(before_hi, before_lo), 21.25);

    rig.bus.set_celsius(1, None);
    rig.iterate();

    assert_eq!(rig.io.holding(HOLDING_ERROR_FLAG).unwrap(), 1);
    assert_eq!(rig.io.holding(HOLDING_FAN_PERCENT).unwrap(), 100);
    // The lost probe's registers keep their last published value.
    assert_eq!(read_input(&mut rig.io, hi_reg), before_hi);
    assert_eq!(read_input(&mut rig.io, lo_reg), before_lo);
    // The healthy probe keeps updating.
    let (h0, l0) = input_regs(0);
    assert_eq!(
        words_to_celsius(read_input(&mut rig.io, h0), read_input(&mut rig.io, l0)),
        27.5
    );
}

// ── Remote configuration writes ───────────────────────────────

#[test]
fn remote_threshold_write_is_applied_and_persisted() {
    let mut rig = Rig::new();
    rig.iterate();

    rig.io.set_holding(HOLDING_THRESHOLD, 45).unwrap();
    rig.iterate();

    assert_eq!(rig.store.config().threshold_c, 45);
    // Persisted: a store reloaded from the same backend sees the new value.
    let mut rec = [0u8; RECORD_LEN];
    read_backend(&rig, &mut rec);
    assert_eq!(Configuration::from_record(&rec).threshold_c, 45);
    // No restart for plain config changes.
    assert!(!rig.supervisor.restart_pending());
}

#[test]
fn out_of_range_write_is_clamped_and_read_back() {
    let mut rig = Rig::new();
    rig.iterate();

    rig.io.set_holding(HOLDING_THRESHOLD, 300).unwrap();
    rig.iterate();

    assert_eq!(rig.store.config().threshold_c, 125);
    // The clamped value is what the remote master reads back.
    assert_eq!(rig.io.holding(HOLDING_THRESHOLD).unwrap(), 125);
}

#[test]
fn address_change_persists_before_requesting_restart() {
    let mut rig = Rig::new();
    rig.iterate();

    rig.io.set_holding(HOLDING_BUS_ADDRESS, 21).unwrap();
    rig.iterate();

    assert!(rig.supervisor.restart_pending());
    // The new address is already on the backend when the latch is set.
    let mut rec = [0u8; RECORD_LEN];
    read_backend(&rig, &mut rec);
    assert_eq!(Configuration::from_record(&rec).bus_address, 21);
    // The running bus identity is unchanged until the restart.
    assert_eq!(rig.io.unit_id(), 20);
}

#[test]
fn unchanged_registers_cause_no_nvm_traffic() {
    let mut rig = Rig::new();
    rig.iterate();
    let writes_after_first = backend_writes(&rig);

    rig.iterate();
    rig.iterate();

    assert_eq!(backend_writes(&rig), writes_after_first);
}

// ── helpers ───────────────────────────────────────────────────

fn read_input(io: &mut RtuRegisterBus, reg: u16) -> u16 {
    use rmodbus::client::ModbusRequest;
    use rmodbus::ModbusProto;

    let mut mreq = ModbusRequest::new(io.unit_id(), ModbusProto::Rtu);
    let mut request = Vec::new();
    mreq.generate_get_inputs(reg, 1, &mut request).unwrap();
    let response = io.process_frame(&request).unwrap();
    let mut words = Vec::new();
    mreq.parse_u16(&response, &mut words).unwrap();
    words[0]
}

fn read_backend(rig: &Rig, rec: &mut [u8; RECORD_LEN]) {
    rig.store_backend().read(0, rec).unwrap();
}

fn backend_writes(rig: &Rig) -> u32 {
    rig.store_backend().write_count()
}

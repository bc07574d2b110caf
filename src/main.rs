//! fanbus firmware — main entry point.
//!
//! Hexagonal architecture around one cooperative control loop.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  DallasBusAdapter  RtuRegisterBus  NvsNvm     LogDisplay     │
//! │  (SensorBusPort)   (RegisterIoPort)(NvmPort)  (DisplayPort)  │
//! │  FanPwmDriver      EspRestart      Watchdog   MonotonicClock │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ──────────────────      │
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────────┐    │
//! │  │            FanController (pure logic)                │    │
//! │  │  Sampler · Control law · Register bridge             │    │
//! │  └──────────────────────────────────────────────────────┘    │
//! │                                                              │
//! │  Supervisor (lifecycle + restart latch) · Tickers            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use anyhow::{anyhow, Context};
    use log::{info, warn};

    use esp_idf_hal::delay::{Ets, FreeRtos};
    use esp_idf_hal::gpio::{AnyIOPin, PinDriver};
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};
    use esp_idf_hal::units::Hertz;

    use fanbus::adapters::display::LogDisplay;
    use fanbus::adapters::modbus::{RtuRegisterBus, BAUD_RATE};
    use fanbus::adapters::nvm::NvsNvm;
    use fanbus::adapters::restart::EspRestart;
    use fanbus::adapters::sensor_bus::DallasBusAdapter;
    use fanbus::adapters::time::MonotonicClock;
    use fanbus::app::ports::{DisplayFrame, DisplayPort, RegisterIoPort, SensorBusPort};
    use fanbus::app::service::FanController;
    use fanbus::drivers::fan_pwm::FanPwmDriver;
    use fanbus::drivers::onewire::OneWireBus;
    use fanbus::drivers::{hw_init, watchdog::Watchdog};
    use fanbus::store::ConfigStore;
    use fanbus::supervisor::{Supervisor, Ticker, CONTROL_PERIOD_MS};
    use fanbus::thermal::sampler::SAMPLE_PERIOD_MS;

    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("fanbus v{} starting", env!("CARGO_PKG_VERSION"));

    let peripherals = Peripherals::take().context("peripherals already taken")?;
    hw_init::init_peripherals().map_err(|e| anyhow!("peripheral init failed: {e}"))?;

    let mut display = LogDisplay::new();
    display.present(&DisplayFrame::message("FAN v1.0"));

    // ── 2. Sensor bus enumeration ─────────────────────────────
    let ow_pin = PinDriver::input_output_od(peripherals.pins.gpio6)
        .map_err(|e| anyhow!("1-Wire pin setup failed: {e}"))?;
    let mut sensors = DallasBusAdapter::new(OneWireBus::new(ow_pin, Ets));
    if sensors.sensor_count() == 0 {
        // Not fatal: the failsafe drives the fan flat out and the register
        // surface stays reachable so the fault is remotely visible.
        warn!("no temperature probes found");
    }

    // ── 3. Persisted configuration ────────────────────────────
    let nvm = NvsNvm::new().map_err(|e| anyhow!("NVM init failed: {e}"))?;
    let mut store = ConfigStore::load(nvm).map_err(|e| anyhow!("config load failed: {e}"))?;

    // ── 4. Fieldbus, bound to the persisted slave address ─────
    let uart_config = UartConfig::new().baudrate(Hertz(BAUD_RATE));
    let uart = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio17,
        peripherals.pins.gpio18,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &uart_config,
    )
    .map_err(|e| anyhow!("RS-485 UART setup failed: {e}"))?;
    let mut regio = RtuRegisterBus::new(store.config().bus_address as u8, uart);
    info!("fieldbus bound to unit {}", regio.unit_id());

    // First poll must succeed before the device may enter Running.
    regio
        .poll()
        .map_err(|e| anyhow!("fieldbus init failed: {e}"))?;

    // Armed only now: protocol bring-up can be slower than the timeout.
    let watchdog = Watchdog::arm();

    // ── 5. Control loop ───────────────────────────────────────
    let mut fan = FanPwmDriver::new();
    let mut restarter = EspRestart;
    let clock = MonotonicClock::new();
    let mut app = FanController::new();
    let mut supervisor = Supervisor::new();

    sensors.request_conversion();

    let now = clock.uptime_ms();
    let mut sample_tick = Ticker::new(u64::from(SAMPLE_PERIOD_MS), now);
    let mut control_tick = Ticker::new(CONTROL_PERIOD_MS, now);

    supervisor.mark_running();

    loop {
        let now = clock.uptime_ms();

        if sample_tick.due(now) {
            app.sample_tick(&mut sensors);
        }
        if control_tick.due(now) {
            app.control_tick(store.config(), &mut fan, &mut display);
        }
        if let Err(e) = app.bridge_tick(&mut regio, &mut store, &mut supervisor) {
            warn!("register bridge: {e}");
        }

        // Fed last, after every task had its chance to run.
        watchdog.feed();

        if supervisor.restart_pending() {
            supervisor.execute_restart(&mut restarter);
        }

        FreeRtos::delay_ms(10);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("fanbus targets the ESP32; build with the espidf toolchain and feature");
}

//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ FanController (domain)
//! ```
//!
//! Driven adapters (sensor bus, fan PWM, display, fieldbus, storage)
//! implement these traits.  The [`FanController`](super::service::FanController)
//! consumes them via generics, so the domain core never touches hardware
//! directly and every test runs on the host.

use core::fmt::Write as _;

use crate::error::{BusError, NvmError};

// ───────────────────────────────────────────────────────────────
// Sensor bus port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Multi-drop temperature sensor bus with asynchronous conversions.
///
/// Conversions are request/poll: [`request_conversion`] starts one on every
/// probe and returns immediately; results are collected on the next sampling
/// cycle via [`read_celsius`].  Implementations must never block for the
/// conversion latency.
///
/// [`request_conversion`]: SensorBusPort::request_conversion
/// [`read_celsius`]: SensorBusPort::read_celsius
pub trait SensorBusPort {
    /// Number of probes enumerated at boot.  Fixed for the process lifetime.
    fn sensor_count(&self) -> usize;

    /// Probe the sensor at `index` for presence and latch its scratchpad.
    fn is_connected(&mut self, index: usize) -> bool;

    /// Last conversion result for the sensor at `index`, in °C.
    ///
    /// Only meaningful when the preceding [`is_connected`](Self::is_connected)
    /// call for the same index returned `true`.
    fn read_celsius(&mut self, index: usize) -> f32;

    /// Kick off the next conversion on all probes, without waiting.
    fn request_conversion(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Fan port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// PWM fan output.  Duty is the raw 8-bit level (0 = off, 255 = full).
///
/// Implementations clamp nonzero duties up to the audible-noise floor so the
/// fan never stalls at an inaudible crawl.
pub trait FanPort {
    fn set_duty(&mut self, duty: u8);
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → panel)
// ───────────────────────────────────────────────────────────────

/// What the front panel should show after a control cycle.
///
/// Rendering (glyph layout, segment mapping) is the adapter's business; the
/// domain only decides the contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayFrame {
    /// Main text: temperature as `"{int}.{tenth}"` or `"ERR Tn"`.
    pub text: heapless::String<8>,
    /// Rising-trend indicator.  Both indicators are lit on a flat trend.
    pub rising: bool,
    /// Falling-trend indicator.
    pub falling: bool,
    /// Fan speed bar, 0–100 %.
    pub bar_percent: u8,
}

impl DisplayFrame {
    /// Frame carrying only a text message (boot banner, fault).
    pub fn message(text: &str) -> Self {
        let mut frame = Self::default();
        let _ = write!(frame.text, "{text}");
        frame
    }
}

/// Fire-and-forget presentation sink.
pub trait DisplayPort {
    fn present(&mut self, frame: &DisplayFrame);
}

// ───────────────────────────────────────────────────────────────
// Register I/O port (driven adapter: domain ↔ fieldbus)
// ───────────────────────────────────────────────────────────────

/// Register-mapped fieldbus surface.
///
/// Framing, CRC checking, and the serial transport all live behind this
/// port; the domain sees only numbered 16-bit registers.  `poll` services
/// any pending remote request and applies writes to the holding registers
/// before returning, so a subsequent [`holding`](Self::holding) read
/// observes the remote master's values.
pub trait RegisterIoPort {
    /// Service pending bus traffic.  Non-blocking.
    fn poll(&mut self) -> Result<(), BusError>;

    /// Read one holding register.
    fn holding(&self, reg: u16) -> Result<u16, BusError>;

    /// Write one holding register.
    fn set_holding(&mut self, reg: u16, word: u16) -> Result<(), BusError>;

    /// Write one input (read-only telemetry) register.
    fn set_input(&mut self, reg: u16, word: u16) -> Result<(), BusError>;
}

// ───────────────────────────────────────────────────────────────
// Non-volatile memory port (driven adapter: domain ↔ flash/EEPROM)
// ───────────────────────────────────────────────────────────────

/// Raw byte-addressed persistent region for the configuration record.
///
/// A `write` covers the whole record in one call.  On ESP-IDF the NVS
/// backend commits atomically; raw-EEPROM backends carry a residual
/// torn-record risk on power loss, which the schema tag self-heals on the
/// next boot.
pub trait NvmPort {
    /// Fill `buf` from the region starting at `offset`.
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), NvmError>;

    /// Write `data` to the region starting at `offset`.
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), NvmError>;
}

// ───────────────────────────────────────────────────────────────
// Restart port (driven adapter: domain → reset controller)
// ───────────────────────────────────────────────────────────────

/// Controlled full reset of the device.  The only sanctioned way to rebind
/// boot-time identity such as the fieldbus slave address.
pub trait RestartPort {
    fn restart(&mut self);
}

//! Shared thermal state — the blackboard between sampler and control law.
//!
//! ```text
//!   TemperatureSampler ──writes──▶ ThermalState ◀──reads── ControlLoop
//!                                       ▲
//!                                       └──reads── RegisterBridge
//! ```

/// Maximum number of probes on the sensor bus.
pub const MAX_SENSORS: usize = 2;

/// Sentinel recorded for a disconnected probe.  Below any temperature a
/// DS18B20 can report, so it never wins the max-aggregate.
pub const DISCONNECTED_C: f32 = -127.0;

/// One probe's result from the latest sampling cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// Bus index of the probe (0-based).
    pub index: u8,
    /// Conversion result, or [`DISCONNECTED_C`] when disconnected.
    pub celsius: f32,
    pub connected: bool,
}

/// Direction of the aggregate temperature between control cycles.
///
/// Derived from the tenths-of-a-degree delta with truncation toward zero, so
/// sub-0.1 °C movement reads as `Flat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trend {
    Rising,
    Falling,
    #[default]
    Flat,
}

impl Trend {
    pub fn from_delta_tenths(delta: i32) -> Self {
        match delta {
            d if d > 0 => Self::Rising,
            d if d < 0 => Self::Falling,
            _ => Self::Flat,
        }
    }

    /// Whether the rising indicator is shown.  Lit on `Flat` too: the panel
    /// shows both arrows when the temperature is holding steady.
    pub fn rising_indicator(self) -> bool {
        !matches!(self, Self::Falling)
    }

    /// Whether the falling indicator is shown.  Lit on `Flat` too.
    pub fn falling_indicator(self) -> bool {
        !matches!(self, Self::Rising)
    }
}

/// Latest sampling + control results, shared across the loop's tasks.
#[derive(Debug, Clone)]
pub struct ThermalState {
    /// Per-probe results from the latest sampling cycle.
    pub readings: heapless::Vec<SensorReading, MAX_SENSORS>,
    /// Maximum over all readings (the control input).  Starts at the
    /// sentinel, so with no connected probe it stays there.
    pub max_c: f32,
    /// 0-based index of the last probe found disconnected this cycle.
    pub error_index: Option<u8>,
    /// True when any probe is disconnected or none are enumerated.
    pub any_disconnected: bool,
    /// Trend of `max_c` between control cycles.
    pub trend: Trend,
}

impl Default for ThermalState {
    fn default() -> Self {
        Self::new()
    }
}

impl ThermalState {
    pub fn new() -> Self {
        Self {
            readings: heapless::Vec::new(),
            max_c: DISCONNECTED_C,
            error_index: None,
            any_disconnected: false,
            trend: Trend::Flat,
        }
    }
}

/// What one control cycle decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlOutput {
    /// Raw PWM duty, 0–255.
    pub duty: u8,
    /// Same actuation mapped onto 0–100 % for telemetry and the display bar.
    pub percent: u8,
}

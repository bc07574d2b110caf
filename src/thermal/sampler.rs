//! Periodic temperature sampling over the sensor bus port.
//!
//! Conversions are asynchronous: each cycle collects the results of the
//! conversion requested on the *previous* cycle, then immediately re-arms the
//! next one.  The sampling period therefore only has to cover the probe's
//! conversion latency, and the loop never blocks on it.

use log::warn;

use crate::app::ports::SensorBusPort;
use crate::thermal::state::{SensorReading, ThermalState, DISCONNECTED_C, MAX_SENSORS};

/// DS18B20 conversion resolution.  12 bits is the probe's power-on default.
pub const RESOLUTION_BITS: u8 = 12;

/// Conversion latency for the configured resolution: 750 ms / 2^(12 − bits).
pub const SAMPLE_PERIOD_MS: u32 = 750 / (1 << (12 - RESOLUTION_BITS));

/// Collects conversion results into the shared [`ThermalState`].
#[derive(Debug, Default)]
pub struct TemperatureSampler {
    logged_fault: bool,
}

impl TemperatureSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// One sampling cycle: read every enumerated probe, update the aggregate
    /// and fault markers, and re-arm the next conversion.
    pub fn sample<B: SensorBusPort>(&mut self, bus: &mut B, state: &mut ThermalState) {
        state.readings.clear();
        state.error_index = None;

        let count = bus.sensor_count().min(MAX_SENSORS);
        for index in 0..count {
            let reading = if bus.is_connected(index) {
                SensorReading {
                    index: index as u8,
                    celsius: bus.read_celsius(index),
                    connected: true,
                }
            } else {
                state.error_index = Some(index as u8);
                SensorReading {
                    index: index as u8,
                    celsius: DISCONNECTED_C,
                    connected: false,
                }
            };
            if state.readings.push(reading).is_err() {
                break;
            }
        }

        // Max over all recorded readings; sentinel slots never win.
        let mut max_c = DISCONNECTED_C;
        for r in &state.readings {
            if r.celsius > max_c {
                max_c = r.celsius;
            }
        }
        state.max_c = max_c;

        // An empty bus is a fault too: the controller must fail toward
        // maximum cooling rather than idle blind.
        state.any_disconnected = state.error_index.is_some() || state.readings.is_empty();

        if state.any_disconnected && !self.logged_fault {
            match state.error_index {
                Some(i) => warn!("sensor {} disconnected, failsafe engaged", i),
                None => warn!("no sensors on the bus, failsafe engaged"),
            }
            self.logged_fault = true;
        } else if !state.any_disconnected {
            self.logged_fault = false;
        }

        bus.request_conversion();
    }
}

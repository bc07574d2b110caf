//! Sensor-bus adapters for the [`SensorBusPort`].
//!
//! [`DallasBusAdapter`] drives real DS18B20 probes through the generic
//! 1-Wire driver; it is generic over `embedded-hal` pins so it compiles on
//! every target.  [`SimSensorBus`] is the host-side stand-in with injectable
//! readings and disconnects.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{info, warn};

use crate::app::ports::SensorBusPort;
use crate::drivers::onewire::{scratchpad_celsius, OneWireBus, RomCode, Scratchpad};
use crate::thermal::state::{DISCONNECTED_C, MAX_SENSORS};

// ───────────────────────────────────────────────────────────────
// Hardware adapter
// ───────────────────────────────────────────────────────────────

/// DS18B20 multi-drop bus bound to enumerated ROM codes.
///
/// Presence and data arrive together: `is_connected` reads the probe's
/// scratchpad (which is where a disconnect or CRC failure shows up) and
/// latches it, `read_celsius` decodes the latched copy.  The enumeration is
/// fixed at boot; a probe appearing later is picked up on the next restart.
pub struct DallasBusAdapter<P, D> {
    bus: OneWireBus<P, D>,
    roms: heapless::Vec<RomCode, MAX_SENSORS>,
    scratch: [Option<Scratchpad>; MAX_SENSORS],
}

impl<P, D> DallasBusAdapter<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// Enumerate the bus and set every probe to 12-bit resolution.
    pub fn new(mut bus: OneWireBus<P, D>) -> Self {
        let roms = match bus.search() {
            Ok(roms) => roms,
            Err(e) => {
                warn!("sensor bus enumeration failed: {:?}", e);
                heapless::Vec::new()
            }
        };
        info!("enumerated {} temperature probe(s)", roms.len());

        for rom in &roms {
            if let Err(e) = bus.set_resolution_12bit(rom) {
                warn!("probe {:02x?}: resolution setup failed: {:?}", rom, e);
            }
        }

        Self {
            bus,
            roms,
            scratch: [None; MAX_SENSORS],
        }
    }
}

impl<P, D> SensorBusPort for DallasBusAdapter<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn sensor_count(&self) -> usize {
        self.roms.len()
    }

    fn is_connected(&mut self, index: usize) -> bool {
        let Some(rom) = self.roms.get(index) else {
            return false;
        };
        match self.bus.read_scratchpad(rom) {
            Ok(pad) => {
                self.scratch[index] = Some(pad);
                true
            }
            Err(_) => {
                self.scratch[index] = None;
                false
            }
        }
    }

    fn read_celsius(&mut self, index: usize) -> f32 {
        self.scratch
            .get(index)
            .copied()
            .flatten()
            .map_or(DISCONNECTED_C, |pad| scratchpad_celsius(&pad))
    }

    fn request_conversion(&mut self) {
        if let Err(e) = self.bus.convert_all() {
            warn!("conversion request failed: {:?}", e);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation adapter (host tests)
// ───────────────────────────────────────────────────────────────

/// In-memory sensor bus.  `None` readings simulate a disconnected probe.
#[derive(Debug)]
pub struct SimSensorBus {
    temps: [Option<f32>; MAX_SENSORS],
    count: usize,
    conversions: u32,
}

impl SimSensorBus {
    pub fn new(count: usize) -> Self {
        Self {
            temps: [None; MAX_SENSORS],
            count: count.min(MAX_SENSORS),
            conversions: 0,
        }
    }

    /// Inject a reading, or `None` to pull the probe off the bus.
    pub fn set_celsius(&mut self, index: usize, celsius: Option<f32>) {
        if index < MAX_SENSORS {
            self.temps[index] = celsius;
        }
    }

    /// How many conversion requests the bus has seen.
    pub fn conversion_requests(&self) -> u32 {
        self.conversions
    }
}

impl SensorBusPort for SimSensorBus {
    fn sensor_count(&self) -> usize {
        self.count
    }

    fn is_connected(&mut self, index: usize) -> bool {
        index < self.count && self.temps[index].is_some()
    }

    fn read_celsius(&mut self, index: usize) -> f32 {
        self.temps
            .get(index)
            .copied()
            .flatten()
            .unwrap_or(DISCONNECTED_C)
    }

    fn request_conversion(&mut self) {
        self.conversions += 1;
    }
}

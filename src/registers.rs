//! Fieldbus register map and the bridge that services it.
//!
//! The controller exposes a small register-mapped surface:
//!
//! | register | kind    | contents                                   |
//! |----------|---------|--------------------------------------------|
//! | 0        | holding | fieldbus slave address                     |
//! | 1        | holding | fan activation threshold, °C               |
//! | 2        | holding | hysteresis band width, °C                  |
//! | 3        | holding | fan speed, percent                         |
//! | 4        | holding | sensor error flag (0/1)                    |
//! | 2n, 2n+1 | input   | sensor n °C as f32 bits, high word first   |
//!
//! Registers 0–2 are remotely writable configuration; 3 and 4 are telemetry
//! that the bridge republishes every cycle, so remote writes to them are
//! overwritten immediately.
//!
//! The bridge diffs the writable holdings against the cached configuration
//! once per loop iteration.  Any change is persisted before a restart is
//! requested, so a new slave address takes effect exactly once, at the next
//! boot, and is never lost to the reset.

use log::info;

use crate::app::ports::RegisterIoPort;
use crate::config::ConfigField;
use crate::error::Error;
use crate::store::ConfigStore;
use crate::thermal::state::{ControlOutput, ThermalState, MAX_SENSORS};

pub const HOLDING_BUS_ADDRESS: u16 = 0;
pub const HOLDING_THRESHOLD: u16 = 1;
pub const HOLDING_HYSTERESIS: u16 = 2;
pub const HOLDING_FAN_PERCENT: u16 = 3;
pub const HOLDING_ERROR_FLAG: u16 = 4;

/// Number of holding registers exposed.
pub const HOLDING_COUNT: usize = 5;
/// Number of input registers exposed (two words per sensor).
pub const INPUT_COUNT: usize = 2 * MAX_SENSORS;

/// The remotely writable holdings and the config fields they map to.
const WRITABLE: [(u16, ConfigField); 3] = [
    (HOLDING_BUS_ADDRESS, ConfigField::BusAddress),
    (HOLDING_THRESHOLD, ConfigField::ThresholdC),
    (HOLDING_HYSTERESIS, ConfigField::HysteresisC),
];

/// Input register pair for one sensor: (high word, low word).
pub const fn input_regs(sensor: usize) -> (u16, u16) {
    ((2 * sensor) as u16, (2 * sensor + 1) as u16)
}

/// Split a temperature into its register words, high half first.
pub fn celsius_to_words(celsius: f32) -> (u16, u16) {
    let bits = celsius.to_bits();
    ((bits >> 16) as u16, bits as u16)
}

/// Reassemble a temperature from its register words.
pub fn words_to_celsius(high: u16, low: u16) -> f32 {
    f32::from_bits((u32::from(high) << 16) | u32::from(low))
}

/// What one bridge cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeOutcome {
    /// Nothing changed remotely.
    Idle,
    /// Remote configuration writes were accepted and persisted.
    ConfigPersisted,
    /// The slave address changed; persisted, restart needed to rebind.
    RestartRequired,
}

/// Publishes state to the register surface and applies remote writes.
#[derive(Debug, Default)]
pub struct RegisterBridge {
    seeded: bool,
}

impl RegisterBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the cached configuration into the holdings.  Must happen before
    /// the first diff: the registers power up zeroed, and diffing against
    /// zeros would wipe the configuration.
    pub fn seed<R, N>(&mut self, io: &mut R, store: &ConfigStore<N>) -> Result<(), Error>
    where
        R: RegisterIoPort,
        N: crate::app::ports::NvmPort,
    {
        let cfg = store.config();
        io.set_holding(HOLDING_BUS_ADDRESS, cfg.bus_address as u16)?;
        io.set_holding(HOLDING_THRESHOLD, u16::from(cfg.threshold_c))?;
        io.set_holding(HOLDING_HYSTERESIS, u16::from(cfg.hysteresis_c))?;
        io.set_holding(HOLDING_FAN_PERCENT, 0)?;
        io.set_holding(HOLDING_ERROR_FLAG, 0)?;
        self.seeded = true;
        Ok(())
    }

    /// One bridge cycle: poll the bus, fold remote writes into the store,
    /// persist if anything changed, then republish state.
    pub fn service<R, N>(
        &mut self,
        io: &mut R,
        store: &mut ConfigStore<N>,
        state: &ThermalState,
        out: ControlOutput,
    ) -> Result<BridgeOutcome, Error>
    where
        R: RegisterIoPort,
        N: crate::app::ports::NvmPort,
    {
        if !self.seeded {
            self.seed(io, store)?;
        }

        io.poll()?;

        let mut changed = false;
        let mut address_changed = false;
        for (reg, field) in WRITABLE {
            let raw = i32::from(io.holding(reg)?);
            if store.set(field, raw) {
                info!("remote config write: reg {} = {}", reg, raw);
                changed = true;
                if field == ConfigField::BusAddress {
                    address_changed = true;
                }
            }
        }

        // Persist before reporting the address change; the restart that
        // follows must find the new address already on flash.
        if changed {
            store.persist()?;
        }

        self.publish(io, store, state, out)?;

        Ok(if address_changed {
            BridgeOutcome::RestartRequired
        } else if changed {
            BridgeOutcome::ConfigPersisted
        } else {
            BridgeOutcome::Idle
        })
    }

    fn publish<R, N>(
        &self,
        io: &mut R,
        store: &ConfigStore<N>,
        state: &ThermalState,
        out: ControlOutput,
    ) -> Result<(), Error>
    where
        R: RegisterIoPort,
        N: crate::app::ports::NvmPort,
    {
        let cfg = store.config();
        // Clamped values become visible to the remote master on read-back.
        io.set_holding(HOLDING_BUS_ADDRESS, cfg.bus_address as u16)?;
        io.set_holding(HOLDING_THRESHOLD, u16::from(cfg.threshold_c))?;
        io.set_holding(HOLDING_HYSTERESIS, u16::from(cfg.hysteresis_c))?;
        io.set_holding(HOLDING_FAN_PERCENT, u16::from(out.percent))?;
        io.set_holding(HOLDING_ERROR_FLAG, u16::from(state.any_disconnected))?;

        // Disconnected sensors keep their last published (stale) words; the
        // error flag is the authoritative disconnect signal.
        for r in &state.readings {
            if r.connected {
                let (hi_reg, lo_reg) = input_regs(usize::from(r.index));
                let (hi, lo) = celsius_to_words(r.celsius);
                io.set_input(hi_reg, hi)?;
                io.set_input(lo_reg, lo)?;
            }
        }
        Ok(())
    }
}

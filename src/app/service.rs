//! Application service — the hexagonal core.
//!
//! [`FanController`] owns the sampler, control law, register bridge, and the
//! shared thermal state.  It exposes a clean, hardware-agnostic API.  All
//! I/O flows through port traits injected at call sites, making the entire
//! service testable with mock adapters.
//!
//! ```text
//! SensorBusPort ──▶ ┌──────────────────────────┐ ──▶ FanPort
//!                   │      FanController        │ ──▶ DisplayPort
//! RegisterIoPort ◀──│ Sampler · Law · Bridge    │
//!                   └──────────────────────────┘
//! ```

use core::fmt::Write as _;

use crate::config::Configuration;
use crate::error::Error;
use crate::registers::{BridgeOutcome, RegisterBridge};
use crate::store::ConfigStore;
use crate::supervisor::Supervisor;
use crate::thermal::{ControlLoop, ControlOutput, TemperatureSampler, ThermalState};

use super::ports::{
    DisplayFrame, DisplayPort, FanPort, NvmPort, RegisterIoPort, SensorBusPort,
};

/// The application service orchestrates one device's control loop.
///
/// The three `*_tick` methods are the loop's tasks: sampling at the
/// conversion period, control at the control period, and the bridge every
/// iteration.  They share state through `self`, never through the ports.
pub struct FanController {
    sampler: TemperatureSampler,
    law: ControlLoop,
    bridge: RegisterBridge,
    state: ThermalState,
    output: ControlOutput,
}

impl Default for FanController {
    fn default() -> Self {
        Self::new()
    }
}

impl FanController {
    pub fn new() -> Self {
        Self {
            sampler: TemperatureSampler::new(),
            law: ControlLoop::new(),
            bridge: RegisterBridge::new(),
            state: ThermalState::new(),
            output: ControlOutput::default(),
        }
    }

    /// Sampling task: collect conversion results and re-arm the bus.
    pub fn sample_tick<B: SensorBusPort>(&mut self, bus: &mut B) {
        self.sampler.sample(bus, &mut self.state);
    }

    /// Control task: run the law, actuate the fan, refresh the panel.
    pub fn control_tick<F, D>(&mut self, cfg: &Configuration, fan: &mut F, display: &mut D)
    where
        F: FanPort,
        D: DisplayPort,
    {
        self.output = self.law.tick(&mut self.state, cfg);
        fan.set_duty(self.output.duty);
        display.present(&build_frame(&self.state, self.output));
    }

    /// Bridge task: publish state, fold in remote writes, escalate an
    /// address change into a restart request.
    pub fn bridge_tick<R, N>(
        &mut self,
        io: &mut R,
        store: &mut ConfigStore<N>,
        supervisor: &mut Supervisor,
    ) -> Result<(), Error>
    where
        R: RegisterIoPort,
        N: NvmPort,
    {
        if self.bridge.service(io, store, &self.state, self.output)?
            == BridgeOutcome::RestartRequired
        {
            supervisor.request_restart();
        }
        Ok(())
    }

    pub fn thermal_state(&self) -> &ThermalState {
        &self.state
    }

    pub fn output(&self) -> ControlOutput {
        self.output
    }
}

/// Compose the panel contents for the latest cycle.
fn build_frame(state: &ThermalState, out: ControlOutput) -> DisplayFrame {
    let mut frame = DisplayFrame {
        rising: state.trend.rising_indicator(),
        falling: state.trend.falling_indicator(),
        bar_percent: out.percent,
        ..DisplayFrame::default()
    };

    if let Some(index) = state.error_index {
        // Probes are labelled T1.. on the silkscreen.
        let _ = write!(frame.text, "ERR T{}", index + 1);
    } else {
        let whole = state.max_c as i32;
        let tenth = ((state.max_c * 10.0) as i32 % 10).unsigned_abs();
        let _ = write!(frame.text, "{whole}.{tenth}");
    }
    frame
}

//! Thermal domain core — sampling and the fan control law.
//!
//! Pure logic over the [`state`] blackboard.  The sampler fills it from the
//! sensor bus port each conversion period; the control law reads it once per
//! control period and produces an actuation output.  No I/O happens here.

pub mod control;
pub mod sampler;
pub mod state;

pub use control::{ControlLoop, MAX_DUTY, MIN_DUTY};
pub use sampler::{TemperatureSampler, SAMPLE_PERIOD_MS};
pub use state::{ControlOutput, SensorReading, ThermalState, Trend, DISCONNECTED_C, MAX_SENSORS};

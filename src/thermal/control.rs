//! The fan control law: hysteresis band with linear interpolation.
//!
//! ```text
//!             duty
//!   255 ┤                 ┌─────────
//!       │                /
//!       │               /
//!    25 ┤              /
//!     0 ┤─────────────┘
//!       └──────────────┬──┬──────── max °C
//!                   T−H   T
//! ```
//!
//! Below the band the fan is off; inside it the duty interpolates linearly
//! from `MIN_DUTY` to `MAX_DUTY`; at or above the threshold it saturates.
//! Any sensor fault overrides everything with maximum cooling.
//!
//! The interpolation runs in integer hundredths of a degree with truncating
//! division, so register telemetry is bit-stable across releases.

use crate::config::Configuration;
use crate::thermal::state::{ControlOutput, ThermalState, Trend};

/// Lowest nonzero duty.  Below this the fan hums without moving air.
pub const MIN_DUTY: u8 = 25;
/// Full-scale duty.
pub const MAX_DUTY: u8 = 255;

/// Stateful control law.  Carries the previous aggregate for trend detection.
#[derive(Debug)]
pub struct ControlLoop {
    last_max_c: f32,
}

impl Default for ControlLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlLoop {
    pub fn new() -> Self {
        Self { last_max_c: 0.0 }
    }

    /// One control cycle: update the trend, then decide the actuation.
    pub fn tick(&mut self, state: &mut ThermalState, cfg: &Configuration) -> ControlOutput {
        // Trend in tenths of a degree, truncation toward zero.  Sub-0.1 °C
        // movement reads as flat.
        let delta = (state.max_c * 10.0) as i32 - (self.last_max_c * 10.0) as i32;
        state.trend = Trend::from_delta_tenths(delta);
        self.last_max_c = state.max_c;

        if state.any_disconnected {
            // Failsafe: a blind controller must cool, not idle.
            return ControlOutput {
                duty: MAX_DUTY,
                percent: 100,
            };
        }

        let threshold = i32::from(cfg.threshold_c);
        let floor = cfg.band_floor_c();
        let t_hundredths = i64::from((state.max_c * 100.0) as i32);

        let duty = if t_hundredths >= i64::from(threshold) * 100 {
            // Saturated.  Also covers the degenerate zero-width band, which
            // would otherwise divide by zero in the interpolation.
            MAX_DUTY
        } else if t_hundredths < i64::from(floor) * 100 {
            0
        } else {
            map_range(
                t_hundredths,
                i64::from(floor) * 100,
                i64::from(threshold) * 100,
                i64::from(MIN_DUTY),
                i64::from(MAX_DUTY),
            ) as u8
        };

        let percent = if duty == 0 {
            0
        } else {
            map_range(
                i64::from(duty),
                i64::from(MIN_DUTY),
                i64::from(MAX_DUTY),
                0,
                100,
            ) as u8
        };

        ControlOutput { duty, percent }
    }
}

/// Linear re-map with truncating integer division.
fn map_range(x: i64, in_min: i64, in_max: i64, out_min: i64, out_max: i64) -> i64 {
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

//! Fan PWM driver (LEDC channel 0).
//!
//! Implements [`FanPort`] with the noise-floor clamp: any nonzero command is
//! raised to `MIN_DUTY`, below which the fan hums without moving air.

use log::debug;

use crate::app::ports::FanPort;
use crate::drivers::hw_init::{self, LEDC_CH_FAN};
use crate::thermal::MIN_DUTY;

pub struct FanPwmDriver {
    duty: u8,
}

impl Default for FanPwmDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FanPwmDriver {
    pub fn new() -> Self {
        Self { duty: 0 }
    }

    /// Last duty written to the channel (after clamping).
    pub fn current_duty(&self) -> u8 {
        self.duty
    }
}

impl FanPort for FanPwmDriver {
    fn set_duty(&mut self, duty: u8) {
        let duty = if duty == 0 { 0 } else { duty.max(MIN_DUTY) };
        if duty != self.duty {
            debug!("fan duty {} -> {}", self.duty, duty);
            hw_init::ledc_set(LEDC_CH_FAN, duty);
            self.duty = duty;
        }
    }
}

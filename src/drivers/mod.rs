//! Peripheral drivers and one-shot hardware initialisation.

pub mod fan_pwm;
pub mod hw_init;
pub mod onewire;
pub mod watchdog;

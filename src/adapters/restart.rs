//! Reset-controller adapters for the [`RestartPort`].

use crate::app::ports::RestartPort;

/// Full chip reset through ESP-IDF.  Does not return.
#[cfg(target_os = "espidf")]
pub struct EspRestart;

#[cfg(target_os = "espidf")]
impl RestartPort for EspRestart {
    fn restart(&mut self) {
        unsafe { esp_idf_svc::sys::esp_restart() };
    }
}

/// Host-side restart latch: records the request instead of resetting.
#[derive(Debug, Default)]
pub struct SimRestart {
    requested: bool,
}

impl SimRestart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn was_requested(&self) -> bool {
        self.requested
    }
}

impl RestartPort for SimRestart {
    fn restart(&mut self) {
        self.requested = true;
    }
}

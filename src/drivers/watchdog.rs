//! Task Watchdog Timer (TWDT) driver.
//!
//! Wraps the ESP-IDF TWDT API to reset the device if the control loop
//! stalls for more than 5 seconds.  Armed only after the fieldbus answered
//! its first poll, so a slow protocol bring-up cannot trip it.
//!
//! The main loop must call `feed()` once per iteration, after all
//! per-iteration work.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

/// Loop-stall timeout.  Several times the slowest task period.
pub const WATCHDOG_TIMEOUT_MS: u32 = 5_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    #[cfg(not(target_os = "espidf"))]
    feeds: core::cell::Cell<u64>,
}

impl Watchdog {
    /// Configure the TWDT and subscribe the current task.
    #[cfg(target_os = "espidf")]
    pub fn arm() -> Self {
        unsafe {
            let cfg = esp_task_wdt_config_t {
                timeout_ms: WATCHDOG_TIMEOUT_MS,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            let ret = esp_task_wdt_reconfigure(&cfg);
            if ret != ESP_OK {
                log::warn!(
                    "TWDT reconfigure returned {} (may already be configured)",
                    ret
                );
            }

            let ret = esp_task_wdt_add(core::ptr::null_mut());
            let subscribed = ret == ESP_OK;
            if subscribed {
                info!(
                    "watchdog armed ({} ms timeout, panic on trigger)",
                    WATCHDOG_TIMEOUT_MS
                );
            } else {
                log::warn!("watchdog subscribe failed ({})", ret);
            }

            Self { subscribed }
        }
    }

    /// Host-side watchdog: counts feeds instead of timing them.
    #[cfg(not(target_os = "espidf"))]
    pub fn arm() -> Self {
        log::info!("watchdog(sim): counting feeds");
        Self {
            feeds: core::cell::Cell::new(0),
        }
    }

    /// Feed the watchdog.  Must be called at least every timeout period.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
        #[cfg(not(target_os = "espidf"))]
        self.feeds.set(self.feeds.get() + 1);
    }

    /// Number of feeds since arming (host only).
    #[cfg(not(target_os = "espidf"))]
    pub fn feed_count(&self) -> u64 {
        self.feeds.get()
    }
}

//! Process lifecycle and cooperative scheduling.
//!
//! The firmware runs as a single cooperative loop; the only preemptive actor
//! is the hardware watchdog.  The [`Supervisor`] tracks the lifecycle
//! (`Booting → Running → RestartRequested`) and turns a latched restart
//! request into a controlled reset through the [`RestartPort`].  [`Ticker`]s
//! give each periodic task its fixed cadence on a shared monotonic clock.

use log::{info, warn};

use crate::app::ports::RestartPort;

/// Control-law cadence.
pub const CONTROL_PERIOD_MS: u64 = 1_000;

// ───────────────────────────────────────────────────────────────
// Lifecycle
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Peripherals coming up; the loop is not running yet.
    Booting,
    /// Normal operation.
    Running,
    /// A reset is latched; the loop finishes its iteration, then restarts.
    RestartRequested,
}

#[derive(Debug)]
pub struct Supervisor {
    state: RunState,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            state: RunState::Booting,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Boot finished; the loop takes over.
    pub fn mark_running(&mut self) {
        if self.state == RunState::Booting {
            info!("boot complete, entering control loop");
            self.state = RunState::Running;
        }
    }

    /// Latch a restart.  The latch is sticky: once requested, nothing short
    /// of the reset itself clears it.
    pub fn request_restart(&mut self) {
        if self.state != RunState::RestartRequested {
            warn!("restart requested");
            self.state = RunState::RestartRequested;
        }
    }

    pub fn restart_pending(&self) -> bool {
        self.state == RunState::RestartRequested
    }

    /// Hand control to the reset controller.  On hardware this call does not
    /// return.
    pub fn execute_restart<R: RestartPort>(&mut self, restarter: &mut R) {
        info!("restarting");
        restarter.restart();
    }
}

// ───────────────────────────────────────────────────────────────
// Fixed-period task scheduling
// ───────────────────────────────────────────────────────────────

/// Fires at a fixed period on a caller-supplied monotonic millisecond clock.
///
/// Late polls fire once and reschedule from the *current* time, so a stalled
/// loop does not burst-fire to catch up.
#[derive(Debug)]
pub struct Ticker {
    period_ms: u64,
    next_ms: u64,
}

impl Ticker {
    pub fn new(period_ms: u64, now_ms: u64) -> Self {
        Self {
            period_ms,
            next_ms: now_ms + period_ms,
        }
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// True when the period has elapsed; rearms on firing.
    pub fn due(&mut self, now_ms: u64) -> bool {
        if now_ms >= self.next_ms {
            self.next_ms = now_ms + self.period_ms;
            true
        } else {
            false
        }
    }
}

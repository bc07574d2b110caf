//! Log-backed display adapter.
//!
//! The controller's panel bus is board-specific; until a board profile
//! provides a real renderer, frames go to the serial log.  Presentation is
//! fire-and-forget, so a missing or broken panel can never stall the loop.

use log::info;

use crate::app::ports::{DisplayFrame, DisplayPort};

pub struct LogDisplay {
    last: Option<DisplayFrame>,
}

impl Default for LogDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl LogDisplay {
    pub fn new() -> Self {
        Self { last: None }
    }
}

impl DisplayPort for LogDisplay {
    fn present(&mut self, frame: &DisplayFrame) {
        // The panel repaints every cycle; the log only shows changes.
        if self.last.as_ref() == Some(frame) {
            return;
        }
        let trend = match (frame.rising, frame.falling) {
            (true, true) => "=",
            (true, false) => "^",
            (false, true) => "v",
            (false, false) => " ",
        };
        info!("panel | {:<8} {} {:>3}%", frame.text.as_str(), trend, frame.bar_percent);
        self.last = Some(frame.clone());
    }
}

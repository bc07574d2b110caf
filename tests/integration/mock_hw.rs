//! Mock hardware adapters for integration tests.
//!
//! Records every fan command and display frame so tests can assert on the
//! full actuation history without touching real GPIO/PWM registers.  The
//! sensor bus, NVM, and fieldbus come from the crate's own simulation
//! adapters (`SimSensorBus`, `SimNvm`, host-side `RtuRegisterBus`).

use fanbus::app::ports::{DisplayFrame, DisplayPort, FanPort};

// ── Fan recorder ──────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingFan {
    pub duties: Vec<u8>,
}

#[allow(dead_code)]
impl RecordingFan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_duty(&self) -> Option<u8> {
        self.duties.last().copied()
    }
}

impl FanPort for RecordingFan {
    fn set_duty(&mut self, duty: u8) {
        self.duties.push(duty);
    }
}

// ── Display recorder ──────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub frames: Vec<DisplayFrame>,
}

#[allow(dead_code)]
impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<&DisplayFrame> {
        self.frames.last()
    }
}

impl DisplayPort for RecordingDisplay {
    fn present(&mut self, frame: &DisplayFrame) {
        self.frames.push(frame.clone());
    }
}

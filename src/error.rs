//! Unified error types for the fanbus firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level control loop's error handling uniform.  All variants are `Copy`
//! so they can be cheaply passed around without allocation.
//!
//! Sensor loss is recoverable and handled per sampling cycle, persistence and
//! fieldbus faults are surfaced to the loop, and peripheral init failures are
//! fatal at boot.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or dropped off the bus.
    Sensor(SensorError),
    /// Non-volatile memory access failed.
    Nvm(NvmError),
    /// Fieldbus register access or frame processing failed.
    Bus(BusError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Nvm(e) => write!(f, "nvm: {e}"),
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Sensor-bus failures.  Disconnection is never fatal: it degrades the
/// thermal state and drives the failsafe, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor at the given index did not answer on the bus.
    Disconnected(u8),
    /// No presence pulse, the whole bus is dead or empty.
    BusUnresponsive,
    /// Scratchpad data failed its CRC check.
    CrcMismatch,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected(idx) => write!(f, "sensor {idx} disconnected"),
            Self::BusUnresponsive => write!(f, "sensor bus unresponsive"),
            Self::CrcMismatch => write!(f, "scratchpad CRC mismatch"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Non-volatile memory errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NvmError {
    /// Access past the end of the persistent region.
    OutOfBounds,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for NvmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "access out of bounds"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<NvmError> for Error {
    fn from(e: NvmError) -> Self {
        Self::Nvm(e)
    }
}

// ---------------------------------------------------------------------------
// Fieldbus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Register read/write rejected by the protocol context.
    Register,
    /// Request frame could not be parsed or a response could not be built.
    Frame,
    /// Serial transport failure.
    Io,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register => write!(f, "register access rejected"),
            Self::Frame => write!(f, "malformed frame"),
            Self::Io => write!(f, "serial I/O error"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

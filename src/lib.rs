//! fanbus firmware library.
//!
//! Closed-loop thermal fan controller: DS18B20 sampling, hysteresis-band
//! control, a Modbus RTU register surface, and NVM-persisted configuration,
//! all driven by one watchdog-supervised cooperative loop.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod registers;
pub mod store;
pub mod supervisor;
pub mod thermal;

pub mod pins;

// The hardware implementations inside are guarded by cfg attributes; the
// simulation backends compile everywhere.
pub mod adapters;
pub mod drivers;

//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the fanbus controller:
//! sampling orchestration, the control law, register publication, and the
//! persistence discipline.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod ports;
pub mod service;

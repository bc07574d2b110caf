//! GPIO / peripheral pin assignments for the fanbus controller board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Fan (4-wire PWM, LEDC-driven)
// ---------------------------------------------------------------------------

/// LEDC PWM output to the fan control wire.
pub const FAN_PWM_GPIO: i32 = 7;

// ---------------------------------------------------------------------------
// Temperature sensor bus (1-Wire, open-drain with external pull-up)
// ---------------------------------------------------------------------------

/// Shared 1-Wire data line for all DS18B20 probes.
pub const ONE_WIRE_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Fieldbus (RS-485 half-duplex via MAX485-class transceiver)
// ---------------------------------------------------------------------------

pub const RS485_TX_GPIO: i32 = 17;
pub const RS485_RX_GPIO: i32 = 18;
/// Driver-enable: HIGH while transmitting, LOW to release the bus.
pub const RS485_DE_GPIO: i32 = 3;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC base frequency for the fan (25 kHz — inaudible).
pub const FAN_PWM_FREQ_HZ: u32 = 25_000;

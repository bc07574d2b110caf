//! Multi-drop 1-Wire bus driver for DS18B20 probes.
//!
//! Synchronous bit-banged driver, architecture-agnostic over `embedded-hal`
//! pin and delay traits.  Synchronous to meet the bus's strict timing
//! requirements; the *conversion* is still asynchronous at the protocol
//! level (`convert_all` broadcasts Convert T and returns without waiting).
//!
//! Supports several probes on one line: ROM enumeration via the Maxim
//! Search ROM algorithm and per-probe addressing via Match ROM.
//!
//! For detailed specifications, refer to the DS18B20 datasheet and Maxim
//! application note 187 (1-Wire search algorithm).

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::thermal::state::MAX_SENSORS;

// Timing for reset and presence detection on the 1-Wire bus.
const RESET_LOW_US: u32 = 480;
const PRESENCE_WAIT_US: u32 = 70;
const PRESENCE_RELEASE_US: u32 = 410;

// Timing for writing logic 1 and 0 bits to the bus.
const WRITE_1_LOW_US: u32 = 6;
const WRITE_1_HIGH_US: u32 = 64;
const WRITE_0_LOW_US: u32 = 60;
const WRITE_0_HIGH_US: u32 = 10;

// Timing for reading a bit from the bus (init, sample, recovery).
const READ_INIT_LOW_US: u32 = 6;
const READ_SAMPLE_US: u32 = 9;
const READ_RECOVERY_US: u32 = 55;

// ROM and function commands.
const CMD_SEARCH_ROM: u8 = 0xF0;
const CMD_MATCH_ROM: u8 = 0x55;
const CMD_SKIP_ROM: u8 = 0xCC;
const CMD_CONVERT_T: u8 = 0x44;
const CMD_WRITE_SCRATCHPAD: u8 = 0x4E;
const CMD_READ_SCRATCHPAD: u8 = 0xBE;

// Scratchpad configuration byte for 12-bit resolution.
const CONFIG_12BIT: u8 = 0x7F;

// Each LSB of the 12-bit temperature register is 0.0625 °C.
const TEMPERATURE_RESOLUTION_C_PER_LSB: f32 = 0.0625;

/// 64-bit ROM code: family byte, 48-bit serial, CRC.
pub type RomCode = [u8; 8];

/// 9-byte scratchpad image: temperature, alarm, config, CRC.
pub type Scratchpad = [u8; 9];

/// Errors that may occur when talking to the bus.
#[derive(Debug)]
pub enum OneWireError<E> {
    /// GPIO pin I/O failed.
    Pin(E),
    /// No presence pulse, no device on the bus.
    NoPresence,
    /// Received data failed its CRC check.
    CrcMismatch,
}

impl<E> From<E> for OneWireError<E> {
    fn from(e: E) -> Self {
        OneWireError::Pin(e)
    }
}

/// The shared bus.  One open-drain pin, externally pulled up.
pub struct OneWireBus<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> OneWireBus<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    #[must_use]
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    /// Bus reset; returns whether any device answered with a presence pulse.
    pub fn reset(&mut self) -> Result<bool, OneWireError<P::Error>> {
        self.pin.set_low()?;
        self.delay.delay_us(RESET_LOW_US);

        self.pin.set_high()?;
        self.delay.delay_us(PRESENCE_WAIT_US);

        // A device pulls the line low to indicate presence.
        let present = self.pin.is_low()?;
        self.delay.delay_us(PRESENCE_RELEASE_US);

        Ok(present)
    }

    /// Broadcast Convert T to every probe and return immediately.  Results
    /// are ready after the conversion latency (750 ms at 12 bits).
    pub fn convert_all(&mut self) -> Result<(), OneWireError<P::Error>> {
        if !self.reset()? {
            return Err(OneWireError::NoPresence);
        }
        self.write_byte(CMD_SKIP_ROM)?;
        self.write_byte(CMD_CONVERT_T)?;
        Ok(())
    }

    /// Read and CRC-verify one probe's scratchpad.
    pub fn read_scratchpad(&mut self, rom: &RomCode) -> Result<Scratchpad, OneWireError<P::Error>> {
        if !self.reset()? {
            return Err(OneWireError::NoPresence);
        }
        self.write_byte(CMD_MATCH_ROM)?;
        for &b in rom {
            self.write_byte(b)?;
        }
        self.write_byte(CMD_READ_SCRATCHPAD)?;

        let mut data: Scratchpad = [0; 9];
        for b in &mut data {
            *b = self.read_byte()?;
        }

        if crc8(&data[0..8]) != data[8] {
            return Err(OneWireError::CrcMismatch);
        }
        Ok(data)
    }

    /// Write one probe's configuration register for 12-bit conversions.
    /// Alarm thresholds are left at their widest.
    pub fn set_resolution_12bit(&mut self, rom: &RomCode) -> Result<(), OneWireError<P::Error>> {
        if !self.reset()? {
            return Err(OneWireError::NoPresence);
        }
        self.write_byte(CMD_MATCH_ROM)?;
        for &b in rom {
            self.write_byte(b)?;
        }
        self.write_byte(CMD_WRITE_SCRATCHPAD)?;
        self.write_byte(0x7F)?; // TH
        self.write_byte(0x80)?; // TL
        self.write_byte(CONFIG_12BIT)?;
        Ok(())
    }

    /// Enumerate ROM codes with the Maxim search algorithm.  CRC-invalid
    /// codes (glitched search) are skipped.
    pub fn search(&mut self) -> Result<heapless::Vec<RomCode, MAX_SENSORS>, OneWireError<P::Error>> {
        let mut found: heapless::Vec<RomCode, MAX_SENSORS> = heapless::Vec::new();
        let mut rom: RomCode = [0; 8];
        let mut last_discrepancy: u8 = 0;

        loop {
            if !self.reset()? {
                // An empty bus is a valid enumeration result.
                return Ok(found);
            }
            self.write_byte(CMD_SEARCH_ROM)?;

            let mut discrepancy_marker: u8 = 0;
            for bit_index in 1..=64u8 {
                let bit_true = self.read_bit()?;
                let bit_complement = self.read_bit()?;

                let bit = match (bit_true, bit_complement) {
                    // No device responded to this bit; abort the pass.
                    (true, true) => return Ok(found),
                    (b, _) if bit_true != bit_complement => b,
                    // Both zero: devices disagree at this position.
                    _ => {
                        if bit_index == last_discrepancy {
                            true
                        } else if bit_index > last_discrepancy {
                            discrepancy_marker = bit_index;
                            false
                        } else {
                            let prev = rom_bit(&rom, bit_index);
                            if !prev {
                                discrepancy_marker = bit_index;
                            }
                            prev
                        }
                    }
                };

                set_rom_bit(&mut rom, bit_index, bit);
                self.write_bit(bit)?;
            }

            if crc8(&rom[0..7]) == rom[7] && found.push(rom).is_err() {
                // Capacity reached; further probes are ignored.
                return Ok(found);
            }

            last_discrepancy = discrepancy_marker;
            if last_discrepancy == 0 {
                return Ok(found);
            }
        }
    }

    // ── Bit-level primitives ──────────────────────────────────

    fn write_bit(&mut self, bit: bool) -> Result<(), OneWireError<P::Error>> {
        if bit {
            // Logic 1: short low pulse.
            self.pin.set_low()?;
            self.delay.delay_us(WRITE_1_LOW_US);
            self.pin.set_high()?;
            self.delay.delay_us(WRITE_1_HIGH_US);
        } else {
            // Logic 0: long low pulse.
            self.pin.set_low()?;
            self.delay.delay_us(WRITE_0_LOW_US);
            self.pin.set_high()?;
            self.delay.delay_us(WRITE_0_HIGH_US);
        }
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool, OneWireError<P::Error>> {
        self.pin.set_low()?;
        self.delay.delay_us(READ_INIT_LOW_US);
        self.pin.set_high()?;
        self.delay.delay_us(READ_SAMPLE_US);

        let bit = self.pin.is_high()?;
        self.delay.delay_us(READ_RECOVERY_US);

        Ok(bit)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), OneWireError<P::Error>> {
        // LSB first.
        for i in 0..8 {
            self.write_bit((byte >> i) & 1 != 0)?;
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, OneWireError<P::Error>> {
        let mut byte = 0;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }
}

/// Decode the temperature registers of a scratchpad into °C.
pub fn scratchpad_celsius(data: &Scratchpad) -> f32 {
    let raw = i16::from_le_bytes([data[0], data[1]]);
    f32::from(raw) * TEMPERATURE_RESOLUTION_C_PER_LSB
}

/// Dallas/Maxim CRC-8, polynomial 0x31 (reflected 0x8C).
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0;
    for &byte in data {
        let mut b = byte;
        for _ in 0..8 {
            let mix = (crc ^ b) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            b >>= 1;
        }
    }
    crc
}

fn rom_bit(rom: &RomCode, bit_index: u8) -> bool {
    let i = usize::from(bit_index - 1);
    (rom[i / 8] >> (i % 8)) & 1 != 0
}

fn set_rom_bit(rom: &mut RomCode, bit_index: u8, bit: bool) {
    let i = usize::from(bit_index - 1);
    if bit {
        rom[i / 8] |= 1 << (i % 8);
    } else {
        rom[i / 8] &= !(1 << (i % 8));
    }
}

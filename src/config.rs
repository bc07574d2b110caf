//! Persisted controller configuration.
//!
//! The configuration is a fixed 16-byte record stored at offset 0 of the
//! non-volatile region.  The layout is a wire format shared with deployed
//! units, so it is encoded by hand rather than through a serializer and must
//! round-trip bit-exactly:
//!
//! ```text
//! offset  size  field
//! 0       10    schema tag, ASCII null-padded ("FANBUS-01\0")
//! 10      1     fan activation threshold, °C
//! 11      1     hysteresis band width, °C
//! 12      4     fieldbus slave address, i32 little-endian
//! ```
//!
//! A record whose schema tag does not match is treated as absent (first boot
//! or corruption) and replaced with defaults — see `store::ConfigStore`.

/// Schema tag identifying a valid record of this layout generation.
pub const SCHEMA_TAG: [u8; SCHEMA_TAG_LEN] = *b"FANBUS-01\0";
/// Length of the schema tag field, including padding.
pub const SCHEMA_TAG_LEN: usize = 10;
/// Total record size in bytes.
pub const RECORD_LEN: usize = 16;

/// Upper clamp for the temperature fields (DS18B20 measurement ceiling).
pub const TEMP_LIMIT_C: i32 = 125;

pub const DEFAULT_THRESHOLD_C: u8 = 30;
pub const DEFAULT_HYSTERESIS_C: u8 = 5;
pub const DEFAULT_BUS_ADDRESS: i32 = 20;

/// Remotely writable configuration fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    BusAddress,
    ThresholdC,
    HysteresisC,
}

/// In-memory image of the persisted record.
///
/// `hysteresis_c > threshold_c` is representable and deliberately not
/// rejected; the control law handles the resulting band without panicking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub schema_tag: [u8; SCHEMA_TAG_LEN],
    pub threshold_c: u8,
    pub hysteresis_c: u8,
    pub bus_address: i32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Configuration {
    /// Factory defaults, with a valid schema tag.
    pub fn defaults() -> Self {
        Self {
            schema_tag: SCHEMA_TAG,
            threshold_c: DEFAULT_THRESHOLD_C,
            hysteresis_c: DEFAULT_HYSTERESIS_C,
            bus_address: DEFAULT_BUS_ADDRESS,
        }
    }

    /// Whether the record carries the expected schema tag.
    pub fn schema_valid(&self) -> bool {
        self.schema_tag == SCHEMA_TAG
    }

    /// Lower temperature edge of the control band.
    pub fn band_floor_c(&self) -> i32 {
        i32::from(self.threshold_c) - i32::from(self.hysteresis_c)
    }

    /// Encode to the 16-byte wire record.
    pub fn to_record(&self) -> [u8; RECORD_LEN] {
        let mut rec = [0u8; RECORD_LEN];
        rec[..SCHEMA_TAG_LEN].copy_from_slice(&self.schema_tag);
        rec[10] = self.threshold_c;
        rec[11] = self.hysteresis_c;
        rec[12..16].copy_from_slice(&self.bus_address.to_le_bytes());
        rec
    }

    /// Decode from the 16-byte wire record.  Never fails: an invalid tag is
    /// detectable via [`schema_valid`](Self::schema_valid) afterwards.
    pub fn from_record(rec: &[u8; RECORD_LEN]) -> Self {
        let mut schema_tag = [0u8; SCHEMA_TAG_LEN];
        schema_tag.copy_from_slice(&rec[..SCHEMA_TAG_LEN]);
        let mut addr = [0u8; 4];
        addr.copy_from_slice(&rec[12..16]);
        Self {
            schema_tag,
            threshold_c: rec[10],
            hysteresis_c: rec[11],
            bus_address: i32::from_le_bytes(addr),
        }
    }

    /// Apply a raw value to one field, clamping temperatures into
    /// `[0, TEMP_LIMIT_C]`.  The bus address is accepted unclamped.
    ///
    /// Returns `true` when the stored value actually changed.
    pub fn set(&mut self, field: ConfigField, raw: i32) -> bool {
        match field {
            ConfigField::BusAddress => {
                let changed = self.bus_address != raw;
                self.bus_address = raw;
                changed
            }
            ConfigField::ThresholdC => {
                let clamped = clamp_degrees(raw);
                let changed = self.threshold_c != clamped;
                self.threshold_c = clamped;
                changed
            }
            ConfigField::HysteresisC => {
                let clamped = clamp_degrees(raw);
                let changed = self.hysteresis_c != clamped;
                self.hysteresis_c = clamped;
                changed
            }
        }
    }
}

fn clamp_degrees(raw: i32) -> u8 {
    raw.clamp(0, TEMP_LIMIT_C) as u8
}

//! Configuration persistence over the [`NvmPort`].
//!
//! `ConfigStore` owns the cached in-memory configuration and the NVM handle.
//! Loading self-heals: a record without the expected schema tag (first boot,
//! corruption, foreign layout) is replaced by factory defaults, which are
//! persisted immediately so the next boot reads a valid record.

use log::{info, warn};

use crate::app::ports::NvmPort;
use crate::config::{ConfigField, Configuration, RECORD_LEN};
use crate::error::NvmError;

/// Byte offset of the configuration record inside the NVM region.
pub const RECORD_OFFSET: usize = 0;

/// Cached configuration bound to its persistent backend.
#[derive(Debug)]
pub struct ConfigStore<N: NvmPort> {
    nvm: N,
    cached: Configuration,
}

impl<N: NvmPort> ConfigStore<N> {
    /// Load the record, self-healing an unrecognised one to defaults.
    pub fn load(nvm: N) -> Result<Self, NvmError> {
        let mut rec = [0u8; RECORD_LEN];
        nvm.read(RECORD_OFFSET, &mut rec)?;

        let mut store = Self {
            nvm,
            cached: Configuration::from_record(&rec),
        };

        if store.cached.schema_valid() {
            info!(
                "config loaded: threshold={}C hysteresis={}C address={}",
                store.cached.threshold_c, store.cached.hysteresis_c, store.cached.bus_address
            );
        } else {
            warn!("no valid config record, writing factory defaults");
            store.cached = Configuration::defaults();
            store.persist()?;
        }

        Ok(store)
    }

    /// The active configuration.
    pub fn config(&self) -> &Configuration {
        &self.cached
    }

    /// Apply a raw value to one field (with the field's clamping rules).
    /// Returns whether the cached value changed.  Does not persist.
    pub fn set(&mut self, field: ConfigField, raw: i32) -> bool {
        self.cached.set(field, raw)
    }

    /// Write the whole cached record in a single NVM write.
    pub fn persist(&mut self) -> Result<(), NvmError> {
        self.nvm.write(RECORD_OFFSET, &self.cached.to_record())
    }

    /// Direct access to the backend, for inspection in tests.
    pub fn backend(&self) -> &N {
        &self.nvm
    }
}

//! Non-volatile memory adapters for the configuration record.
//!
//! - **`target_os = "espidf"`** — [`NvsNvm`] maps the byte-addressed region
//!   onto a single NVS blob.  `nvs_commit` makes each write atomic, so a
//!   power cut leaves either the old or the new record, never a torn one.
//! - **Host** — [`SimNvm`] keeps the region in memory, optionally pre-seeded
//!   with arbitrary bytes to simulate a factory-fresh or corrupted part.

use crate::app::ports::NvmPort;
use crate::error::NvmError;

/// Size of the emulated byte region.  Generously larger than the record.
pub const REGION_LEN: usize = 64;

#[cfg(target_os = "espidf")]
mod esp {
    use super::{NvmError, NvmPort, REGION_LEN};
    use esp_idf_svc::sys::*;
    use log::{info, warn};

    const NAMESPACE: &[u8] = b"fanbus\0";
    const REGION_KEY: &[u8] = b"region\0";

    /// NVS-backed persistent region.
    pub struct NvsNvm {
        _private: (),
    }

    impl NvsNvm {
        /// Initialise NVS flash and open the region.  On a version mismatch
        /// or full partition the partition is erased and re-initialised.
        pub fn new() -> Result<Self, NvmError> {
            // SAFETY: called from the single main-task context before any
            // concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(NvmError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(NvmError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(NvmError::IoError);
            }
            info!("NVS initialised");
            Ok(Self { _private: () })
        }

        /// Open the namespace, run a closure with the handle, then close.
        fn with_handle<F, T>(write: bool, f: F) -> Result<T, i32>
        where
            F: FnOnce(nvs_handle_t) -> Result<T, i32>,
        {
            let mut handle: nvs_handle_t = 0;
            let mode = if write {
                nvs_open_mode_t_NVS_READWRITE
            } else {
                nvs_open_mode_t_NVS_READONLY
            };
            let ret = unsafe { nvs_open(NAMESPACE.as_ptr() as *const _, mode, &mut handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            let result = f(handle);
            unsafe { nvs_close(handle) };
            result
        }

        /// Whole-region image.  An absent blob reads as all zeroes, which the
        /// schema tag check upstream treats as a blank part.
        fn load_region() -> Result<[u8; REGION_LEN], NvmError> {
            let mut region = [0u8; REGION_LEN];
            let result = Self::with_handle(false, |handle| {
                let mut size = REGION_LEN;
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        REGION_KEY.as_ptr() as *const _,
                        region.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret == ESP_ERR_NVS_NOT_FOUND || ret == ESP_OK {
                    Ok(())
                } else {
                    Err(ret)
                }
            });
            match result {
                Ok(()) => Ok(region),
                // A missing namespace on first boot also reads as blank.
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(region),
                Err(_) => Err(NvmError::IoError),
            }
        }

        fn store_region(region: &[u8; REGION_LEN]) -> Result<(), NvmError> {
            Self::with_handle(true, |handle| {
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        REGION_KEY.as_ptr() as *const _,
                        region.as_ptr() as *const _,
                        REGION_LEN,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            })
            .map_err(|_| NvmError::IoError)
        }
    }

    impl NvmPort for NvsNvm {
        fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), NvmError> {
            let end = offset.checked_add(buf.len()).ok_or(NvmError::OutOfBounds)?;
            if end > REGION_LEN {
                return Err(NvmError::OutOfBounds);
            }
            let region = Self::load_region()?;
            buf.copy_from_slice(&region[offset..end]);
            Ok(())
        }

        fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), NvmError> {
            let end = offset.checked_add(data.len()).ok_or(NvmError::OutOfBounds)?;
            if end > REGION_LEN {
                return Err(NvmError::OutOfBounds);
            }
            let mut region = Self::load_region()?;
            region[offset..end].copy_from_slice(data);
            Self::store_region(&region)
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::NvsNvm;

/// In-memory region for host tests and simulation.
#[derive(Debug, Clone)]
pub struct SimNvm {
    bytes: Vec<u8>,
    writes: u32,
}

impl Default for SimNvm {
    fn default() -> Self {
        Self::new()
    }
}

impl SimNvm {
    /// Blank (zero-filled) region, like an erased part.
    pub fn new() -> Self {
        Self {
            bytes: vec![0u8; REGION_LEN],
            writes: 0,
        }
    }

    /// Region pre-seeded with arbitrary content.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut region = vec![0u8; REGION_LEN.max(bytes.len())];
        region[..bytes.len()].copy_from_slice(bytes);
        Self {
            bytes: region,
            writes: 0,
        }
    }

    /// How many write calls the region has absorbed.
    pub fn write_count(&self) -> u32 {
        self.writes
    }
}

impl NvmPort for SimNvm {
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), NvmError> {
        let end = offset.checked_add(buf.len()).ok_or(NvmError::OutOfBounds)?;
        if end > self.bytes.len() {
            return Err(NvmError::OutOfBounds);
        }
        buf.copy_from_slice(&self.bytes[offset..end]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), NvmError> {
        let end = offset.checked_add(data.len()).ok_or(NvmError::OutOfBounds)?;
        if end > self.bytes.len() {
            return Err(NvmError::OutOfBounds);
        }
        self.bytes[offset..end].copy_from_slice(data);
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_roundtrip() {
        let mut nvm = SimNvm::new();
        nvm.write(4, b"abcd").unwrap();
        let mut buf = [0u8; 4];
        nvm.read(4, &mut buf).unwrap();
        assert_eq!(&buf, b"abcd");
        assert_eq!(nvm.write_count(), 1);
    }

    #[test]
    fn sim_rejects_out_of_bounds() {
        let mut nvm = SimNvm::new();
        assert_eq!(
            nvm.write(REGION_LEN - 2, b"abcd"),
            Err(NvmError::OutOfBounds)
        );
        let mut buf = [0u8; 8];
        assert_eq!(nvm.read(REGION_LEN, &mut buf), Err(NvmError::OutOfBounds));
    }

    #[test]
    fn fresh_region_reads_as_zeroes() {
        let nvm = SimNvm::new();
        let mut buf = [0xFFu8; 16];
        nvm.read(0, &mut buf).unwrap();
        assert_eq!(buf, [0u8; 16]);
    }
}

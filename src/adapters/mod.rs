//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements     | Connects to                         |
//! |--------------|----------------|-------------------------------------|
//! | `sensor_bus` | SensorBusPort  | 1-Wire DS18B20 bus / in-memory sim  |
//! | `modbus`     | RegisterIoPort | Modbus RTU over RS-485 / loopback   |
//! | `nvm`        | NvmPort        | NVS blob / in-memory region         |
//! | `display`    | DisplayPort    | Serial log presenter                |
//! | `restart`    | RestartPort    | `esp_restart()` / latched flag      |
//! | `time`       | —              | ESP32 system timer / `Instant`      |

pub mod display;
pub mod modbus;
pub mod nvm;
pub mod restart;
pub mod sensor_bus;
pub mod time;

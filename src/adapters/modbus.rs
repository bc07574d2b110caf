//! Modbus RTU adapter for the [`RegisterIoPort`].
//!
//! The register context and frame processing come from `rmodbus`; this
//! adapter owns the slave identity and the serial transport.  On ESP-IDF the
//! transport is a half-duplex RS-485 UART serviced by non-blocking reads
//! with inter-frame gap detection.  On the host there is no transport:
//! tests feed raw request frames through [`RtuRegisterBus::process_frame`].
//!
//! The slave address is bound at construction from the persisted
//! configuration and never changes while running; a remote address write
//! takes effect through the supervisor's restart path.

use rmodbus::server::context::ModbusContext as _;
use rmodbus::server::storage::ModbusStorage;
use rmodbus::server::ModbusFrame;
use rmodbus::ModbusProto;

use crate::app::ports::RegisterIoPort;
use crate::error::BusError;
use crate::registers::{HOLDING_COUNT, INPUT_COUNT};

/// Fieldbus baud rate, fixed by the deployed installations.
pub const BAUD_RATE: u32 = 9_600;

/// Largest legal RTU ADU.
#[cfg(target_os = "espidf")]
const MAX_FRAME_LEN: usize = 256;

/// 3.5 character times at 9600 baud 8N1, the RTU inter-frame silence.
#[cfg(target_os = "espidf")]
const INTER_FRAME_GAP_US: u64 = 4_010;

type Storage = ModbusStorage<0, 0, { INPUT_COUNT }, { HOLDING_COUNT }>;

/// RTU slave bound to one unit id.
pub struct RtuRegisterBus {
    unit_id: u8,
    ctx: Storage,
    #[cfg(target_os = "espidf")]
    uart: esp_idf_hal::uart::UartDriver<'static>,
    #[cfg(target_os = "espidf")]
    rx: Vec<u8>,
    #[cfg(target_os = "espidf")]
    last_rx_us: u64,
}

impl RtuRegisterBus {
    /// Bind the slave to `unit_id` on the given RS-485 UART.
    #[cfg(target_os = "espidf")]
    pub fn new(unit_id: u8, uart: esp_idf_hal::uart::UartDriver<'static>) -> Self {
        Self {
            unit_id,
            ctx: Storage::new(),
            uart,
            rx: Vec::with_capacity(MAX_FRAME_LEN),
            last_rx_us: 0,
        }
    }

    /// Host-side slave with no transport.
    #[cfg(not(target_os = "espidf"))]
    pub fn new(unit_id: u8) -> Self {
        Self {
            unit_id,
            ctx: Storage::new(),
        }
    }

    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    /// Process one raw RTU request frame against the register context and
    /// return the response bytes.  Empty for broadcasts and frames addressed
    /// to other units.
    pub fn process_frame(&mut self, request: &[u8]) -> Result<Vec<u8>, BusError> {
        let mut response = Vec::new();
        let mut frame = ModbusFrame::new(self.unit_id, request, ModbusProto::Rtu, &mut response);
        frame.parse().map_err(|_| BusError::Frame)?;
        if frame.processing_required {
            let result = if frame.readonly {
                frame.process_read(&self.ctx)
            } else {
                frame.process_write(&mut self.ctx)
            };
            result.map_err(|_| BusError::Register)?;
        }
        if frame.response_required {
            frame.finalize_response().map_err(|_| BusError::Frame)?;
        }
        Ok(response)
    }
}

impl RegisterIoPort for RtuRegisterBus {
    #[cfg(target_os = "espidf")]
    fn poll(&mut self) -> Result<(), BusError> {
        use crate::drivers::hw_init;
        use crate::pins;
        use esp_idf_hal::delay::NON_BLOCK;
        use log::warn;

        let now_us = || (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64;

        let mut chunk = [0u8; 64];
        loop {
            let n = self
                .uart
                .read(&mut chunk, NON_BLOCK)
                .map_err(|_| BusError::Io)?;
            if n == 0 {
                break;
            }
            self.rx.extend_from_slice(&chunk[..n]);
            self.last_rx_us = now_us();
            if self.rx.len() > MAX_FRAME_LEN {
                // Line noise or a runaway master; resynchronise.
                self.rx.clear();
            }
        }

        let frame_complete =
            !self.rx.is_empty() && now_us().saturating_sub(self.last_rx_us) >= INTER_FRAME_GAP_US;
        if frame_complete {
            let request = core::mem::take(&mut self.rx);
            match self.process_frame(&request) {
                Ok(response) if !response.is_empty() => {
                    hw_init::gpio_write(pins::RS485_DE_GPIO, true);
                    let sent = self.uart.write(&response).map_err(|_| BusError::Io);
                    let _ = self.uart.wait_tx_done(100);
                    hw_init::gpio_write(pins::RS485_DE_GPIO, false);
                    sent?;
                }
                Ok(_) => {}
                Err(e) => {
                    // A bad frame is the master's problem, not a loop fault.
                    warn!("dropped request frame: {}", e);
                }
            }
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn poll(&mut self) -> Result<(), BusError> {
        Ok(())
    }

    fn holding(&self, reg: u16) -> Result<u16, BusError> {
        self.ctx.get_holding(reg).map_err(|_| BusError::Register)
    }

    fn set_holding(&mut self, reg: u16, word: u16) -> Result<(), BusError> {
        self.ctx
            .set_holding(reg, word)
            .map_err(|_| BusError::Register)
    }

    fn set_input(&mut self, reg: u16, word: u16) -> Result<(), BusError> {
        self.ctx
            .set_input(reg, word)
            .map_err(|_| BusError::Register)
    }
}

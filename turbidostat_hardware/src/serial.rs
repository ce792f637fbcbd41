use std::io::{Read, Write};
use std::time::Duration;

use serialport::{DataBits, Parity, SerialPort, StopBits};
use tracing::{debug, info, trace};
use turbidostat_traits::{BoxError, Link};

use crate::error::{HwError, Result};
use crate::util::read_full_with_timeout;

/// Identifiers of the serial ports the OS currently reports.
pub fn available_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            debug!(error = %e, "port enumeration failed");
            Vec::new()
        }
    }
}

/// Serial connection to the chamber board.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    timeout: Duration,
}

impl SerialLink {
    /// Open `port` at `baud` with 8N1 framing and the given read timeout.
    ///
    /// On failure the error lists the ports the OS currently reports.
    pub fn open(port: &str, baud: u32, timeout: Duration) -> Result<Self> {
        let mut sp = serialport::new(port, baud)
            .timeout(timeout)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .open()
            .map_err(|e| HwError::Open {
                port: port.to_string(),
                reason: e.to_string(),
                available: available_ports(),
            })?;
        // RTS asserted keeps the auxiliary valve closed.
        sp.write_request_to_send(true)
            .map_err(|e| HwError::Serial(e.to_string()))?;
        info!(port, baud, timeout_ms = timeout.as_millis() as u64, "serial port open");
        Ok(Self { port: sp, timeout })
    }
}

impl Link for SerialLink {
    fn write(&mut self, bytes: &[u8]) -> std::result::Result<(), BoxError> {
        self.port.write_all(bytes).map_err(HwError::from)?;
        self.port.flush().map_err(HwError::from)?;
        trace!(len = bytes.len(), "serial write");
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> std::result::Result<usize, BoxError> {
        let port = &mut self.port;
        let n = read_full_with_timeout(
            |b| port.read(b),
            buf,
            self.timeout,
            Duration::from_millis(1),
        )
        .map_err(HwError::from)?;
        trace!(len = n, wanted = buf.len(), "serial read");
        Ok(n)
    }

    fn set_valve(&mut self, open: bool) -> std::result::Result<(), BoxError> {
        // Low-active: deasserting RTS opens the valve.
        self.port
            .write_request_to_send(!open)
            .map_err(|e| HwError::Serial(e.to_string()))?;
        Ok(())
    }
}

//! Serial port implementation of the bus line.
//!
//! Drives an RS-485 style half-duplex link through a serial adapter. The
//! adapter's RTS pin is repurposed as the transceiver driver-enable:
//! asserted while transmitting, released while listening.

use crate::{
    HardwareError, Result,
    traits::{BusLine, LineDirection},
};
use bytes::BytesMut;
use hasp_core::constants::DEFAULT_READ_TIMEOUT_MS;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::sync::Mutex;
use std::time::Duration;

/// A [`BusLine`] backed by a physical serial port.
///
/// Serial I/O here is blocking: reads return within the configured read
/// timeout when the input buffer is empty, and writes block until the
/// frame has drained onto the wire, which at locker bus baud rates is a
/// few hundred milliseconds at most. Nodes run their line from a
/// dedicated task, so the stall is confined.
pub struct SerialBusLine {
    // The mutex only makes the line Sync; every access path holds
    // `&mut self`, so it is never contended.
    port: Mutex<Box<dyn SerialPort>>,
    path: String,
    baud_rate: u32,
    read_timeout: Duration,
}

impl SerialBusLine {
    /// Open the serial line, 8N1, with the default read timeout.
    ///
    /// The port starts with RTS released, i.e. in receive direction.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::LineUnavailable`] if the port cannot be
    /// opened or configured. Callers treat this as fatal at startup.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        Self::open_with_timeout(path, baud_rate, Duration::from_millis(DEFAULT_READ_TIMEOUT_MS))
    }

    /// Open the serial line with an explicit read timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::LineUnavailable`] if the port cannot be
    /// opened or configured.
    pub fn open_with_timeout(path: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self> {
        let port = Self::open_port(path, baud_rate, read_timeout)?;

        Ok(Self {
            port: Mutex::new(port),
            path: path.to_string(),
            baud_rate,
            read_timeout,
        })
    }

    fn open_port(
        path: &str,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> Result<Box<dyn SerialPort>> {
        let mut port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            // RTS is the driver-enable pin, not a handshake line.
            .flow_control(FlowControl::None)
            .timeout(read_timeout)
            .open()
            .map_err(|e| HardwareError::line_unavailable(path, e.to_string()))?;

        port.write_request_to_send(false)
            .map_err(|e| HardwareError::line_unavailable(path, e.to_string()))?;
        port.clear(ClearBuffer::All)
            .map_err(|e| HardwareError::line_unavailable(path, e.to_string()))?;

        Ok(port)
    }

    fn with_port<T>(&mut self, f: impl FnOnce(&mut Box<dyn SerialPort>) -> Result<T>) -> Result<T> {
        let mut port = self
            .port
            .lock()
            .map_err(|_| HardwareError::disconnected(self.path.clone()))?;
        f(&mut port)
    }
}

impl BusLine for SerialBusLine {
    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.with_port(|port| {
            port.write_all(bytes)?;
            // flush == drain: do not return until the last byte has left
            // the UART. The caller flips RTS immediately after.
            port.flush()?;
            Ok(())
        })
    }

    async fn recv_available(&mut self, buf: &mut BytesMut) -> Result<usize> {
        self.with_port(|port| {
            let pending = port
                .bytes_to_read()
                .map_err(|e| HardwareError::Io(io::Error::other(e)))?
                as usize;
            if pending == 0 {
                return Ok(0);
            }

            let start = buf.len();
            buf.resize(start + pending, 0);
            let n = match port.read(&mut buf[start..]) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => 0,
                Err(e) => {
                    buf.truncate(start);
                    return Err(e.into());
                }
            };
            buf.truncate(start + n);
            Ok(n)
        })
    }

    async fn set_direction(&mut self, direction: LineDirection) -> Result<()> {
        self.with_port(|port| {
            let assert_driver = direction == LineDirection::Transmit;
            port.write_request_to_send(assert_driver)
                .map_err(|e| HardwareError::Io(io::Error::other(e)))
        })
    }

    async fn reopen(&mut self) -> Result<()> {
        let fresh = Self::open_port(&self.path, self.baud_rate, self.read_timeout)?;
        let mut port = self
            .port
            .lock()
            .map_err(|_| HardwareError::disconnected(self.path.clone()))?;
        *port = fresh;
        Ok(())
    }

    fn descriptor(&self) -> String {
        self.path.clone()
    }
}

impl std::fmt::Debug for SerialBusLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialBusLine")
            .field("path", &self.path)
            .field("baud_rate", &self.baud_rate)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_port_is_line_unavailable() {
        let result = SerialBusLine::open("/dev/hasp-no-such-port", 9600);
        match result {
            Err(HardwareError::LineUnavailable { port, .. }) => {
                assert_eq!(port, "/dev/hasp-no-such-port");
            }
            other => panic!("expected LineUnavailable, got {other:?}"),
        }
    }
}

//! Port abstraction
//!
//! The link talks to a [`Port`] obtained from a [`Connector`], so the same
//! link code drives a real serial device or the in-memory mock.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};

use crate::{Error, Result};

/// A byte stream to the actuator controller
pub trait Port: Read + Write + Send {
    /// Number of bytes that can be read without blocking
    fn bytes_available(&self) -> io::Result<usize>;

    /// Drop everything buffered in both directions
    fn discard_buffers(&mut self) -> io::Result<()>;

    /// Drop buffered input only
    fn discard_input(&mut self) -> io::Result<()>;
}

impl Port for Box<dyn SerialPort> {
    fn bytes_available(&self) -> io::Result<usize> {
        self.bytes_to_read()
            .map(|n| n as usize)
            .map_err(io::Error::from)
    }

    fn discard_buffers(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::All).map_err(io::Error::from)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::Input).map_err(io::Error::from)
    }
}

/// Opens ports
pub trait Connector: Send {
    type Port: Port;

    /// Open `path` at `baud_rate`; `timeout` bounds each blocking read and write
    fn connect(&self, path: &str, baud_rate: u32, timeout: Duration) -> Result<Self::Port>;
}

/// Connector for real serial devices
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    type Port = Box<dyn SerialPort>;

    fn connect(&self, path: &str, baud_rate: u32, timeout: Duration) -> Result<Self::Port> {
        serialport::new(path, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| Error::Connection(format!("Failed to open port {}: {}", path, e)))
    }
}

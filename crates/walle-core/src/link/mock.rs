//! In-memory port for testing without a controller attached
//!
//! [`MockHandle`] is shared between the test and every [`MockPort`] its
//! connector opens, so a test can script incoming bytes, inject failures
//! and inspect exactly what reached the "wire".

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::port::{Connector, Port};
use crate::{Error, Result};

/// Something that happened on the mock device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    /// A port was opened
    Opened { path: String, baud_rate: u32 },
    /// Bytes written in a single call
    Write(Vec<u8>),
    /// Both buffers discarded
    DiscardAll,
    /// Input buffer discarded
    DiscardInput,
    /// The port handle was released
    Released,
}

#[derive(Debug, Default)]
struct MockDevice {
    events: Vec<MockEvent>,
    write_times: Vec<Instant>,
    incoming: VecDeque<u8>,
    auto_echo: bool,
    fail_writes: bool,
    fail_reads: bool,
    fail_open: bool,
    open_ports: usize,
}

/// Test-side view of the mock device
#[derive(Debug, Clone, Default)]
pub struct MockHandle {
    device: Arc<Mutex<MockDevice>>,
}

impl MockHandle {
    /// Create a new mock device
    pub fn new() -> Self {
        Self::default()
    }

    /// Connector that opens ports onto this device
    pub fn connector(&self) -> MockConnector {
        MockConnector {
            handle: self.clone(),
        }
    }

    /// Everything that happened so far
    pub fn events(&self) -> Vec<MockEvent> {
        self.device.lock().events.clone()
    }

    /// Written lines without their trailing newline, e.g. `"Y-25"`
    pub fn writes(&self) -> Vec<String> {
        self.device
            .lock()
            .events
            .iter()
            .filter_map(|e| match e {
                MockEvent::Write(bytes) => Some(
                    String::from_utf8_lossy(bytes)
                        .trim_end_matches('\n')
                        .to_string(),
                ),
                _ => None,
            })
            .collect()
    }

    /// Time of every write, in order
    pub fn write_times(&self) -> Vec<Instant> {
        self.device.lock().write_times.clone()
    }

    /// Forget recorded events and write times
    pub fn clear_events(&self) {
        let mut device = self.device.lock();
        device.events.clear();
        device.write_times.clear();
    }

    /// Queue bytes for the bridge to read
    pub fn push_incoming(&self, bytes: &[u8]) {
        self.device.lock().incoming.extend(bytes.iter().copied());
    }

    /// Echo every written line back as incoming data
    pub fn set_auto_echo(&self, enabled: bool) {
        self.device.lock().auto_echo = enabled;
    }

    /// Make every write fail
    pub fn fail_writes(&self, enabled: bool) {
        self.device.lock().fail_writes = enabled;
    }

    /// Make every read fail
    pub fn fail_reads(&self, enabled: bool) {
        self.device.lock().fail_reads = enabled;
    }

    /// Make the connector refuse to open
    pub fn fail_open(&self, enabled: bool) {
        self.device.lock().fail_open = enabled;
    }

    /// Whether a port onto this device is currently held
    pub fn is_open(&self) -> bool {
        self.device.lock().open_ports > 0
    }
}

/// Connector handing out [`MockPort`]s
#[derive(Debug, Clone)]
pub struct MockConnector {
    handle: MockHandle,
}

impl Connector for MockConnector {
    type Port = MockPort;

    fn connect(&self, path: &str, baud_rate: u32, _timeout: Duration) -> Result<MockPort> {
        let mut device = self.handle.device.lock();
        if device.fail_open {
            return Err(Error::Connection(format!(
                "Failed to open port {}: no such device",
                path
            )));
        }
        device.open_ports += 1;
        device.events.push(MockEvent::Opened {
            path: path.to_string(),
            baud_rate,
        });
        Ok(MockPort {
            device: Arc::clone(&self.handle.device),
        })
    }
}

/// Port onto a mock device
#[derive(Debug)]
pub struct MockPort {
    device: Arc<Mutex<MockDevice>>,
}

impl Read for MockPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut device = self.device.lock();
        if device.fail_reads {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        if device.incoming.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no data"));
        }
        let n = buf.len().min(device.incoming.len());
        for (slot, byte) in buf.iter_mut().zip(device.incoming.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for MockPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut device = self.device.lock();
        if device.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        device.events.push(MockEvent::Write(buf.to_vec()));
        device.write_times.push(Instant::now());
        if device.auto_echo {
            device.incoming.extend(buf.iter().copied());
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Port for MockPort {
    fn bytes_available(&self) -> io::Result<usize> {
        let device = self.device.lock();
        if device.fail_reads {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        Ok(device.incoming.len())
    }

    fn discard_buffers(&mut self) -> io::Result<()> {
        let mut device = self.device.lock();
        device.incoming.clear();
        device.events.push(MockEvent::DiscardAll);
        Ok(())
    }

    fn discard_input(&mut self) -> io::Result<()> {
        let mut device = self.device.lock();
        device.incoming.clear();
        device.events.push(MockEvent::DiscardInput);
        Ok(())
    }
}

impl Drop for MockPort {
    fn drop(&mut self) {
        let mut device = self.device.lock();
        device.open_ports = device.open_ports.saturating_sub(1);
        device.events.push(MockEvent::Released);
    }
}

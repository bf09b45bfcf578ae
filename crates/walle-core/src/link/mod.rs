//! Serial link manager
//!
//! Owns the connection to the actuator controller:
//!
//! ```text
//! Disconnected ──open──► Connecting ──settle──► Connected
//!      ▲                     ▲                      │
//!      │                     └──────reopen────── Faulted ◄── I/O error
//!      └──────────────────────close──────────────────┘
//! ```
//!
//! The controller resets when the port opens and prints a boot banner,
//! so `open` waits out a settle delay and discards both buffers before
//! reporting Connected.
//!
//! Releasing the port always sends a zero command to every drive channel
//! first, from [`SerialLink::close`] or from `Drop`.

pub mod mock;
mod port;

pub use port::{Connector, Port, SerialConnector};

use std::fmt;
use std::io::{ErrorKind, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use crate::actuator::ActuatorId;
use crate::config::LinkConfig;
use crate::protocol::codec::NEWLINE;
use crate::protocol::Command;
use crate::{Error, Result};

/// Poll interval while waiting for echo bytes
const READ_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Read chunk size
const READ_CHUNK: usize = 64;

/// State of the serial connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// An I/O error occurred; recover with an explicit reopen
    Faulted,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Faulted => "faulted",
        };
        f.write_str(s)
    }
}

/// Connection to the actuator controller
pub struct SerialLink<C: Connector = SerialConnector> {
    connector: C,
    config: LinkConfig,
    port: Option<C::Port>,
    state: ConnectionState,
    /// Bytes read past the last returned line
    pending: Vec<u8>,
}

impl SerialLink<SerialConnector> {
    /// Link to a real serial device, not yet opened
    pub fn serial(config: LinkConfig) -> Self {
        Self::new(config, SerialConnector)
    }
}

impl<C: Connector> SerialLink<C> {
    /// Create a disconnected link
    pub fn new(config: LinkConfig, connector: C) -> Self {
        Self {
            connector,
            config,
            port: None,
            state: ConnectionState::Disconnected,
            pending: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Open the device and wait for it to settle
    ///
    /// Does nothing if already connected. Fails with
    /// [`Error::Connection`] if the device cannot be opened.
    pub fn open(&mut self) -> Result<ConnectionState> {
        if self.is_connected() {
            return Ok(self.state);
        }

        tracing::info!(
            "Opening {} at {} baud",
            self.config.port,
            self.config.baud_rate
        );
        self.state = ConnectionState::Connecting;

        let mut port = match self.connector.connect(
            &self.config.port,
            self.config.baud_rate,
            self.config.io_timeout(),
        ) {
            Ok(port) => port,
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                return Err(e);
            }
        };

        // The controller reboots on open; anything it prints meanwhile is noise.
        thread::sleep(self.config.settle_delay());
        if let Err(e) = port.discard_buffers() {
            self.state = ConnectionState::Disconnected;
            return Err(Error::Connection(format!(
                "Failed to reset buffers on {}: {}",
                self.config.port, e
            )));
        }

        self.port = Some(port);
        self.pending.clear();
        self.state = ConnectionState::Connected;
        tracing::info!("Connected to controller on {}", self.config.port);
        Ok(self.state)
    }

    /// Close the current port, if any, and open again
    ///
    /// This is the recovery path out of [`ConnectionState::Faulted`]. The
    /// old port gets the same stop frames as in [`SerialLink::close`].
    pub fn reopen(&mut self) -> Result<ConnectionState> {
        tracing::info!("Reopening {} (was {})", self.config.port, self.state);
        self.close();
        self.open()
    }

    /// Write one encoded command in a single call
    pub fn write_command(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.connected_port("write")?;
        if let Err(e) = port.write_all(bytes).and_then(|()| port.flush()) {
            let what = format!("write of {:?}", String::from_utf8_lossy(bytes).trim_end());
            return Err(self.fault(&what, e));
        }
        tracing::trace!("-> {:?}", String::from_utf8_lossy(bytes).trim_end());
        Ok(())
    }

    /// Wait up to `timeout` for a newline-terminated line
    ///
    /// Returns `Ok(None)` when nothing complete arrived in time. Bytes of
    /// an incomplete line are kept for the next call. The returned line
    /// includes its newline.
    pub fn read_line(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        self.connected_port("read")?;
        if let Some(line) = self.take_pending_line() {
            return Ok(Some(line));
        }

        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; READ_CHUNK];

        loop {
            let port = self.connected_port("read")?;
            let available = match port.bytes_available() {
                Ok(n) => n,
                Err(e) => return Err(self.fault("read", e)),
            };

            if available > 0 {
                let want = available.min(READ_CHUNK);
                match port.read(&mut buf[..want]) {
                    Ok(n) => {
                        self.pending.extend_from_slice(&buf[..n]);
                        if let Some(line) = self.take_pending_line() {
                            return Ok(Some(line));
                        }
                    }
                    Err(e)
                        if matches!(
                            e.kind(),
                            ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                        ) => {}
                    Err(e) => return Err(self.fault("read", e)),
                }
            }

            if Instant::now() >= deadline {
                return Ok(None);
            }
            thread::sleep(READ_POLL_INTERVAL);
        }
    }

    /// Drop stale input, including any partial line
    pub fn discard_input(&mut self) -> Result<()> {
        let port = self.connected_port("discard input")?;
        if let Err(e) = port.discard_input() {
            return Err(self.fault("discard input", e));
        }
        self.pending.clear();
        Ok(())
    }

    /// Stop the drive channels and release the port
    ///
    /// Stop commands are best effort: a failure is logged and the port is
    /// released anyway. Safe to call more than once.
    pub fn close(&mut self) {
        let Some(mut port) = self.port.take() else {
            self.state = ConnectionState::Disconnected;
            return;
        };

        tracing::info!("Closing link on {}", self.config.port);
        for id in ActuatorId::DRIVES {
            let stop = Command::for_actuator(id, 0);
            if let Err(e) = port.write_all(&stop.to_bytes()).and_then(|()| port.flush()) {
                tracing::warn!("Failed to send {} before closing: {}", stop, e);
            }
        }
        drop(port);

        self.pending.clear();
        self.state = ConnectionState::Disconnected;
        tracing::info!("Link on {} closed", self.config.port);
    }

    fn connected_port(&mut self, op: &str) -> Result<&mut C::Port> {
        match self.port.as_mut() {
            Some(port) if self.state == ConnectionState::Connected => Ok(port),
            _ => Err(Error::Serial(format!(
                "cannot {}: link is {}",
                op, self.state
            ))),
        }
    }

    fn fault(&mut self, op: &str, reason: impl fmt::Display) -> Error {
        self.state = ConnectionState::Faulted;
        tracing::error!("Serial {} failed on {}: {}", op, self.config.port, reason);
        Error::Serial(format!("{} failed: {}", op, reason))
    }

    fn take_pending_line(&mut self) -> Option<Vec<u8>> {
        let end = self.pending.iter().position(|&b| b == NEWLINE)?;
        Some(self.pending.drain(..=end).collect())
    }
}

impl<C: Connector> Drop for SerialLink<C> {
    fn drop(&mut self) {
        // Ensure the drives are stopped even if close wasn't called
        self.close();
    }
}

impl<C: Connector> fmt::Debug for SerialLink<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialLink")
            .field("port", &self.config.port)
            .field("baud_rate", &self.config.baud_rate)
            .field("state", &self.state)
            .finish()
    }
}

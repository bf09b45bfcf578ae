//! walle-core: serial actuator command bridge
//!
//! Turns high-level motion requests (teleoperation velocity vectors,
//! keyboard actions, presets) into writes on a line-oriented serial link
//! to an actuator controller.
//!
//! # Modules
//!
//! - [`protocol`] - Line protocol codec (`<symbol><integer>\n`)
//! - [`actuator`] - Actuator table, registry of commanded positions, presets
//! - [`link`] - Serial link manager and the port/connector seam
//! - [`dispatch`] - Command dispatcher, the only owner of registry and link
//! - [`config`] - Bridge configuration (JSON file + builders)
//! - [`comm`] - Request channels between producers and the dispatch thread
//! - [`teleop`] - Keyboard actions, velocity input and the dispatch loop
//!
//! # Architecture
//!
//! ```text
//! producer ──request──► Dispatcher ──set──► Registry
//!                           │
//!                           ├──encode──► Codec
//!                           │
//!                           └──write/read──► SerialLink ──► device
//! ```

#![warn(unused_must_use)]

pub mod actuator;
pub mod comm;
pub mod config;
pub mod dispatch;
pub mod link;
pub mod protocol;
pub mod teleop;

// Re-exports for convenience
pub use actuator::{ActuatorId, ActuatorKind, ActuatorRegistry, ActuatorState, Preset};
pub use config::{BridgeConfig, DispatchConfig, EchoPolicy, LinkConfig};
pub use dispatch::{CommandOutcome, Dispatcher, Echo, PresetReport, VelocityOutcome};
pub use link::{ConnectionState, Connector, Port, SerialConnector, SerialLink};
pub use protocol::Command;
pub use teleop::{Action, Bridge, BridgeRequest, OperatorSession, VelocityCommand};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for walle-core
///
/// Only [`Error::Connection`] is meant to be fatal, and only at startup.
/// Serial failures after a successful open are caught by the
/// [`Dispatcher`] and reported as [`CommandOutcome::Failed`].
///
/// # Example
/// ```ignore
/// match Dispatcher::connect(config) {
///     Ok(dispatcher) => { /* run the bridge */ },
///     Err(Error::Connection(msg)) => eprintln!("Cannot open device: {}", msg),
///     Err(e) => return Err(e),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
#[must_use = "errors must be handled or explicitly ignored with let _ = ..."]
#[non_exhaustive]
pub enum Error {
    /// The serial device could not be opened.
    /// Handle by: checking the port path, permissions and cabling.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Write or read failure after a successful open, or I/O on a link
    /// that is not connected. The link is left Faulted.
    /// Handle by: reporting, then reopening the link.
    #[error("Serial error: {0}")]
    Serial(String),

    /// A command symbol outside the actuator table.
    #[error("Invalid command symbol: {0:?}")]
    InvalidSymbol(char),

    /// A line that cannot be decoded (empty echo, malformed command).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid configuration parameter.
    /// Handle by: validating config before use, checking parameter ranges.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Communication channel was closed unexpectedly.
    #[error("Channel closed")]
    ChannelClosed,
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Serial(format!("I/O error: {}", e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(format!("invalid JSON: {}", e))
    }
}

/// Result type alias for walle-core operations
pub type Result<T> = std::result::Result<T, Error>;

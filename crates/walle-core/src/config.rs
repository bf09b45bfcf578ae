//! Bridge configuration
//!
//! Loaded from a JSON file, built in code, or both: every field has a
//! default, so a file only needs the keys it changes.
//!
//! ```json
//! {
//!   "link": { "port": "/dev/ttyACM0", "baud_rate": 115200 },
//!   "max_speed": 60
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::actuator::Preset;
use crate::{Error, Result};

/// Whether a write is followed by an attempt to read the device echo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EchoPolicy {
    /// Discard stale input, write, wait the echo delay, read one line
    #[default]
    Capture,
    /// Write only
    Skip,
}

/// Serial link settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Serial port path (e.g., "/dev/ttyUSB0")
    pub port: String,
    /// Baud rate (default: 115200)
    pub baud_rate: u32,
    /// Timeout of a single read/write on the port
    pub io_timeout_ms: u64,
    /// Grace period after opening while the controller resets
    pub settle_delay_ms: u64,
}

impl LinkConfig {
    /// Default baud rate of the controller firmware
    pub const DEFAULT_BAUD_RATE: u32 = 115_200;

    /// Create a link config for the given port
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Default::default()
        }
    }

    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the settle delay
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".into(),
            baud_rate: Self::DEFAULT_BAUD_RATE,
            io_timeout_ms: 1000,
            settle_delay_ms: 2000,
        }
    }
}

/// Dispatcher timing and echo behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Echo handling for position, step and preset commands
    pub position_echo: EchoPolicy,
    /// Echo handling for velocity and stop commands
    pub velocity_echo: EchoPolicy,
    /// Wait between a write and the echo read
    pub echo_delay_ms: u64,
    /// How long to wait for an echo line
    pub echo_timeout_ms: u64,
    /// Spacing after each drive channel write
    pub drive_spacing_ms: u64,
    /// Spacing after each preset step
    pub preset_spacing_ms: u64,
    /// Send a probe command right after connecting
    pub probe_on_connect: bool,
}

impl DispatchConfig {
    /// No delays and no probe, for tests and simulation
    pub fn immediate() -> Self {
        Self {
            echo_delay_ms: 0,
            echo_timeout_ms: 0,
            drive_spacing_ms: 0,
            preset_spacing_ms: 0,
            probe_on_connect: false,
            ..Default::default()
        }
    }

    pub fn echo_delay(&self) -> Duration {
        Duration::from_millis(self.echo_delay_ms)
    }

    pub fn echo_timeout(&self) -> Duration {
        Duration::from_millis(self.echo_timeout_ms)
    }

    pub fn drive_spacing(&self) -> Duration {
        Duration::from_millis(self.drive_spacing_ms)
    }

    pub fn preset_spacing(&self) -> Duration {
        Duration::from_millis(self.preset_spacing_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            position_echo: EchoPolicy::Capture,
            velocity_echo: EchoPolicy::Skip,
            echo_delay_ms: 50,
            echo_timeout_ms: 100,
            drive_spacing_ms: 10,
            preset_spacing_ms: 150,
            probe_on_connect: true,
        }
    }
}

/// Complete bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub link: LinkConfig,
    pub dispatch: DispatchConfig,
    /// Percentage cap applied to velocity commands (0-100)
    pub max_speed: u8,
    /// Pose used by `home`
    pub home: Preset,
}

impl BridgeConfig {
    /// Maximum value of `max_speed`
    pub const MAX_SPEED_LIMIT: u8 = 100;

    /// Create a config for the given port
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            link: LinkConfig::new(port),
            ..Default::default()
        }
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|e| Error::Config(format!("cannot write {}: {}", path.display(), e)))
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.link.port.trim().is_empty() {
            return Err(Error::Config("serial port path is empty".into()));
        }
        if self.link.baud_rate == 0 {
            return Err(Error::Config("baud rate must be positive".into()));
        }
        if self.max_speed > Self::MAX_SPEED_LIMIT {
            return Err(Error::Config(format!(
                "max_speed {} exceeds {}",
                self.max_speed,
                Self::MAX_SPEED_LIMIT
            )));
        }
        Ok(())
    }

    /// Set the serial port path
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.link.port = port.into();
        self
    }

    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.link.baud_rate = baud_rate;
        self
    }

    /// Set the velocity percentage cap
    pub fn with_max_speed(mut self, max_speed: u8) -> Self {
        self.max_speed = max_speed;
        self
    }

    /// Replace the dispatcher settings
    pub fn with_dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Set the settle delay after opening the port
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.link = self.link.with_settle_delay(delay);
        self
    }

    /// Replace the home pose
    pub fn with_home(mut self, home: Preset) -> Self {
        self.home = home;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            dispatch: DispatchConfig::default(),
            max_speed: Self::MAX_SPEED_LIMIT,
            home: Preset::home(),
        }
    }
}

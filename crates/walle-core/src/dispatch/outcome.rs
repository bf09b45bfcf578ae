//! Results of dispatcher calls
//!
//! Serial failures never escape the dispatcher as errors; they come back
//! as [`CommandOutcome::Failed`] with the command that was attempted.

use std::fmt;

use crate::actuator::ActuatorId;
use crate::protocol::Command;

/// What came back from the device after a write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Echo {
    /// Trimmed echo text, for logging only
    Received(String),
    /// Nothing readable arrived within the echo window
    Missing,
    /// The echo was not requested
    Skipped,
}

impl Echo {
    /// Echo text, if one was received
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Received(text) => Some(text),
            _ => None,
        }
    }
}

/// Result of one command
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Written to the link
    Sent {
        actuator: ActuatorId,
        command: Command,
        echo: Echo,
    },
    /// The link refused or failed the write or the echo read.
    /// The registry still holds the intended value.
    Failed {
        actuator: ActuatorId,
        command: Command,
        reason: String,
    },
}

impl CommandOutcome {
    pub fn actuator(&self) -> ActuatorId {
        match self {
            Self::Sent { actuator, .. } | Self::Failed { actuator, .. } => *actuator,
        }
    }

    pub fn command(&self) -> Command {
        match self {
            Self::Sent { command, .. } | Self::Failed { command, .. } => *command,
        }
    }

    /// Clamped value stored in the registry
    pub fn value(&self) -> i32 {
        self.command().value()
    }

    #[inline]
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Echo text, if the command was sent and the device answered
    pub fn echo(&self) -> Option<&str> {
        match self {
            Self::Sent { echo, .. } => echo.text(),
            Self::Failed { .. } => None,
        }
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sent { command, echo, .. } => match echo {
                Echo::Received(text) => write!(f, "{} (echo: {})", command, text),
                Echo::Missing => write!(f, "{} (no echo)", command),
                Echo::Skipped => write!(f, "{}", command),
            },
            Self::Failed {
                command, reason, ..
            } => write!(f, "{} FAILED: {}", command, reason),
        }
    }
}

/// Result of a velocity command: linear channel first, then turn
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VelocityOutcome {
    pub linear: CommandOutcome,
    pub angular: CommandOutcome,
}

impl VelocityOutcome {
    pub fn is_sent(&self) -> bool {
        self.linear.is_sent() && self.angular.is_sent()
    }
}

/// Result of a preset: one outcome per target, in the order applied
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetReport {
    pub name: String,
    pub outcomes: Vec<CommandOutcome>,
}

impl PresetReport {
    /// Every step reached the device
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(CommandOutcome::is_sent)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CommandOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }
}

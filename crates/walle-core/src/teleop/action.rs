//! Logical operator actions
//!
//! Front-ends map their own input (key presses, UI buttons) onto these;
//! nothing here knows about terminals.

use std::fmt;

use crate::actuator::ActuatorId;
use crate::dispatch::{CommandOutcome, PresetReport};

/// Coarse step for `w`/`s`
pub const COARSE_STEP: i32 = 5;

/// Fine step for `+`/`-`
pub const FINE_STEP: i32 = 1;

/// Something the operator asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Make an actuator the target of later increments
    Select(ActuatorId),
    /// Move the selected actuator by a signed amount
    Increment(i32),
    /// Every actuator to its default
    CenterAll,
    /// Configured rest pose
    Home,
    /// Selected actuator to its default
    ResetCurrent,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(id) => write!(f, "select {}", id),
            Self::Increment(delta) => write!(f, "increment {:+}", delta),
            Self::CenterAll => f.write_str("center all"),
            Self::Home => f.write_str("home"),
            Self::ResetCurrent => f.write_str("reset current"),
        }
    }
}

/// What applying an [`Action`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Selection changed; nothing was written
    Selected(ActuatorId),
    /// One command was dispatched
    Command(CommandOutcome),
    /// A preset was dispatched
    Preset(PresetReport),
}

impl ActionOutcome {
    /// No dispatched command failed
    pub fn is_ok(&self) -> bool {
        match self {
            Self::Selected(_) => true,
            Self::Command(outcome) => outcome.is_sent(),
            Self::Preset(report) => report.is_complete(),
        }
    }
}

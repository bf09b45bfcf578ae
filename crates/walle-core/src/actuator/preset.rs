//! Named poses applied across several actuators

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::ActuatorId;

/// A named set of target positions
///
/// Targets are keyed by [`ActuatorId`], whose ordering is declaration
/// order, so iteration is always deterministic regardless of how the
/// preset was built or deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    /// Preset name for logging
    pub name: String,
    /// Target position per actuator
    pub targets: BTreeMap<ActuatorId, i32>,
}

impl Preset {
    /// Create an empty preset
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            targets: BTreeMap::new(),
        }
    }

    /// Add or replace a target
    #[must_use]
    pub fn with(mut self, id: ActuatorId, value: i32) -> Self {
        self.targets.insert(id, value);
        self
    }

    /// Every actuator at its startup default
    pub fn center() -> Self {
        ActuatorId::ALL
            .into_iter()
            .fold(Self::new("center"), |p, id| p.with(id, id.default_value()))
    }

    /// Rest pose of the robot
    pub fn home() -> Self {
        Self::new("home")
            .with(ActuatorId::HeadRotation, 50)
            .with(ActuatorId::NeckTop, 80)
            .with(ActuatorId::NeckBottom, 20)
            .with(ActuatorId::EyeRight, 40)
            .with(ActuatorId::EyeLeft, 40)
            .with(ActuatorId::ArmLeft, 50)
            .with(ActuatorId::ArmRight, 50)
    }

    /// Targets in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (ActuatorId, i32)> + '_ {
        self.targets.iter().map(|(&id, &v)| (id, v))
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::home()
    }
}

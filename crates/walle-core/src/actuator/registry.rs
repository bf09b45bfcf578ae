//! Authoritative commanded state of every actuator

use serde::{Deserialize, Serialize};

use super::preset::Preset;
use super::types::{ActuatorId, NUM_ACTUATORS};

/// Commanded position of every actuator
///
/// Always holds exactly one entry per [`ActuatorId`]; entries are only
/// ever overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorState {
    positions: [i32; NUM_ACTUATORS],
}

impl ActuatorState {
    /// State with every actuator at its default
    pub fn new() -> Self {
        Self {
            positions: ActuatorId::ALL.map(ActuatorId::default_value),
        }
    }

    /// Commanded position of an actuator
    #[inline]
    #[must_use]
    pub fn get(&self, id: ActuatorId) -> i32 {
        self.positions[id.index()]
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (ActuatorId, i32)> + '_ {
        ActuatorId::ALL.into_iter().map(|id| (id, self.get(id)))
    }
}

impl Default for ActuatorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of commanded positions
///
/// Every write clamps into the actuator's range; callers must encode
/// the returned value, not their original input.
#[derive(Debug, Clone, Default)]
pub struct ActuatorRegistry {
    state: ActuatorState,
}

impl ActuatorRegistry {
    /// Create a registry with every actuator at its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamp and store a value, returning what was stored
    pub fn set(&mut self, id: ActuatorId, value: i32) -> i32 {
        let clamped = id.clamp(value);
        self.state.positions[id.index()] = clamped;
        clamped
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: ActuatorId) -> i32 {
        self.state.get(id)
    }

    /// Relative move, saturating at the actuator's range
    pub fn step(&mut self, id: ActuatorId, delta: i32) -> i32 {
        self.set(id, self.get(id).saturating_add(delta))
    }

    /// Restore an actuator to its default
    pub fn reset(&mut self, id: ActuatorId) -> i32 {
        self.set(id, id.default_value())
    }

    /// Apply every target of a preset in declaration order
    ///
    /// Returns the stored (clamped) values in the order they were applied.
    pub fn apply_preset(&mut self, preset: &Preset) -> Vec<(ActuatorId, i32)> {
        preset
            .iter()
            .map(|(id, value)| (id, self.set(id, value)))
            .collect()
    }

    /// Copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> ActuatorState {
        self.state
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActuatorId, i32)> + '_ {
        self.state.iter()
    }
}

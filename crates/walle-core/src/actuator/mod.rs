//! Actuators, their commanded state and presets
//!
//! The actuator set is closed: every actuator is an [`ActuatorId`]
//! variant with a compile-time table entry, so an unknown actuator name
//! cannot reach the wire.

mod preset;
mod registry;
mod types;

pub use preset::Preset;
pub use registry::{ActuatorRegistry, ActuatorState};
pub use types::{ActuatorId, ActuatorKind, NUM_ACTUATORS};

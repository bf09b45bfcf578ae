//! Teleoperation surface
//!
//! Logical operator actions, the keyboard binding, velocity input from a
//! line-fed producer, the status table and the dispatch loop that ties
//! them to a [`crate::Dispatcher`].

pub mod action;
pub mod bridge;
pub mod keymap;
pub mod session;
pub mod status;
pub mod velocity;

pub use action::{Action, ActionOutcome};
pub use bridge::{Bridge, BridgeEvent, BridgeRequest};
pub use keymap::{map_key, KeyInput};
pub use session::OperatorSession;
pub use velocity::VelocityCommand;

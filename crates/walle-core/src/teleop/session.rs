//! Operator session: which actuator the keyboard is driving

use crate::actuator::ActuatorId;
use crate::dispatch::Dispatcher;
use crate::link::Connector;

use super::action::{Action, ActionOutcome};

/// Selection state of an interactive operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorSession {
    selected: ActuatorId,
}

impl OperatorSession {
    /// Start with the head rotation selected
    pub fn new() -> Self {
        Self {
            selected: ActuatorId::HeadRotation,
        }
    }

    #[inline]
    pub fn selected(&self) -> ActuatorId {
        self.selected
    }

    /// Apply an action through the dispatcher
    pub fn apply<C: Connector>(
        &mut self,
        dispatcher: &mut Dispatcher<C>,
        action: Action,
    ) -> ActionOutcome {
        tracing::debug!("Action: {} (selected {})", action, self.selected);
        match action {
            Action::Select(id) => {
                self.selected = id;
                ActionOutcome::Selected(id)
            }
            Action::Increment(delta) => {
                ActionOutcome::Command(dispatcher.step(self.selected, delta))
            }
            Action::ResetCurrent => ActionOutcome::Command(dispatcher.reset(self.selected)),
            Action::CenterAll => ActionOutcome::Preset(dispatcher.center_all()),
            Action::Home => ActionOutcome::Preset(dispatcher.home()),
        }
    }
}

impl Default for OperatorSession {
    fn default() -> Self {
        Self::new()
    }
}

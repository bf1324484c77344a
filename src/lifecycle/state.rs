use super::{ComponentState, Manager};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Per-registration states, indexed in registration order
#[derive(Debug, Clone, Default)]
pub(super) struct StateTable {
    states: Arc<Mutex<Vec<ComponentState>>>,
}

impl StateTable {
    pub(super) fn push(&self) {
        self.states.lock().push(ComponentState::Stopped);
    }

    pub(super) fn set(&self, index: usize, component: &str, state: ComponentState) {
        if let Some(slot) = self.states.lock().get_mut(index) {
            *slot = state;
        }
        debug!(component, ?state, "Component state changed");
    }

    /// Move to `to` only while the component is still in `from`
    pub(super) fn transition(
        &self,
        index: usize,
        component: &str,
        from: ComponentState,
        to: ComponentState,
    ) -> bool {
        let mut states = self.states.lock();
        match states.get_mut(index) {
            Some(slot) if *slot == from => {
                *slot = to;
                drop(states);
                debug!(component, state = ?to, "Component state changed");
                true
            }
            _ => false,
        }
    }

    pub(super) fn get(&self, index: usize) -> Option<ComponentState> {
        self.states.lock().get(index).copied()
    }
}

impl Manager {
    /// State of the first component registered under `name`
    pub fn component_state(&self, name: &str) -> Option<ComponentState> {
        let index = self
            .components
            .iter()
            .position(|component| component.name() == name)?;
        self.states.get(index)
    }

    /// All component states in registration order
    pub fn component_states(&self) -> Vec<(String, ComponentState)> {
        self.components
            .iter()
            .enumerate()
            .filter_map(|(index, component)| {
                self.states
                    .get(index)
                    .map(|state| (component.name().to_string(), state))
            })
            .collect()
    }
}

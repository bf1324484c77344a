use super::state::StateTable;
use super::Component;
use crate::error::ManagerError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Owns the ordered component list and drives its lifecycle
#[derive(Default)]
pub struct Manager {
    pub(super) components: Vec<Arc<dyn Component>>,
    pub(super) states: StateTable,
    pub(super) started: AtomicBool,
    pub(super) shutdown_requested: AtomicBool,
}

impl Manager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a component; registration order is start order.
    pub fn register(&mut self, component: Arc<dyn Component>) -> Result<(), ManagerError> {
        if self.started.load(Ordering::SeqCst) {
            return Err(ManagerError::AlreadyStarted);
        }

        info!(component = component.name(), "Registering component");
        self.components.push(component);
        self.states.push();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn component_names(&self) -> Vec<String> {
        self.components
            .iter()
            .map(|component| component.name().to_string())
            .collect()
    }
}

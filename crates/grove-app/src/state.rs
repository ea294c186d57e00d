//! Engine state (Model in TEA pattern)

use crate::drag::{DragSessionController, DropOutcome};
use crate::registry::{InstanceId, InstanceRegistry};

/// Everything the update function mutates.
#[derive(Debug, Default)]
pub struct AppState {
    /// Every live tree instance
    pub registry: InstanceRegistry,

    /// The single drag state machine shared by all instances
    pub drag: DragSessionController,

    /// Set by `Message::Quit`
    pub should_quit: bool,

    /// Short text describing the last outcome, for status bars
    pub status: Option<String>,

    /// Result of the last pointer release
    pub last_drop: Option<DropOutcome>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instance receiving keyboard input.
    pub fn focused(&self) -> Option<InstanceId> {
        self.registry.focused()
    }

    /// Whether the focused instance is in an inline rename.
    pub fn is_renaming(&self) -> bool {
        self.registry
            .focused()
            .and_then(|id| self.registry.get(id))
            .is_some_and(|i| i.rename_session().is_some())
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }
}

//! Handler module - TEA update function and event handlers
//!
//! Organized into submodules:
//! - `update`: Main update() function and message dispatch
//! - `command`: Tree commands applied to one instance
//! - `pointer`: Pointer events routed through the drag controller
//! - `keys`: Key event handlers for the focused instance
//! - `load`: Async load results

pub(crate) mod command;
pub(crate) mod keys;
pub(crate) mod load;
pub(crate) mod pointer;
pub(crate) mod update;

#[cfg(test)]
mod tests;

use std::time::Duration;

use crate::instance::LoadRequest;
use crate::message::Message;
use crate::registry::InstanceId;
use crate::state::AppState;

// Re-export main entry point
pub use update::update;

#[cfg(test)]
pub(crate) use keys::handle_key;

/// One fetch the event loop should spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadJob {
    pub instance: InstanceId,
    pub request: LoadRequest,
    pub timeout: Duration,
}

/// Actions that the event loop should perform after update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateAction {
    /// Fetch children in the background
    LoadChildren(Vec<LoadJob>),
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Optional follow-up message to process
    pub message: Option<Message>,
    /// Optional action for the event loop to perform
    pub action: Option<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(msg: Message) -> Self {
        Self {
            message: Some(msg),
            action: None,
        }
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            message: None,
            action: Some(action),
        }
    }
}

/// Collect fetches queued by any instance during the last update.
pub(crate) fn pending_loads(state: &mut AppState) -> Option<UpdateAction> {
    let mut jobs = Vec::new();
    for instance in state.registry.iter_mut() {
        let timeout = Duration::from_millis(instance.options().data.timeout_ms);
        let id = instance.id();
        jobs.extend(
            instance
                .take_load_requests()
                .into_iter()
                .map(|request| LoadJob {
                    instance: id,
                    request,
                    timeout,
                }),
        );
    }
    (!jobs.is_empty()).then_some(UpdateAction::LoadChildren(jobs))
}

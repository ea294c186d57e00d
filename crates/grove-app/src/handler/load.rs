//! Async load result handlers

use grove_core::{Error, NodeData, NodeId};
use tracing::{debug, warn};

use crate::registry::InstanceId;
use crate::state::AppState;

use super::UpdateResult;

pub fn handle_children_loaded(
    state: &mut AppState,
    instance: InstanceId,
    node: Option<NodeId>,
    generation: u64,
    nodes: Vec<NodeData>,
) -> UpdateResult {
    let Some(tree) = state.registry.get_mut(instance) else {
        debug!("Children loaded for closed tree {}", instance);
        return UpdateResult::none();
    };
    if let Err(e) = tree.finish_load(node, generation, nodes) {
        state.set_status(e.code());
    }
    UpdateResult::none()
}

pub fn handle_children_load_failed(
    state: &mut AppState,
    instance: InstanceId,
    node: Option<NodeId>,
    generation: u64,
    error: String,
) -> UpdateResult {
    fail(state, instance, node, generation, Error::load_failed(error))
}

pub fn handle_children_load_timeout(
    state: &mut AppState,
    instance: InstanceId,
    node: Option<NodeId>,
    generation: u64,
) -> UpdateResult {
    let timeout_ms = state
        .registry
        .get(instance)
        .map(|i| i.options().data.timeout_ms)
        .unwrap_or_default();
    let err = Error::load_timeout(format!("no response within {timeout_ms}ms"));
    fail(state, instance, node, generation, err)
}

fn fail(
    state: &mut AppState,
    instance: InstanceId,
    node: Option<NodeId>,
    generation: u64,
    err: Error,
) -> UpdateResult {
    let Some(tree) = state.registry.get_mut(instance) else {
        warn!("Load failure for closed tree {}: {}", instance, err);
        return UpdateResult::none();
    };
    if let Err(e) = tree.fail_load(node, generation, err) {
        state.set_status(e.code());
    }
    UpdateResult::none()
}

//! Host callbacks for tree instances
//!
//! Every `before_*` hook may veto the operation by returning `false`; a veto
//! is not an error and never reaches [`TreeCallbacks::error`]. Every `on_*`
//! hook fires after the change has been committed.

use grove_core::{DropPosition, NodeId};

use crate::registry::InstanceId;

/// Hooks a host implements to observe and veto tree operations.
///
/// All methods have no-op defaults.
#[allow(unused_variables)]
pub trait TreeCallbacks: Send {
    /// Before the selection changes to include `node`.
    fn before_change(&mut self, node: &NodeId, instance: InstanceId) -> bool {
        true
    }

    fn on_change(&mut self, node: &NodeId, instance: InstanceId) {}

    fn on_deselect(&mut self, node: &NodeId, instance: InstanceId) {}

    fn before_open(&mut self, node: &NodeId, instance: InstanceId) -> bool {
        true
    }

    /// After a node opened (and its children loaded, for async nodes).
    fn on_open(&mut self, node: &NodeId, instance: InstanceId) {}

    fn before_close(&mut self, node: &NodeId, instance: InstanceId) -> bool {
        true
    }

    fn on_close(&mut self, node: &NodeId, instance: InstanceId) {}

    /// Before `nodes` are moved or copied to `(reference, position)`.
    fn before_move(
        &mut self,
        nodes: &[NodeId],
        reference: &NodeId,
        position: DropPosition,
        instance: InstanceId,
    ) -> bool {
        true
    }

    fn on_move(
        &mut self,
        nodes: &[NodeId],
        reference: &NodeId,
        position: DropPosition,
        instance: InstanceId,
    ) {
    }

    /// `copies[i]` is the new id of `originals[i]`.
    fn on_copy(
        &mut self,
        originals: &[NodeId],
        copies: &[NodeId],
        reference: &NodeId,
        position: DropPosition,
        instance: InstanceId,
    ) {
    }

    /// Before a node of `node_type` is created under `parent` (`None` is
    /// the root level).
    fn before_create(
        &mut self,
        parent: Option<&NodeId>,
        node_type: &str,
        instance: InstanceId,
    ) -> bool {
        true
    }

    fn on_create(&mut self, node: &NodeId, parent: Option<&NodeId>, instance: InstanceId) {}

    /// Only fired when the title actually changed.
    fn on_rename(&mut self, node: &NodeId, old_title: &str, new_title: &str, instance: InstanceId) {}

    fn before_delete(&mut self, node: &NodeId, instance: InstanceId) -> bool {
        true
    }

    fn on_delete(&mut self, node: &NodeId, instance: InstanceId) {}

    /// After the initial (or refreshed) root load finished.
    fn on_load(&mut self, instance: InstanceId) {}

    /// After a node's children arrived from the data source.
    fn on_load_node(&mut self, node: &NodeId, instance: InstanceId) {}

    /// Every failure, with its short code (`"LOCKED"`, `"MOVE: NODE OVER SELF"`, ...).
    fn error(&mut self, code: &str, instance: InstanceId) {}
}

/// Callbacks that accept everything and observe nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallbacks;

impl TreeCallbacks for NoopCallbacks {}

/// Callbacks that only log, used by the terminal runner.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingCallbacks;

impl TreeCallbacks for LoggingCallbacks {
    fn on_move(
        &mut self,
        nodes: &[NodeId],
        reference: &NodeId,
        position: DropPosition,
        instance: InstanceId,
    ) {
        tracing::info!(
            "Tree {}: moved {:?} {} {}",
            instance,
            nodes,
            position,
            reference
        );
    }

    fn on_create(&mut self, node: &NodeId, parent: Option<&NodeId>, instance: InstanceId) {
        tracing::info!("Tree {}: created {} under {:?}", instance, node, parent);
    }

    fn on_delete(&mut self, node: &NodeId, instance: InstanceId) {
        tracing::info!("Tree {}: deleted {}", instance, node);
    }

    fn on_rename(&mut self, node: &NodeId, old_title: &str, new_title: &str, instance: InstanceId) {
        tracing::info!(
            "Tree {}: renamed {} from {:?} to {:?}",
            instance,
            node,
            old_title,
            new_title
        );
    }

    fn error(&mut self, code: &str, instance: InstanceId) {
        tracing::warn!("Tree {}: {}", instance, code);
    }
}

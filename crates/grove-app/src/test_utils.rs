//! Shared fixtures for unit tests

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use grove_core::{DropPosition, NodeData, NodeId};

use crate::callbacks::TreeCallbacks;
use crate::config::TreeOptions;
use crate::registry::InstanceId;

pub fn ids(names: &[&str]) -> Vec<NodeId> {
    names.iter().map(|n| NodeId::new(*n)).collect()
}

/// A node titled with its own id and typed through `rel`.
pub fn typed(id: &str, node_type: &str) -> NodeData {
    NodeData::new(id, id).with_attr("rel", node_type)
}

/// `[Home[A, B], Second]`, everything closed.
pub fn sample_options() -> TreeOptions {
    TreeOptions::with_nodes(vec![
        NodeData::new("home", "Home")
            .with_attr("rel", "folder")
            .with_children(vec![
                NodeData::new("a", "A").with_attr("rel", "file"),
                NodeData::new("b", "B").with_attr("rel", "file"),
            ]),
        NodeData::new("second", "Second").with_attr("rel", "file"),
    ])
}

#[derive(Debug, Default)]
struct Recorded {
    events: Vec<String>,
    errors: Vec<String>,
    vetoes: HashSet<String>,
    moves: Vec<(Vec<NodeId>, NodeId, DropPosition)>,
}

/// Callbacks that record every event by method name. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    inner: Arc<Mutex<Recorded>>,
}

impl Recorder {
    /// How many times `name` (e.g. `"on_move"`) fired.
    pub fn count(&self, name: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .events
            .iter()
            .filter(|e| *e == name)
            .count()
    }

    /// Every event name in firing order.
    pub fn events(&self) -> Vec<String> {
        self.inner.lock().unwrap().events.clone()
    }

    /// Error codes in reporting order.
    pub fn errors(&self) -> Vec<String> {
        self.inner.lock().unwrap().errors.clone()
    }

    /// Arguments of every `on_move`.
    pub fn moves(&self) -> Vec<(Vec<NodeId>, NodeId, DropPosition)> {
        self.inner.lock().unwrap().moves.clone()
    }

    /// Make the `before_*` hook `name` refuse from now on.
    pub fn veto(&self, name: &str) {
        self.inner.lock().unwrap().vetoes.insert(name.to_string());
    }

    fn record(&self, name: &str) {
        self.inner.lock().unwrap().events.push(name.to_string());
    }

    fn allow(&self, name: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner.events.push(name.to_string());
        !inner.vetoes.contains(name)
    }
}

impl TreeCallbacks for Recorder {
    fn before_change(&mut self, _node: &NodeId, _instance: InstanceId) -> bool {
        self.allow("before_change")
    }

    fn on_change(&mut self, _node: &NodeId, _instance: InstanceId) {
        self.record("on_change");
    }

    fn on_deselect(&mut self, _node: &NodeId, _instance: InstanceId) {
        self.record("on_deselect");
    }

    fn before_open(&mut self, _node: &NodeId, _instance: InstanceId) -> bool {
        self.allow("before_open")
    }

    fn on_open(&mut self, _node: &NodeId, _instance: InstanceId) {
        self.record("on_open");
    }

    fn before_close(&mut self, _node: &NodeId, _instance: InstanceId) -> bool {
        self.allow("before_close")
    }

    fn on_close(&mut self, _node: &NodeId, _instance: InstanceId) {
        self.record("on_close");
    }

    fn before_move(
        &mut self,
        _nodes: &[NodeId],
        _reference: &NodeId,
        _position: DropPosition,
        _instance: InstanceId,
    ) -> bool {
        self.allow("before_move")
    }

    fn on_move(
        &mut self,
        nodes: &[NodeId],
        reference: &NodeId,
        position: DropPosition,
        _instance: InstanceId,
    ) {
        self.record("on_move");
        self.inner
            .lock()
            .unwrap()
            .moves
            .push((nodes.to_vec(), reference.clone(), position));
    }

    fn on_copy(
        &mut self,
        _originals: &[NodeId],
        _copies: &[NodeId],
        _reference: &NodeId,
        _position: DropPosition,
        _instance: InstanceId,
    ) {
        self.record("on_copy");
    }

    fn before_create(
        &mut self,
        _parent: Option<&NodeId>,
        _node_type: &str,
        _instance: InstanceId,
    ) -> bool {
        self.allow("before_create")
    }

    fn on_create(&mut self, _node: &NodeId, _parent: Option<&NodeId>, _instance: InstanceId) {
        self.record("on_create");
    }

    fn on_rename(&mut self, _node: &NodeId, _old: &str, _new: &str, _instance: InstanceId) {
        self.record("on_rename");
    }

    fn before_delete(&mut self, _node: &NodeId, _instance: InstanceId) -> bool {
        self.allow("before_delete")
    }

    fn on_delete(&mut self, _node: &NodeId, _instance: InstanceId) {
        self.record("on_delete");
    }

    fn on_load(&mut self, _instance: InstanceId) {
        self.record("on_load");
    }

    fn on_load_node(&mut self, _node: &NodeId, _instance: InstanceId) {
        self.record("on_load_node");
    }

    fn error(&mut self, code: &str, _instance: InstanceId) {
        self.inner.lock().unwrap().errors.push(code.to_string());
    }
}

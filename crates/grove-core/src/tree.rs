//! # Node Arena
//!
//! [`Tree`] is the source of truth for one instance's structure. Every
//! structural mutation ends by repairing the `last` markers of the levels it
//! touched and normalizing the parents' states, so the following always
//! hold after a public method returns:
//!
//! - exactly the final child of each parent (and the final root) is `last`;
//! - a node is `Leaf` iff it has no children and nothing pending or loading;
//! - no node is its own ancestor.
//!
//! Methods here perform no rule checks; callers validate first (see
//! [`crate::rules`]) and only then mutate.

use std::collections::{BTreeMap, HashMap};

use crate::data::{DeclaredState, NodeData, NodeLabelData};
use crate::error::{Error, Result};
use crate::node::{DropPosition, Labels, Node, NodeId, NodeState};

/// Where a new node goes among its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAt {
    Top,
    Bottom,
    Index(usize),
}

/// Arena of nodes plus the ordered root list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    nodes: HashMap<NodeId, Node>,
    roots: Vec<NodeId>,
    type_attr: String,
}

impl Tree {
    /// An empty tree reading node types from `type_attr` (usually `rel`).
    pub fn new(type_attr: impl Into<String>) -> Self {
        Self {
            nodes: HashMap::new(),
            roots: Vec::new(),
            type_attr: type_attr.into(),
        }
    }

    pub fn type_attr(&self) -> &str {
        &self.type_attr
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutable access to non-structural fields (labels, attributes, metadata).
    pub fn labels_mut(&mut self, id: &NodeId) -> Option<&mut Labels> {
        self.nodes.get_mut(id).map(|n| &mut n.labels)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }

    /// Children of `parent`, or the roots when `parent` is `None`.
    pub fn level(&self, parent: Option<&NodeId>) -> &[NodeId] {
        match parent {
            None => &self.roots,
            Some(p) => self.nodes.get(p).map(|n| n.children.as_slice()).unwrap_or(&[]),
        }
    }

    fn level_mut(&mut self, parent: Option<&NodeId>) -> Option<&mut Vec<NodeId>> {
        match parent {
            None => Some(&mut self.roots),
            Some(p) => self.nodes.get_mut(p).map(|n| &mut n.children),
        }
    }

    /// Index of `id` among its siblings.
    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        let parent = self.nodes.get(id)?.parent.clone();
        self.level(parent.as_ref()).iter().position(|c| c == id)
    }

    pub fn previous_sibling(&self, id: &NodeId) -> Option<&NodeId> {
        let node = self.nodes.get(id)?;
        let idx = self.index_of(id)?;
        idx.checked_sub(1)
            .and_then(|i| self.level(node.parent.as_ref()).get(i))
    }

    pub fn next_sibling(&self, id: &NodeId) -> Option<&NodeId> {
        let node = self.nodes.get(id)?;
        let idx = self.index_of(id)?;
        self.level(node.parent.as_ref()).get(idx + 1)
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: &NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = self.nodes.get(id).and_then(|n| n.parent.clone());
        while let Some(p) = current {
            current = self.nodes.get(&p).and_then(|n| n.parent.clone());
            result.push(p);
        }
        result
    }

    /// `true` if `ancestor` is `node` itself or lies above it.
    pub fn is_self_or_ancestor(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        ancestor == node || self.ancestors(node).iter().any(|a| a == ancestor)
    }

    /// Number of ancestors (roots have depth 0).
    pub fn depth(&self, id: &NodeId) -> usize {
        self.ancestors(id).len()
    }

    /// Levels in the subtree rooted at `id`, counting `id` itself.
    pub fn subtree_height(&self, id: &NodeId) -> usize {
        match self.nodes.get(id) {
            None => 0,
            Some(node) => {
                1 + node
                    .children
                    .iter()
                    .map(|c| self.subtree_height(c))
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    /// `id` followed by all its descendants in document order.
    pub fn subtree(&self, id: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_preorder(id, &mut out);
        out
    }

    /// All nodes in document order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for root in &self.roots {
            self.collect_preorder(root, &mut out);
        }
        out
    }

    fn collect_preorder(&self, id: &NodeId, out: &mut Vec<NodeId>) {
        if let Some(node) = self.nodes.get(id) {
            out.push(id.clone());
            for child in &node.children {
                self.collect_preorder(child, out);
            }
        }
    }

    /// Resolve `(reference, position)` to the parent and index a node lands at.
    pub fn resolve_drop(
        &self,
        reference: &NodeId,
        position: DropPosition,
    ) -> Result<(Option<NodeId>, usize)> {
        let node = self
            .nodes
            .get(reference)
            .ok_or_else(|| Error::unknown_node(reference))?;
        match position {
            DropPosition::Inside => Ok((Some(reference.clone()), node.children.len())),
            DropPosition::Before | DropPosition::After => {
                let idx = self
                    .index_of(reference)
                    .ok_or_else(|| Error::unknown_node(reference))?;
                let idx = if position == DropPosition::After {
                    idx + 1
                } else {
                    idx
                };
                Ok((node.parent.clone(), idx))
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Loading
    // ─────────────────────────────────────────────────────────────────────

    /// Build nodes from source data under `parent` (or at the root level).
    ///
    /// Nodes whose id already exists are skipped together with their
    /// subtree; nodes without an id get a generated one. Returns the ids of
    /// the top-level nodes that were inserted.
    pub fn load(&mut self, data: &[NodeData], parent: Option<&NodeId>) -> Result<Vec<NodeId>> {
        if let Some(p) = parent {
            if !self.nodes.contains_key(p) {
                return Err(Error::unknown_node(p));
            }
        }
        let mut inserted = Vec::new();
        for item in data {
            if let Some(id) = self.load_one(item, parent.cloned())? {
                inserted.push(id);
            }
        }
        self.repair_level(parent);
        if let Some(p) = parent {
            self.normalize(p);
        }
        Ok(inserted)
    }

    fn load_one(&mut self, data: &NodeData, parent: Option<NodeId>) -> Result<Option<NodeId>> {
        let id = match data.id() {
            Some(id) => NodeId::new(id),
            None => self.unique_id("node"),
        };
        if self.nodes.contains_key(&id) {
            tracing::debug!("Skipping already present node {}", id);
            return Ok(None);
        }

        let mut node = Node::new(
            id.clone(),
            data.attr(&self.type_attr).unwrap_or_default(),
            data.data.to_labels(),
        );
        node.attributes = data
            .attributes
            .keys()
            .filter(|k| k.as_str() != "id" && k.as_str() != self.type_attr)
            .filter_map(|k| data.attr(k).map(|v| (k.clone(), v)))
            .collect::<BTreeMap<_, _>>();
        node.metadata = data.metadata.clone().unwrap_or_default();
        node.parent = parent.clone();
        node.state = match (data.state, data.children.is_empty()) {
            (Some(DeclaredState::Open), false) => NodeState::Open,
            (_, false) => NodeState::Closed,
            (Some(DeclaredState::Closed), true) => {
                node.children_pending = true;
                NodeState::Closed
            }
            (_, true) => NodeState::Leaf,
        };

        self.nodes.insert(id.clone(), node);
        match parent.as_ref() {
            None => self.roots.push(id.clone()),
            Some(p) => {
                if let Some(parent_node) = self.nodes.get_mut(p) {
                    parent_node.children.push(id.clone());
                }
            }
        }

        for child in &data.children {
            self.load_one(child, Some(id.clone()))?;
        }
        self.repair_level(Some(&id));
        self.normalize(&id);
        Ok(Some(id))
    }

    /// Mark `id` as loading its children: it becomes `Open` and shows a
    /// placeholder until [`Tree::finish_load`] or [`Tree::fail_load`].
    pub fn begin_load(&mut self, id: &NodeId) -> Result<()> {
        let node = self.nodes.get_mut(id).ok_or_else(|| Error::unknown_node(id))?;
        node.loading = true;
        node.state = NodeState::Open;
        Ok(())
    }

    /// Insert fetched children. An empty response turns the node into a leaf.
    pub fn finish_load(&mut self, id: &NodeId, children: &[NodeData]) -> Result<Vec<NodeId>> {
        {
            let node = self.nodes.get_mut(id).ok_or_else(|| Error::unknown_node(id))?;
            node.loading = false;
            node.children_pending = false;
        }
        // Keeps the state set by `begin_load` unless the node was closed
        // while loading.
        let inserted = self.load(children, Some(id))?;
        self.normalize(id);
        Ok(inserted)
    }

    /// A failed load never leaves a half-expanded node: it becomes a leaf
    /// unless it already holds children.
    pub fn fail_load(&mut self, id: &NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.loading = false;
            node.children_pending = false;
        }
        self.normalize(id);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Structural mutation
    // ─────────────────────────────────────────────────────────────────────

    /// Insert a detached node under `parent`.
    pub fn insert(&mut self, mut node: Node, parent: Option<&NodeId>, at: InsertAt) -> Result<NodeId> {
        if self.nodes.contains_key(&node.id) {
            return Err(Error::validation("CREATE: DUPLICATE ID"));
        }
        if let Some(p) = parent {
            if !self.nodes.contains_key(p) {
                return Err(Error::unknown_node(p));
            }
        }
        let id = node.id.clone();
        node.parent = parent.cloned();
        node.children.clear();
        node.is_last = false;
        self.nodes.insert(id.clone(), node);
        self.attach(&id, parent, at);
        Ok(id)
    }

    fn attach(&mut self, id: &NodeId, parent: Option<&NodeId>, at: InsertAt) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = parent.cloned();
        }
        if let Some(level) = self.level_mut(parent) {
            let idx = match at {
                InsertAt::Top => 0,
                InsertAt::Bottom => level.len(),
                InsertAt::Index(i) => i.min(level.len()),
            };
            level.insert(idx, id.clone());
        }
        self.repair_level(parent);
        if let Some(p) = parent {
            if let Some(parent_node) = self.nodes.get_mut(p) {
                // A leaf that gains a child opens; pending parents stay closed.
                if parent_node.state == NodeState::Leaf {
                    parent_node.state = NodeState::Open;
                }
            }
            self.normalize(p);
        }
    }

    /// Unlink `id` from its parent without dropping the subtree.
    fn detach(&mut self, id: &NodeId) -> Option<NodeId> {
        let parent = self.nodes.get(id)?.parent.clone();
        if let Some(level) = self.level_mut(parent.as_ref()) {
            level.retain(|c| c != id);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = None;
            node.is_last = false;
        }
        self.repair_level(parent.as_ref());
        if let Some(p) = &parent {
            self.normalize(p);
        }
        parent
    }

    /// Remove `id` and its subtree. Returns the removed nodes, `id` first.
    pub fn remove(&mut self, id: &NodeId) -> Result<Vec<Node>> {
        if !self.nodes.contains_key(id) {
            return Err(Error::unknown_node(id));
        }
        let doomed = self.subtree(id);
        self.detach(id);
        Ok(doomed
            .iter()
            .filter_map(|d| self.nodes.remove(d))
            .collect())
    }

    /// Move `id` relative to `reference`. Refuses cycles; no other checks.
    pub fn move_node(&mut self, id: &NodeId, reference: &NodeId, position: DropPosition) -> Result<()> {
        if !self.nodes.contains_key(id) {
            return Err(Error::unknown_node(id));
        }
        if id == reference {
            return Err(Error::validation("MOVE: NODE OVER SELF"));
        }
        let (parent, _) = self.resolve_drop(reference, position)?;
        if let Some(p) = &parent {
            if self.is_self_or_ancestor(id, p) {
                return Err(Error::validation("MOVE: PARENT OVER CHILD"));
            }
        }
        self.detach(id);
        // Index is resolved after detaching so same-level moves land correctly.
        let (parent, idx) = self.resolve_drop(reference, position)?;
        self.attach(id, parent.as_ref(), InsertAt::Index(idx));
        Ok(())
    }

    /// Copy the subtree of `id` next to or into `reference`. Copied ids get
    /// `suffix` appended (plus a counter on collision). Returns the new root id.
    pub fn copy_node(
        &mut self,
        id: &NodeId,
        reference: &NodeId,
        position: DropPosition,
        suffix: &str,
    ) -> Result<NodeId> {
        let data = self.export(id).ok_or_else(|| Error::unknown_node(id))?;
        self.import_at(data, reference, position, suffix)
    }

    /// Insert exported data at `(reference, position)`, renaming every id
    /// with `suffix`. Used for copies and cross-tree transfers.
    pub fn import_at(
        &mut self,
        mut data: NodeData,
        reference: &NodeId,
        position: DropPosition,
        suffix: &str,
    ) -> Result<NodeId> {
        let (parent, idx) = self.resolve_drop(reference, position)?;
        self.rename_ids(&mut data, suffix);
        let before = self.level(parent.as_ref()).len();
        let parent_was_leaf = parent
            .as_ref()
            .and_then(|p| self.nodes.get(p))
            .is_some_and(|n| n.state == NodeState::Leaf);
        let inserted = self.load(std::slice::from_ref(&data), parent.as_ref())?;
        if parent_was_leaf {
            if let Some(p) = parent.as_ref().and_then(|p| self.nodes.get_mut(p)) {
                p.state = NodeState::Open;
            }
        }
        let new_id = inserted
            .into_iter()
            .next()
            .ok_or_else(|| Error::validation("MOVE: DUPLICATE ID"))?;
        // `load` appends; reposition to the requested index.
        if idx < before {
            self.detach(&new_id);
            self.attach(&new_id, parent.as_ref(), InsertAt::Index(idx));
        }
        Ok(new_id)
    }

    /// Give every id in `data` the suffix, made unique against the arena.
    /// With an empty suffix ids are kept unless they collide.
    fn rename_ids(&self, data: &mut NodeData, suffix: &str) {
        let base = data.id().unwrap_or_else(|| "node".to_string());
        let new_id = self.unique_id(&format!("{base}{suffix}"));
        data.attributes.insert(
            "id".to_string(),
            serde_json::Value::String(new_id.to_string()),
        );
        for child in &mut data.children {
            self.rename_ids(child, suffix);
        }
    }

    /// `base` if free, else `base2`, `base3`, …
    pub fn unique_id(&self, base: &str) -> NodeId {
        let candidate = NodeId::new(base);
        if !self.nodes.contains_key(&candidate) {
            return candidate;
        }
        (2..)
            .map(|n| NodeId::new(format!("{base}{n}")))
            .find(|c| !self.nodes.contains_key(c))
            .unwrap_or(candidate)
    }

    /// Change the expansion state of a node. Requests that would break the
    /// leaf invariant are normalized away.
    pub fn set_state(&mut self, id: &NodeId, state: NodeState) -> Result<()> {
        let node = self.nodes.get_mut(id).ok_or_else(|| Error::unknown_node(id))?;
        node.state = state;
        self.normalize(id);
        Ok(())
    }

    /// Restore the leaf invariant for one node.
    fn normalize(&mut self, id: &NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            let empty = node.children.is_empty() && !node.children_pending && !node.loading;
            if empty {
                node.state = NodeState::Leaf;
            } else if node.state == NodeState::Leaf {
                node.state = NodeState::Closed;
            }
        }
    }

    /// Exactly the final entry of a level carries `is_last`.
    fn repair_level(&mut self, parent: Option<&NodeId>) {
        let level: Vec<NodeId> = self.level(parent).to_vec();
        let last = level.len().saturating_sub(1);
        for (i, id) in level.iter().enumerate() {
            if let Some(node) = self.nodes.get_mut(id) {
                node.is_last = i == last;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Export
    // ─────────────────────────────────────────────────────────────────────

    /// Serialize the subtree of `id` back into the data contract.
    pub fn export(&self, id: &NodeId) -> Option<NodeData> {
        let node = self.nodes.get(id)?;
        let mut attributes = BTreeMap::new();
        attributes.insert(
            "id".to_string(),
            serde_json::Value::String(node.id.to_string()),
        );
        if !node.node_type.is_empty() {
            attributes.insert(
                self.type_attr.clone(),
                serde_json::Value::String(node.node_type.clone()),
            );
        }
        for (k, v) in &node.attributes {
            attributes.insert(k.clone(), serde_json::Value::String(v.clone()));
        }
        let state = match node.state {
            NodeState::Leaf => None,
            NodeState::Open => Some(DeclaredState::Open),
            NodeState::Closed => Some(DeclaredState::Closed),
        };
        Some(NodeData {
            attributes,
            data: NodeLabelData::from_labels(&node.labels),
            state,
            metadata: (!node.metadata.is_empty()).then(|| node.metadata.clone()),
            children: node
                .children
                .iter()
                .filter_map(|c| self.export(c))
                .collect(),
        })
    }

    /// Serialize the whole tree.
    pub fn export_all(&self) -> Vec<NodeData> {
        self.roots.iter().filter_map(|r| self.export(r)).collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Invariants
    // ─────────────────────────────────────────────────────────────────────

    /// Check every structural invariant, describing the first violation.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut seen = 0usize;
        self.validate_level(None, &mut seen)?;
        if seen != self.nodes.len() {
            return Err(format!(
                "{} nodes reachable but {} in arena",
                seen,
                self.nodes.len()
            ));
        }
        Ok(())
    }

    fn validate_level(&self, parent: Option<&NodeId>, seen: &mut usize) -> std::result::Result<(), String> {
        let level = self.level(parent);
        for (i, id) in level.iter().enumerate() {
            let node = self
                .nodes
                .get(id)
                .ok_or_else(|| format!("dangling child {id}"))?;
            *seen += 1;
            if *seen > self.nodes.len() {
                return Err("cycle detected".to_string());
            }
            if node.parent.as_ref() != parent {
                return Err(format!("{id} has wrong parent link"));
            }
            if node.is_last != (i + 1 == level.len()) {
                return Err(format!("{id} has wrong last marker"));
            }
            let empty = node.children.is_empty() && !node.children_pending && !node.loading;
            if empty != (node.state == NodeState::Leaf) {
                return Err(format!("{id} is {:?} with {} children", node.state, node.children.len()));
            }
            self.validate_level(Some(id), seen)?;
        }
        Ok(())
    }
}

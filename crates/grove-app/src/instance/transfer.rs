//! Moving and copying nodes, across trees and from foreign sources

use grove_core::prelude::*;
use grove_core::{
    check, check_move, DropPosition, MoveOrigin, MoveSubject, NodeData, NodeId, NodeLabelData,
    SimpleRule,
};

use super::TreeInstance;
use crate::drag::ForeignItem;

/// Id suffix given to copied nodes.
pub const COPY_SUFFIX: &str = "_copy";

impl TreeInstance {
    pub fn is_draggable(&self, id: &NodeId) -> bool {
        self.tree
            .get(id)
            .is_some_and(|n| check(&self.options.rules, SimpleRule::Draggable, Some(n)))
    }

    /// Nodes a drag starting on `grabbed` carries: the draggable part of the
    /// selection when `grabbed` is selected, otherwise `grabbed` alone.
    pub fn drag_sources(&self, grabbed: &NodeId) -> Vec<NodeId> {
        if !self.is_selected(grabbed) {
            return vec![grabbed.clone()];
        }
        let draggable: Vec<NodeId> = self
            .selected
            .iter()
            .filter(|s| self.is_draggable(s))
            .cloned()
            .collect();
        self.top_level(&draggable)
    }

    fn subjects(&self, ids: &[NodeId], origin: MoveOrigin) -> Vec<MoveSubject> {
        ids.iter()
            .filter_map(|id| MoveSubject::from_tree(&self.tree, id, origin.clone()))
            .collect()
    }

    /// Validate a same-tree move without applying it.
    pub fn can_move(&self, ids: &[NodeId], reference: &NodeId, position: DropPosition) -> Result<()> {
        let batch = self.top_level(ids);
        let mut subjects = self.subjects(&batch, MoveOrigin::SameTree);
        check_move(&self.options.rules, &self.tree, &mut subjects, reference, position)
    }

    /// Validate a same-tree copy: the originals keep their places.
    pub fn can_copy(&self, ids: &[NodeId], reference: &NodeId, position: DropPosition) -> Result<()> {
        let batch = self.top_level(ids);
        let mut subjects = self.subjects(&batch, MoveOrigin::Copy);
        check_move(&self.options.rules, &self.tree, &mut subjects, reference, position)
    }

    /// Validate receiving subjects from elsewhere without applying anything.
    pub fn can_receive(
        &self,
        subjects: &mut [MoveSubject],
        reference: &NodeId,
        position: DropPosition,
    ) -> Result<()> {
        check_move(&self.options.rules, &self.tree, subjects, reference, position)
    }

    fn prepare_batch(&mut self, ids: &[NodeId], reference: &NodeId) -> Result<Vec<NodeId>> {
        self.ensure_unlocked()?;
        self.require(reference)?;
        for id in ids {
            self.require(id)?;
        }
        Ok(self.top_level(ids))
    }

    /// Move `ids` to `(reference, position)` as one batch: the first node
    /// lands at the drop point, each following one after its predecessor.
    ///
    /// Nothing moves unless every node passes validation.
    pub fn move_nodes(
        &mut self,
        ids: &[NodeId],
        reference: &NodeId,
        position: DropPosition,
    ) -> Result<bool> {
        let batch = self.prepare_batch(ids, reference)?;
        if let Err(e) = self.can_move(&batch, reference, position) {
            return Err(self.report(e));
        }
        if !self.callbacks.before_move(&batch, reference, position, self.id) {
            return Ok(false);
        }

        let mut anchor = (reference.clone(), position);
        for id in &batch {
            if let Err(e) = self.tree.move_node(id, &anchor.0, anchor.1) {
                return Err(self.report(e));
            }
            anchor = (id.clone(), DropPosition::After);
        }

        debug!("Tree {}: moved {:?} {} {}", self.id, batch, position, reference);
        self.callbacks.on_move(&batch, reference, position, self.id);
        self.persist();
        Ok(true)
    }

    /// Copy `ids` to `(reference, position)`. Copies get fresh ids with the
    /// `_copy` suffix. Returns the new ids, empty on veto.
    pub fn copy_nodes(
        &mut self,
        ids: &[NodeId],
        reference: &NodeId,
        position: DropPosition,
    ) -> Result<Vec<NodeId>> {
        let batch = self.prepare_batch(ids, reference)?;
        if let Err(e) = self.can_copy(&batch, reference, position) {
            return Err(self.report(e));
        }
        if !self.callbacks.before_move(&batch, reference, position, self.id) {
            return Ok(Vec::new());
        }

        let mut copies = Vec::with_capacity(batch.len());
        let mut anchor = (reference.clone(), position);
        for id in &batch {
            let copy = match self.tree.copy_node(id, &anchor.0, anchor.1, COPY_SUFFIX) {
                Ok(copy) => copy,
                Err(e) => return Err(self.report(e)),
            };
            anchor = (copy.clone(), DropPosition::After);
            copies.push(copy);
        }

        debug!("Tree {}: copied {:?} as {:?}", self.id, batch, copies);
        self.callbacks
            .on_copy(&batch, &copies, reference, position, self.id);
        self.persist();
        Ok(copies)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cross-tree
    // ─────────────────────────────────────────────────────────────────────

    /// Describe `ids` as subjects arriving in another instance.
    pub(crate) fn outgoing_subjects(&self, ids: &[NodeId]) -> Vec<MoveSubject> {
        self.subjects(&self.top_level(ids), MoveOrigin::OtherTree)
    }

    /// Export `ids` for a transfer into another instance.
    pub(crate) fn export_batch(&self, ids: &[NodeId]) -> (Vec<NodeId>, Vec<NodeData>, Vec<MoveSubject>) {
        let batch = self.top_level(ids);
        let data = batch.iter().filter_map(|id| self.tree.export(id)).collect();
        let subjects = self.subjects(&batch, MoveOrigin::OtherTree);
        (batch, data, subjects)
    }

    /// Insert nodes exported by another instance. Labels are trimmed to
    /// this instance's languages. Returns `Ok(None)` on veto.
    pub(crate) fn receive(
        &mut self,
        origins: &[NodeId],
        data: Vec<NodeData>,
        mut subjects: Vec<MoveSubject>,
        reference: &NodeId,
        position: DropPosition,
        copy: bool,
    ) -> Result<Option<Vec<NodeId>>> {
        self.ensure_unlocked()?;
        self.require(reference)?;
        if let Err(e) = self.can_receive(&mut subjects, reference, position) {
            return Err(self.report(e));
        }
        if !self.callbacks.before_move(origins, reference, position, self.id) {
            return Ok(None);
        }

        let suffix = if copy { COPY_SUFFIX } else { "" };
        let mut inserted = Vec::with_capacity(data.len());
        let mut anchor = (reference.clone(), position);
        for mut item in data {
            self.localize(&mut item);
            let id = match self.tree.import_at(item, &anchor.0, anchor.1, suffix) {
                Ok(id) => id,
                Err(e) => return Err(self.report(e)),
            };
            anchor = (id.clone(), DropPosition::After);
            inserted.push(id);
        }

        if copy {
            self.callbacks
                .on_copy(origins, &inserted, reference, position, self.id);
        } else {
            self.callbacks.on_move(&inserted, reference, position, self.id);
        }
        self.persist();
        Ok(Some(inserted))
    }

    /// Source side of a cross-tree move: drop the nodes without firing
    /// delete callbacks.
    pub(crate) fn release(&mut self, ids: &[NodeId]) -> Vec<NodeId> {
        let released = self.detach_batch(ids, false);
        self.persist();
        released
    }

    fn localize(&self, data: &mut NodeData) {
        let mut labels = data.data.to_labels();
        labels.retain_languages(&self.options.languages);
        data.data = NodeLabelData::from_labels(&labels);
        for child in &mut data.children {
            self.localize(child);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Foreign drops
    // ─────────────────────────────────────────────────────────────────────

    /// Create a node from an item dragged in from outside any tree. The
    /// item's first droppable class becomes the node type.
    pub fn drop_foreign(
        &mut self,
        item: &ForeignItem,
        reference: &NodeId,
        position: DropPosition,
    ) -> Result<Option<NodeId>> {
        self.ensure_unlocked()?;
        self.require(reference)?;
        let mut subjects = vec![MoveSubject::foreign(item.id.as_str(), item.classes.clone())];
        if let Err(e) = self.can_receive(&mut subjects, reference, position) {
            return Err(self.report(e));
        }
        let node_type = subjects[0].node_type.clone();
        let parent = match self.tree.resolve_drop(reference, position) {
            Ok((parent, _)) => parent,
            Err(e) => return Err(self.report(e)),
        };
        if !self
            .callbacks
            .before_create(parent.as_ref(), &node_type, self.id)
        {
            return Ok(None);
        }

        let type_attr = self.options.rules.type_attr.clone();
        let mut data = item
            .data
            .clone()
            .unwrap_or_else(|| NodeData::new(item.id.as_str(), item.title.as_str()))
            .with_attr(type_attr, node_type);
        self.localize(&mut data);
        let id = match self.tree.import_at(data, reference, position, "") {
            Ok(id) => id,
            Err(e) => return Err(self.report(e)),
        };

        info!("Tree {}: dropped foreign {} as {}", self.id, item.id, id);
        self.callbacks.on_create(&id, parent.as_ref(), self.id);
        self.persist();
        Ok(Some(id))
    }
}

//! Registry of live tree instances
//!
//! Owns every [`TreeInstance`], tracks which one has focus and runs
//! transfers that touch two instances at once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use grove_core::prelude::*;
use grove_core::{DropPosition, NodeId};

use crate::instance::TreeInstance;

/// Unique identifier for a tree instance
pub type InstanceId = u64;

static INSTANCE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a new unique instance ID
pub fn next_instance_id() -> InstanceId {
    INSTANCE_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// All instances plus the focused one.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    instances: HashMap<InstanceId, TreeInstance>,

    /// Creation order
    order: Vec<InstanceId>,

    /// Instance receiving keyboard input
    focused: Option<InstanceId>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instance. The first one registered gets focus.
    pub fn insert(&mut self, instance: TreeInstance) -> InstanceId {
        let id = instance.id();
        self.instances.insert(id, instance);
        self.order.push(id);
        if self.focused.is_none() {
            self.focused = Some(id);
        }
        id
    }

    pub fn remove(&mut self, id: InstanceId) -> Option<TreeInstance> {
        let instance = self.instances.remove(&id)?;
        self.order.retain(|i| *i != id);
        if self.focused == Some(id) {
            self.focused = self.order.first().copied();
        }
        Some(instance)
    }

    pub fn get(&self, id: InstanceId) -> Option<&TreeInstance> {
        self.instances.get(&id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut TreeInstance> {
        self.instances.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Instance ids in creation order.
    pub fn ids(&self) -> &[InstanceId] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &TreeInstance> {
        self.order.iter().filter_map(|id| self.instances.get(id))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TreeInstance> {
        self.instances.values_mut()
    }

    pub fn focused(&self) -> Option<InstanceId> {
        self.focused
    }

    pub fn focused_mut(&mut self) -> Option<&mut TreeInstance> {
        let id = self.focused?;
        self.instances.get_mut(&id)
    }

    pub fn focus(&mut self, id: InstanceId) {
        if self.instances.contains_key(&id) {
            self.focused = Some(id);
        }
    }

    /// Move focus to the next instance, wrapping around.
    pub fn focus_next(&mut self) {
        if self.order.is_empty() {
            return;
        }
        let idx = self
            .focused
            .and_then(|f| self.order.iter().position(|i| *i == f))
            .map(|i| (i + 1) % self.order.len())
            .unwrap_or(0);
        self.focused = Some(self.order[idx]);
    }

    /// Move or copy `nodes` of `source` to `(reference, position)` in
    /// `target`.
    ///
    /// Both instances must allow multi-tree drops. The target validates and
    /// inserts first; the source only gives up its nodes once the target
    /// accepted them. Returns the new ids in the target, `None` on veto.
    pub fn transfer(
        &mut self,
        source: InstanceId,
        target: InstanceId,
        nodes: &[NodeId],
        reference: &NodeId,
        position: DropPosition,
        copy: bool,
    ) -> Result<Option<Vec<NodeId>>> {
        if source == target {
            let instance = self
                .instances
                .get_mut(&source)
                .ok_or_else(|| Error::invalid_operation("TREE: NOT FOUND"))?;
            return if copy {
                let copies = instance.copy_nodes(nodes, reference, position)?;
                Ok((!copies.is_empty()).then_some(copies))
            } else {
                let moved = instance.move_nodes(nodes, reference, position)?;
                Ok(moved.then(|| nodes.to_vec()))
            };
        }

        let mut src = self
            .instances
            .remove(&source)
            .ok_or_else(|| Error::invalid_operation("TREE: NOT FOUND"))?;
        let result = self.transfer_from(&mut src, target, nodes, reference, position, copy);
        self.instances.insert(source, src);
        result
    }

    fn transfer_from(
        &mut self,
        src: &mut TreeInstance,
        target: InstanceId,
        nodes: &[NodeId],
        reference: &NodeId,
        position: DropPosition,
        copy: bool,
    ) -> Result<Option<Vec<NodeId>>> {
        let dst = self
            .instances
            .get_mut(&target)
            .ok_or_else(|| Error::invalid_operation("TREE: NOT FOUND"))?;

        if !src.options().rules.multitree || !dst.options().rules.multitree {
            return Err(dst.report(Error::validation("MOVE: MULTITREE DISABLED")));
        }
        if !copy && src.is_locked() {
            return Err(src.report(Error::Locked));
        }
        if let Some(missing) = nodes.iter().find(|n| !src.tree().contains(n)) {
            return Err(src.report(Error::unknown_node(missing)));
        }

        let (batch, data, subjects) = src.export_batch(nodes);
        let Some(inserted) = dst.receive(&batch, data, subjects, reference, position, copy)? else {
            return Ok(None);
        };
        if !copy {
            src.release(&batch);
        }
        info!(
            "{} {:?} from tree {} to tree {}",
            if copy { "Copied" } else { "Moved" },
            batch,
            src.id(),
            target
        );
        Ok(Some(inserted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeOptions;
    use crate::persistence::MemoryStore;
    use crate::test_utils::{ids, sample_options, typed, Recorder};

    fn add(registry: &mut InstanceRegistry, options: TreeOptions) -> (InstanceId, Recorder) {
        let recorder = Recorder::default();
        let mut instance = TreeInstance::new(
            next_instance_id(),
            options,
            Box::new(recorder.clone()),
            Box::new(MemoryStore::new()),
        );
        instance.initialize().unwrap();
        (registry.insert(instance), recorder)
    }

    fn multitree(mut options: TreeOptions) -> TreeOptions {
        options.rules.multitree = true;
        options
    }

    #[test]
    fn test_instance_ids_are_unique() {
        let a = next_instance_id();
        let b = next_instance_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_focus_follows_insert_and_remove() {
        let mut registry = InstanceRegistry::new();
        let (a, _) = add(&mut registry, sample_options());
        let (b, _) = add(&mut registry, sample_options());
        assert_eq!(registry.focused(), Some(a));
        registry.focus_next();
        assert_eq!(registry.focused(), Some(b));
        registry.remove(b);
        assert_eq!(registry.focused(), Some(a));
        assert_eq!(registry.ids(), &[a]);
    }

    #[test]
    fn test_cross_tree_move() {
        let mut registry = InstanceRegistry::new();
        let (src, src_rec) = add(&mut registry, multitree(sample_options()));
        let (dst, dst_rec) = add(
            &mut registry,
            multitree(TreeOptions::with_nodes(vec![typed("inbox", "folder")])),
        );

        let moved = registry
            .transfer(
                src,
                dst,
                &ids(&["home"]),
                &NodeId::new("inbox"),
                DropPosition::Inside,
                false,
            )
            .unwrap()
            .unwrap();
        assert_eq!(moved, ids(&["home"]));

        let source = registry.get(src).unwrap();
        let target = registry.get(dst).unwrap();
        assert!(!source.tree().contains(&NodeId::new("home")));
        assert!(!source.tree().contains(&NodeId::new("a")));
        assert!(target.tree().contains(&NodeId::new("a")));
        assert_eq!(src_rec.count("on_delete"), 0);
        assert_eq!(dst_rec.count("on_move"), 1);
        source.tree().validate().unwrap();
        target.tree().validate().unwrap();
    }

    #[test]
    fn test_cross_tree_copy_keeps_source() {
        let mut registry = InstanceRegistry::new();
        let (src, _) = add(&mut registry, multitree(sample_options()));
        let (dst, dst_rec) = add(&mut registry, multitree(sample_options()));

        let copies = registry
            .transfer(
                src,
                dst,
                &ids(&["second"]),
                &NodeId::new("second"),
                DropPosition::After,
                true,
            )
            .unwrap()
            .unwrap();
        assert_eq!(copies, ids(&["second_copy"]));
        assert!(registry.get(src).unwrap().tree().contains(&NodeId::new("second")));
        assert_eq!(dst_rec.count("on_copy"), 1);
    }

    #[test]
    fn test_cross_tree_requires_multitree() {
        let mut registry = InstanceRegistry::new();
        let (src, _) = add(&mut registry, sample_options());
        let (dst, dst_rec) = add(&mut registry, sample_options());

        let err = registry
            .transfer(
                src,
                dst,
                &ids(&["second"]),
                &NodeId::new("home"),
                DropPosition::Inside,
                false,
            )
            .unwrap_err();
        assert_eq!(err.code(), "MOVE: MULTITREE DISABLED");
        assert_eq!(dst_rec.errors(), vec!["MOVE: MULTITREE DISABLED"]);
        assert!(registry.get(src).unwrap().tree().contains(&NodeId::new("second")));
    }

    #[test]
    fn test_rejected_transfer_leaves_both_trees() {
        let mut registry = InstanceRegistry::new();
        let (src, _) = add(&mut registry, multitree(sample_options()));
        let mut options = multitree(sample_options());
        options.rules.dragrules =
            grove_core::DragRules::Patterns(vec!["folder inside folder".parse().unwrap()]);
        let (dst, _) = add(&mut registry, options);

        let before_src = registry.get(src).unwrap().get_json(None);
        let before_dst = registry.get(dst).unwrap().get_json(None);
        let err = registry
            .transfer(
                src,
                dst,
                &ids(&["second"]),
                &NodeId::new("home"),
                DropPosition::Inside,
                false,
            )
            .unwrap_err();
        assert_eq!(err.code(), "MOVE: RULE DENIED");
        assert_eq!(registry.get(src).unwrap().get_json(None), before_src);
        assert_eq!(registry.get(dst).unwrap().get_json(None), before_dst);
    }
}

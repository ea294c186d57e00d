//! Create, rename and remove

use grove_core::prelude::*;
use grove_core::{
    check, check_create, CreateAt, InsertAt, Label, Labels, Node, NodeId, NodeState, SimpleRule,
};

use super::TreeInstance;

/// What to create. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNode {
    pub id: Option<String>,
    pub node_type: Option<String>,
    /// Title for every declared language. Without one the node gets the
    /// "new node" label and an inline rename starts.
    pub title: Option<String>,
    pub icon: Option<String>,
}

impl NewNode {
    pub fn typed(node_type: impl Into<String>) -> Self {
        Self {
            node_type: Some(node_type.into()),
            ..Default::default()
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// An inline rename in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameSession {
    pub node: NodeId,
    pub original: String,
    pub buffer: String,
}

impl TreeInstance {
    // ─────────────────────────────────────────────────────────────────────
    // Create
    // ─────────────────────────────────────────────────────────────────────

    /// Create a node under `parent` (`None` is the root level).
    ///
    /// Returns `Ok(None)` when `before_create` vetoed.
    pub fn create_node(&mut self, parent: Option<&NodeId>, new: NewNode) -> Result<Option<NodeId>> {
        self.ensure_unlocked()?;
        if let Some(p) = parent {
            self.require(p)?;
        }

        let creatable = check(
            &self.options.rules,
            SimpleRule::Creatable,
            parent.and_then(|p| self.tree.get(p)),
        );
        if !creatable {
            return Err(self.report(Error::validation("CREATE: NOT ALLOWED")));
        }

        let node_type = new.node_type.clone().unwrap_or_default();
        if let Err(e) = check_create(&self.options.rules, &self.tree, parent, &node_type) {
            return Err(self.report(e));
        }

        let id = match &new.id {
            Some(id) => {
                let id = NodeId::new(id.as_str());
                if self.tree.contains(&id) {
                    return Err(self.report(Error::validation("CREATE: DUPLICATE ID")));
                }
                id
            }
            None => self.tree.unique_id("node"),
        };

        if !self.callbacks.before_create(parent, &node_type, self.id) {
            return Ok(None);
        }

        let start_rename = new.title.is_none();
        let title = new
            .title
            .clone()
            .unwrap_or_else(|| self.options.lang.new_node.clone());
        let label = Label {
            title,
            icon: new.icon.clone(),
        };
        let mut labels = Labels::default();
        if self.options.languages.is_empty() {
            labels.insert(Labels::DEFAULT_LANG, label);
        } else {
            for lang in &self.options.languages {
                labels.insert(lang.clone(), label.clone());
            }
        }

        let at = match self.options.rules.createat {
            CreateAt::Top => InsertAt::Top,
            CreateAt::Bottom => InsertAt::Bottom,
        };
        let node = Node::new(id, node_type, labels);
        let id = match self.tree.insert(node, parent, at) {
            Ok(id) => id,
            Err(e) => return Err(self.report(e)),
        };
        if let Some(p) = parent {
            if self.tree.get(p).map(|n| n.state()) == Some(NodeState::Closed) {
                self.tree.set_state(p, NodeState::Open)?;
            }
        }
        self.scroll_request = Some(id.clone());

        info!("Tree {}: created {} under {:?}", self.id, id, parent);
        self.callbacks.on_create(&id, parent, self.id);
        if start_rename {
            self.begin_rename(&id);
        }
        self.persist();
        Ok(Some(id))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Rename
    // ─────────────────────────────────────────────────────────────────────

    /// Start an inline rename on `node`, or on the last selected node.
    pub fn rename(&mut self, node: Option<&NodeId>) -> Result<bool> {
        self.ensure_unlocked()?;
        let target = match node.cloned().or_else(|| self.selected.last().cloned()) {
            Some(t) => t,
            None => return Err(self.report(Error::invalid_operation("RENAME: NOTHING SELECTED"))),
        };
        self.require(&target)?;
        let renameable = check(
            &self.options.rules,
            SimpleRule::Renameable,
            self.tree.get(&target),
        );
        if !renameable {
            return Err(self.report(Error::validation("RENAME: NOT ALLOWED")));
        }
        if self.rename.is_some() {
            self.commit_rename()?;
        }
        self.begin_rename(&target);
        Ok(true)
    }

    fn begin_rename(&mut self, id: &NodeId) {
        let Some(original) = self.title(id).map(str::to_string) else {
            return;
        };
        self.rename = Some(RenameSession {
            node: id.clone(),
            buffer: original.clone(),
            original,
        });
    }

    pub fn rename_input(&mut self, c: char) {
        if let Some(session) = &mut self.rename {
            session.buffer.push(c);
        }
    }

    pub fn rename_backspace(&mut self) {
        if let Some(session) = &mut self.rename {
            session.buffer.pop();
        }
    }

    /// Replace the whole rename buffer.
    pub fn set_rename_buffer(&mut self, text: impl Into<String>) {
        if let Some(session) = &mut self.rename {
            session.buffer = text.into();
        }
    }

    /// Apply the rename buffer. An empty or unchanged buffer keeps the old
    /// title and fires nothing.
    pub fn commit_rename(&mut self) -> Result<bool> {
        let Some(session) = self.rename.take() else {
            return Ok(false);
        };
        let title = session.buffer.trim().to_string();
        if title.is_empty() || title == session.original {
            return Ok(false);
        }
        self.apply_title(&session.node, &session.original, &title)
    }

    pub fn cancel_rename(&mut self) {
        self.rename = None;
    }

    /// Rename without an inline session.
    pub fn rename_node(&mut self, id: &NodeId, title: &str) -> Result<bool> {
        self.ensure_unlocked()?;
        self.require(id)?;
        if !check(&self.options.rules, SimpleRule::Renameable, self.tree.get(id)) {
            return Err(self.report(Error::validation("RENAME: NOT ALLOWED")));
        }
        let title = title.trim();
        let original = self.title(id).unwrap_or_default().to_string();
        if title.is_empty() || title == original {
            return Ok(false);
        }
        self.apply_title(id, &original, title)
    }

    fn apply_title(&mut self, id: &NodeId, original: &str, title: &str) -> Result<bool> {
        let lang = self.options.current_language().map(str::to_string);
        match self.tree.labels_mut(id) {
            Some(labels) => labels.set_title(lang.as_deref(), title),
            None => return Ok(false),
        }
        self.callbacks.on_rename(id, original, title, self.id);
        Ok(true)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Remove
    // ─────────────────────────────────────────────────────────────────────

    /// Delete `node`, or every selected node, with their subtrees.
    ///
    /// Either every target passes the `deletable` rule or nothing is removed.
    /// When the selection empties, the previous sibling (else the next one,
    /// else the parent) of the last removed selected node is selected.
    pub fn remove(&mut self, node: Option<&NodeId>) -> Result<Vec<NodeId>> {
        let targets = match node {
            Some(id) => vec![id.clone()],
            None => self.selected.clone(),
        };
        self.remove_nodes(&targets)
    }

    /// Delete an explicit batch, under the same rules as [`TreeInstance::remove`].
    pub fn remove_nodes(&mut self, targets: &[NodeId]) -> Result<Vec<NodeId>> {
        self.ensure_unlocked()?;
        for t in targets {
            self.require(t)?;
        }
        let targets = self.top_level(targets);

        let all_deletable = targets.iter().all(|t| {
            check(&self.options.rules, SimpleRule::Deletable, self.tree.get(t))
        });
        if !all_deletable {
            return Err(self.report(Error::validation("DELETE: NOT ALLOWED")));
        }

        let confirmed: Vec<NodeId> = targets
            .into_iter()
            .filter(|t| self.callbacks.before_delete(t, self.id))
            .collect();
        let removed = self.detach_batch(&confirmed, true);
        self.persist();
        Ok(removed)
    }

    /// Remove `targets` from the arena and repair instance state.
    ///
    /// With `fire` unset no delete callbacks run; cross-tree moves use this
    /// on the source side.
    pub(crate) fn detach_batch(&mut self, targets: &[NodeId], fire: bool) -> Vec<NodeId> {
        let mut removed = Vec::new();
        let mut reselect: Option<NodeId> = None;
        let had_selection = !self.selected.is_empty();

        for target in targets {
            if !self.tree.contains(target) {
                continue;
            }
            let holds_selection = self
                .selected
                .iter()
                .any(|s| self.tree.is_self_or_ancestor(target, s));
            if holds_selection {
                reselect = self.neighbour(target, targets);
            }

            let nodes = match self.tree.remove(target) {
                Ok(nodes) => nodes,
                Err(e) => {
                    warn!("Tree {}: failed to remove {}: {}", self.id, target, e);
                    continue;
                }
            };
            for node in &nodes {
                let id = node.id();
                self.selected.retain(|s| s != id);
                self.pending_open.retain(|s| s != id);
                self.pending_select.retain(|s| s != id);
                self.cascade_open.remove(id);
                self.loads.in_flight.remove(&Some(id.clone()));
                if self.hovered.as_ref() == Some(id) {
                    self.hovered = None;
                }
                if self.rename.as_ref().is_some_and(|r| &r.node == id) {
                    self.rename = None;
                }
            }
            if fire {
                self.callbacks.on_delete(target, self.id);
            }
            removed.push(target.clone());
        }

        if had_selection && self.selected.is_empty() {
            if let Some(candidate) = reselect.filter(|c| self.tree.contains(c)) {
                let clickable = check(
                    &self.options.rules,
                    SimpleRule::Clickable,
                    self.tree.get(&candidate),
                );
                if clickable {
                    self.selected.push(candidate.clone());
                    self.callbacks.on_change(&candidate, self.id);
                }
            }
        }
        removed
    }

    /// Previous sibling, else next sibling, else parent, skipping nodes
    /// that are about to go as well.
    fn neighbour(&self, id: &NodeId, doomed: &[NodeId]) -> Option<NodeId> {
        let level = match self.tree.get(id)?.parent() {
            Some(p) => self.tree.get(p)?.children(),
            None => self.tree.roots(),
        };
        let idx = level.iter().position(|c| c == id)?;
        level[..idx]
            .iter()
            .rev()
            .chain(level[idx + 1..].iter())
            .find(|c| !doomed.contains(c))
            .cloned()
            .or_else(|| self.tree.get(id)?.parent().cloned())
    }

    /// Drop ids whose ancestor is also listed, keeping the given order.
    pub(crate) fn top_level(&self, ids: &[NodeId]) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = Vec::new();
        for id in ids {
            if out.contains(id) {
                continue;
            }
            let covered = ids
                .iter()
                .any(|other| other != id && self.tree.is_self_or_ancestor(other, id));
            if !covered {
                out.push(id.clone());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeOptions;
    use crate::persistence::MemoryStore;
    use crate::test_utils::{ids, sample_options, Recorder};
    use grove_core::{MultipleMode, NodeMetadata, RuleScope};

    fn instance(options: TreeOptions) -> (TreeInstance, Recorder) {
        let recorder = Recorder::default();
        let mut inst = TreeInstance::new(
            1,
            options,
            Box::new(recorder.clone()),
            Box::new(MemoryStore::new()),
        );
        inst.initialize().unwrap();
        (inst, recorder)
    }

    #[test]
    fn test_create_without_title_starts_rename() {
        let (mut inst, recorder) = instance(sample_options());
        let home = NodeId::new("home");
        let id = inst
            .create_node(Some(&home), NewNode::typed("file"))
            .unwrap()
            .unwrap();

        assert_eq!(id, NodeId::new("node"));
        assert_eq!(inst.title(&id), Some("New folder"));
        assert_eq!(inst.tree().get(&home).unwrap().children().last(), Some(&id));
        assert_eq!(inst.tree().get(&home).unwrap().state(), NodeState::Open);
        assert_eq!(inst.rename_session().unwrap().node, id);
        assert_eq!(recorder.count("on_create"), 1);

        inst.set_rename_buffer("Notes");
        assert!(inst.commit_rename().unwrap());
        assert_eq!(inst.title(&id), Some("Notes"));
        assert_eq!(recorder.count("on_rename"), 1);
        inst.tree().validate().unwrap();
    }

    #[test]
    fn test_create_at_top() {
        let mut options = sample_options();
        options.rules.createat = CreateAt::Top;
        let (mut inst, _) = instance(options);
        let id = inst
            .create_node(None, NewNode::typed("file").titled("First"))
            .unwrap()
            .unwrap();
        assert_eq!(inst.tree().roots()[0], id);
        assert!(inst.rename_session().is_none());
    }

    #[test]
    fn test_create_under_leaf_opens_it() {
        let (mut inst, _) = instance(sample_options());
        let second = NodeId::new("second");
        inst.create_node(Some(&second), NewNode::typed("file").titled("x"))
            .unwrap();
        assert_eq!(inst.tree().get(&second).unwrap().state(), NodeState::Open);
        inst.tree().validate().unwrap();
    }

    #[test]
    fn test_create_duplicate_id_fails() {
        let (mut inst, recorder) = instance(sample_options());
        let err = inst
            .create_node(None, NewNode::typed("file").with_id("home"))
            .unwrap_err();
        assert_eq!(err.code(), "CREATE: DUPLICATE ID");
        assert_eq!(recorder.errors(), vec!["CREATE: DUPLICATE ID"]);
        assert_eq!(inst.tree().len(), 4);
    }

    #[test]
    fn test_create_respects_max_children() {
        let mut options = sample_options();
        options.rules.metadata = true;
        options.data.nodes[0].metadata = Some(NodeMetadata {
            max_children: Some(2),
            ..Default::default()
        });
        let (mut inst, _) = instance(options);
        let err = inst
            .create_node(Some(&NodeId::new("home")), NewNode::typed("file"))
            .unwrap_err();
        assert_eq!(err.code(), "CREATE: MAX_CHILDREN REACHED");
    }

    #[test]
    fn test_before_create_veto() {
        let (mut inst, recorder) = instance(sample_options());
        recorder.veto("before_create");
        assert_eq!(inst.create_node(None, NewNode::default()).unwrap(), None);
        assert_eq!(inst.tree().len(), 4);
    }

    #[test]
    fn test_locked_create_reports_locked() {
        let (mut inst, recorder) = instance(sample_options());
        inst.lock();
        assert!(inst.create_node(None, NewNode::default()).is_err());
        assert_eq!(recorder.errors(), vec!["LOCKED"]);
    }

    #[test]
    fn test_rename_empty_or_unchanged_keeps_title() {
        let (mut inst, recorder) = instance(sample_options());
        let home = NodeId::new("home");
        inst.rename(Some(&home)).unwrap();
        inst.set_rename_buffer("   ");
        assert!(!inst.commit_rename().unwrap());
        assert_eq!(inst.title(&home), Some("Home"));

        inst.rename(Some(&home)).unwrap();
        inst.rename_backspace();
        inst.rename_input('e');
        assert!(!inst.commit_rename().unwrap());
        assert_eq!(recorder.count("on_rename"), 0);
    }

    #[test]
    fn test_rename_not_allowed() {
        let mut options = sample_options();
        options.rules.renameable = RuleScope::None;
        let (mut inst, _) = instance(options);
        let err = inst.rename_node(&NodeId::new("home"), "x").unwrap_err();
        assert_eq!(err.code(), "RENAME: NOT ALLOWED");
    }

    #[test]
    fn test_remove_reselects_previous_sibling() {
        let (mut inst, recorder) = instance(sample_options());
        inst.select_node(&NodeId::new("b"), false).unwrap();
        let removed = inst.remove(None).unwrap();
        assert_eq!(removed, ids(&["b"]));
        assert_eq!(inst.selected(), &ids(&["a"])[..]);
        assert_eq!(recorder.count("on_delete"), 1);
        inst.tree().validate().unwrap();
    }

    #[test]
    fn test_remove_last_child_reselects_parent() {
        let (mut inst, _) = instance(sample_options());
        inst.remove(Some(&NodeId::new("a"))).unwrap();
        inst.select_node(&NodeId::new("b"), false).unwrap();
        inst.remove(None).unwrap();
        assert_eq!(inst.selected(), &ids(&["home"])[..]);
        assert_eq!(
            inst.tree().get(&NodeId::new("home")).unwrap().state(),
            NodeState::Leaf
        );
    }

    #[test]
    fn test_remove_is_atomic_over_deletable() {
        let mut options = sample_options();
        options.rules.multiple = MultipleMode::On;
        options.rules.deletable = RuleScope::Types(vec!["file".to_string()]);
        let (mut inst, recorder) = instance(options);
        inst.select_node(&NodeId::new("second"), false).unwrap();
        inst.select_node(&NodeId::new("home"), false).unwrap();

        let err = inst.remove(None).unwrap_err();
        assert_eq!(err.code(), "DELETE: NOT ALLOWED");
        assert_eq!(inst.tree().len(), 4);
        assert_eq!(recorder.count("on_delete"), 0);
    }

    #[test]
    fn test_remove_skips_descendants_of_other_targets() {
        let mut options = sample_options();
        options.rules.multiple = MultipleMode::On;
        let (mut inst, recorder) = instance(options);
        inst.select_node(&NodeId::new("a"), false).unwrap();
        inst.select_node(&NodeId::new("home"), false).unwrap();

        let removed = inst.remove(None).unwrap();
        assert_eq!(removed, ids(&["home"]));
        assert_eq!(recorder.count("on_delete"), 1);
        assert_eq!(inst.selected(), &ids(&["second"])[..]);
    }
}

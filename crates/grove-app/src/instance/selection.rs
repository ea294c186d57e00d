//! Selection, hover, keyboard navigation and search

use grove_core::prelude::*;
use grove_core::{check, MultipleMode, NodeId, NodeState, SimpleRule};

use super::TreeInstance;

/// Keyboard navigation direction over the visible rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    /// Close the current node, or move to its parent.
    Left,
    /// Open the current node, or move to its first child.
    Right,
    First,
    Last,
}

impl TreeInstance {
    pub fn is_selected(&self, id: &NodeId) -> bool {
        self.selected.contains(id)
    }

    /// Select a node.
    ///
    /// In `Off` mode the node replaces the selection. In `On` mode every
    /// call toggles membership; in `Ctrl` mode calls with `additive` toggle,
    /// the others replace. Closed ancestors are opened so the node is shown.
    pub fn select_node(&mut self, id: &NodeId, additive: bool) -> Result<bool> {
        self.ensure_unlocked()?;
        let clickable = match self.tree.get(id) {
            Some(node) => check(&self.options.rules, SimpleRule::Clickable, Some(node)),
            None => return Err(self.report(Error::unknown_node(id))),
        };
        if !clickable {
            return Err(self.report(Error::invalid_operation("SELECT: NOT CLICKABLE")));
        }

        let toggle = match self.options.rules.multiple {
            MultipleMode::Off => false,
            MultipleMode::On => true,
            MultipleMode::Ctrl => additive,
        };

        if toggle && self.is_selected(id) {
            return self.deselect_node(id);
        }
        if !toggle && self.selected.len() == 1 && self.is_selected(id) {
            self.reveal(id);
            return Ok(true);
        }
        if !self.callbacks.before_change(id, self.id) {
            return Ok(false);
        }

        if !toggle {
            let previous = std::mem::take(&mut self.selected);
            for node in previous.iter().filter(|n| *n != id) {
                self.callbacks.on_deselect(node, self.id);
            }
        }
        self.selected.push(id.clone());
        self.hovered = Some(id.clone());
        self.reveal(id);

        self.callbacks.on_change(id, self.id);
        self.persist();
        Ok(true)
    }

    /// Remove one node from the selection.
    pub fn deselect_node(&mut self, id: &NodeId) -> Result<bool> {
        self.ensure_unlocked()?;
        if !self.tree.contains(id) {
            return Err(self.report(Error::unknown_node(id)));
        }
        if !self.is_selected(id) {
            return Ok(false);
        }
        self.selected.retain(|s| s != id);
        self.callbacks.on_deselect(id, self.id);
        self.persist();
        Ok(true)
    }

    pub fn deselect_all(&mut self) -> Result<()> {
        self.ensure_unlocked()?;
        if self.selected.is_empty() {
            return Ok(());
        }
        for node in std::mem::take(&mut self.selected) {
            self.callbacks.on_deselect(&node, self.id);
        }
        self.persist();
        Ok(())
    }

    /// Set (or clear) the hovered node. Unknown ids clear it.
    pub fn hover_node(&mut self, id: Option<&NodeId>) {
        self.hovered = id.filter(|i| self.tree.contains(i)).cloned();
    }

    /// Open closed ancestors of `id` and ask the view to scroll to it.
    fn reveal(&mut self, id: &NodeId) {
        let mut opened = Vec::new();
        for ancestor in self.tree.ancestors(id) {
            if self.tree.get(&ancestor).map(|n| n.state()) == Some(NodeState::Closed) {
                if self.tree.set_state(&ancestor, NodeState::Open).is_ok() {
                    opened.push(ancestor);
                }
            }
        }
        for ancestor in opened.iter().rev() {
            self.callbacks.on_open(ancestor, self.id);
        }
        if !opened.is_empty() {
            self.persist();
        }
        self.scroll_request = Some(id.clone());
    }

    /// Move the hover cursor. Returns the node now under the cursor.
    pub fn navigate(&mut self, direction: Direction) -> Option<NodeId> {
        let rows: Vec<NodeId> = self
            .rows()
            .into_iter()
            .filter_map(|r| r.node_id().cloned())
            .collect();
        if rows.is_empty() {
            return None;
        }
        let current = self
            .hovered
            .clone()
            .or_else(|| self.selected.last().cloned())
            .filter(|c| rows.contains(c));
        let position = current
            .as_ref()
            .and_then(|c| rows.iter().position(|r| r == c));

        let target = match (direction, position) {
            (Direction::First, _) | (Direction::Down, None) => rows.first().cloned(),
            (Direction::Last, _) | (Direction::Up, None) => rows.last().cloned(),
            (Direction::Up, Some(i)) => rows.get(i.saturating_sub(1)).cloned(),
            (Direction::Down, Some(i)) => rows.get((i + 1).min(rows.len() - 1)).cloned(),
            (Direction::Left, None) | (Direction::Right, None) => rows.first().cloned(),
            (Direction::Left, Some(_)) => {
                let id = current?;
                match self.tree.get(&id).map(|n| n.state()) {
                    Some(NodeState::Open) => {
                        if let Err(e) = self.close_node(&id) {
                            debug!("Navigate: cannot close {}: {}", id, e);
                        }
                        Some(id)
                    }
                    _ => self.tree.get(&id).and_then(|n| n.parent().cloned()).or(Some(id)),
                }
            }
            (Direction::Right, Some(_)) => {
                let id = current?;
                let (state, first_child) = match self.tree.get(&id) {
                    Some(n) => (n.state(), n.children().first().cloned()),
                    None => return None,
                };
                match state {
                    NodeState::Closed => {
                        if let Err(e) = self.open_node(&id) {
                            debug!("Navigate: cannot open {}: {}", id, e);
                        }
                        Some(id)
                    }
                    NodeState::Open => first_child.or(Some(id)),
                    NodeState::Leaf => Some(id),
                }
            }
        };

        if let Some(t) = &target {
            self.hovered = Some(t.clone());
            self.scroll_request = Some(t.clone());
        }
        target
    }

    /// Nodes whose title contains `text` (case-insensitive), in document
    /// order. Matches are revealed by opening their ancestors.
    pub fn search(&mut self, text: &str) -> Vec<NodeId> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let lang = self.options.current_language();
        let matches: Vec<NodeId> = self
            .tree
            .preorder()
            .into_iter()
            .filter(|id| {
                self.tree
                    .get(id)
                    .is_some_and(|n| n.title(lang).to_lowercase().contains(&needle))
            })
            .collect();
        // A locked tree keeps its open set; matches are only hovered.
        if !self.locked {
            for id in &matches {
                self.reveal(id);
            }
        }
        if let Some(first) = matches.first() {
            self.hovered = Some(first.clone());
            self.scroll_request = Some(first.clone());
        }
        debug!("Tree {}: search {:?} matched {}", self.id, text, matches.len());
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::test_utils::{ids, sample_options, Recorder};
    use crate::config::TreeOptions;
    use grove_core::RuleScope;

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
    fn test_single_mode_replaces_selection() {
        let (mut inst, recorder) = instance(sample_options());
        inst.select_node(&NodeId::new("home"), false).unwrap();
        inst.select_node(&NodeId::new("second"), true).unwrap();
        assert_eq!(inst.selected(), &ids(&["second"])[..]);
        assert_eq!(recorder.count("on_deselect"), 1);
    }

    #[test]
    fn test_ctrl_mode_toggles_with_modifier() {
        let mut options = sample_options();
        options.rules.multiple = MultipleMode::Ctrl;
        let (mut inst, _) = instance(options);
        let home = NodeId::new("home");
        let second = NodeId::new("second");

        inst.select_node(&home, false).unwrap();
        inst.select_node(&second, true).unwrap();
        assert_eq!(inst.selected(), &ids(&["home", "second"])[..]);

        inst.select_node(&home, true).unwrap();
        assert_eq!(inst.selected(), &ids(&["second"])[..]);

        inst.select_node(&home, false).unwrap();
        assert_eq!(inst.selected(), &ids(&["home"])[..]);
    }

    #[test]
    fn test_on_mode_always_toggles() {
        let mut options = sample_options();
        options.rules.multiple = MultipleMode::On;
        let (mut inst, _) = instance(options);
        let home = NodeId::new("home");

        inst.select_node(&home, false).unwrap();
        inst.select_node(&NodeId::new("second"), false).unwrap();
        assert_eq!(inst.selected().len(), 2);
        inst.select_node(&home, false).unwrap();
        assert_eq!(inst.selected(), &ids(&["second"])[..]);
    }

    #[test]
    fn test_unclickable_node_reports_error() {
        let mut options = sample_options();
        options.rules.clickable = RuleScope::Types(vec!["folder".to_string()]);
        let (mut inst, recorder) = instance(options);

        let err = inst.select_node(&NodeId::new("second"), false).unwrap_err();
        assert_eq!(err.code(), "SELECT: NOT CLICKABLE");
        assert_eq!(recorder.errors(), vec!["SELECT: NOT CLICKABLE"]);
        inst.select_node(&NodeId::new("home"), false).unwrap();
    }

    #[test]
    fn test_before_change_veto_keeps_selection() {
        let (mut inst, recorder) = instance(sample_options());
        recorder.veto("before_change");
        assert!(!inst.select_node(&NodeId::new("home"), false).unwrap());
        assert!(inst.selected().is_empty());
    }

    #[test]
    fn test_select_reveals_hidden_node() {
        let (mut inst, _) = instance(sample_options());
        let a = NodeId::new("a");
        inst.select_node(&a, false).unwrap();
        assert_eq!(
            inst.tree().get(&NodeId::new("home")).unwrap().state(),
            NodeState::Open
        );
        assert_eq!(inst.take_scroll_request(), Some(a));
        assert_eq!(inst.take_scroll_request(), None);
    }

    #[test]
    fn test_navigate_over_visible_rows() {
        let (mut inst, _) = instance(sample_options());
        assert_eq!(inst.navigate(Direction::Down), Some(NodeId::new("home")));
        // Right on a closed node opens it and stays.
        assert_eq!(inst.navigate(Direction::Right), Some(NodeId::new("home")));
        assert_eq!(inst.navigate(Direction::Right), Some(NodeId::new("a")));
        assert_eq!(inst.navigate(Direction::Down), Some(NodeId::new("b")));
        assert_eq!(inst.navigate(Direction::Left), Some(NodeId::new("home")));
        assert_eq!(inst.navigate(Direction::Left), Some(NodeId::new("home")));
        assert_eq!(
            inst.tree().get(&NodeId::new("home")).unwrap().state(),
            NodeState::Closed
        );
        assert_eq!(inst.navigate(Direction::Last), Some(NodeId::new("second")));
        assert_eq!(inst.navigate(Direction::Down), Some(NodeId::new("second")));
    }

    #[test]
    fn test_search_reveals_matches() {
        let (mut inst, _) = instance(sample_options());
        let found = inst.search("b");
        assert_eq!(found, ids(&["b"]));
        assert_eq!(
            inst.tree().get(&NodeId::new("home")).unwrap().state(),
            NodeState::Open
        );
        assert!(inst.search("   ").is_empty());
    }
}

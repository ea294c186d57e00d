//! # Tree Instance
//!
//! One tree widget's complete state: the node arena, selection, hover,
//! lock flag, inline rename session, viewport, in-flight loads and the
//! persisted-state bookkeeping. Operations are split by concern:
//!
//! - this module: construction, loading, open/close, locking, persistence
//! - `selection`: select/deselect, hover, keyboard navigation, search
//! - `edit`: create, rename, remove
//! - `transfer`: move/copy within the tree, cross-tree transfer, foreign drops
//!
//! Every public operation reports failures through the `error` callback
//! before returning `Err`. A `before_*` veto returns `Ok(false)` (or an empty
//! result) and reports nothing.

mod edit;
mod selection;
mod transfer;

use std::collections::{HashMap, HashSet};
use std::fmt;

use grove_core::prelude::*;
use grove_core::{
    render, render_text, visible_rows, DataKind, NodeData, NodeId, NodeState, Payload, RenderContext,
    RenderedNode, RenderedRow, Tree,
};

use crate::callbacks::TreeCallbacks;
use crate::config::TreeOptions;
use crate::persistence::{write_state, KeyValueStore, PersistedState};
use crate::registry::InstanceId;

pub use edit::{NewNode, RenameSession};
pub use selection::Direction;

/// A fetch the engine should run on behalf of an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Node whose children are wanted; `None` is the root level.
    pub node: Option<NodeId>,
    /// Identifies this request; responses carrying an older value are stale.
    pub generation: u64,
}

/// Scroll position of the instance's container, in host units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    pub offset_x: f32,
    pub offset_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Viewport {
    /// Scroll by `(dx, dy)` within bounds. Returns whether anything moved.
    pub fn scroll_by(&mut self, dx: f32, dy: f32) -> bool {
        let x = (self.offset_x + dx).clamp(0.0, self.max_x.max(0.0));
        let y = (self.offset_y + dy).clamp(0.0, self.max_y.max(0.0));
        let moved = x != self.offset_x || y != self.offset_y;
        self.offset_x = x;
        self.offset_y = y;
        moved
    }

    /// Update the scrollable extent, clamping the current offset.
    pub fn set_bounds(&mut self, max_x: f32, max_y: f32) {
        self.max_x = max_x.max(0.0);
        self.max_y = max_y.max(0.0);
        self.scroll_by(0.0, 0.0);
    }
}

#[derive(Debug, Default)]
struct LoadTracker {
    generation: u64,
    in_flight: HashMap<Option<NodeId>, u64>,
    requests: Vec<LoadRequest>,
}

/// One tree widget.
pub struct TreeInstance {
    id: InstanceId,
    options: TreeOptions,
    tree: Tree,
    selected: Vec<NodeId>,
    hovered: Option<NodeId>,
    locked: bool,
    callbacks: Box<dyn TreeCallbacks>,
    store: Box<dyn KeyValueStore>,
    rename: Option<RenameSession>,
    viewport: Viewport,
    scroll_request: Option<NodeId>,
    loads: LoadTracker,
    /// Persisted/default open ids not present in the arena yet.
    pending_open: Vec<NodeId>,
    /// Persisted/default selected ids not present in the arena yet.
    pending_select: Vec<NodeId>,
    /// Nodes to open recursively once their children arrive.
    cascade_open: HashSet<NodeId>,
    /// Root level comes from the fetcher even without a `data.url`.
    remote_root: bool,
}

impl fmt::Debug for TreeInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeInstance")
            .field("id", &self.id)
            .field("nodes", &self.tree.len())
            .field("selected", &self.selected)
            .field("hovered", &self.hovered)
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}

impl TreeInstance {
    /// Create an empty instance. Call [`TreeInstance::initialize`] to load it.
    pub fn new(
        id: InstanceId,
        options: TreeOptions,
        callbacks: Box<dyn TreeCallbacks>,
        store: Box<dyn KeyValueStore>,
    ) -> Self {
        let tree = Tree::new(options.rules.type_attr.clone());
        Self {
            id,
            options,
            tree,
            selected: Vec::new(),
            hovered: None,
            locked: false,
            callbacks,
            store,
            rename: None,
            viewport: Viewport::default(),
            scroll_request: None,
            loads: LoadTracker::default(),
            pending_open: Vec::new(),
            pending_select: Vec::new(),
            cascade_open: HashSet::new(),
            remote_root: false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Selected ids in selection order.
    pub fn selected(&self) -> &[NodeId] {
        &self.selected
    }

    pub fn hovered(&self) -> Option<&NodeId> {
        self.hovered.as_ref()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn rename_session(&self) -> Option<&RenameSession> {
        self.rename.as_ref()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Node the view should bring into sight, consumed once.
    pub fn take_scroll_request(&mut self) -> Option<NodeId> {
        self.scroll_request.take()
    }

    /// Fetches queued since the last call.
    pub fn take_load_requests(&mut self) -> Vec<LoadRequest> {
        std::mem::take(&mut self.loads.requests)
    }

    /// Whether a fetch for `node` (`None` = root) is outstanding.
    pub fn is_loading(&self, node: Option<&NodeId>) -> bool {
        self.loads.in_flight.contains_key(&node.cloned())
    }

    pub fn has_pending_loads(&self) -> bool {
        !self.loads.in_flight.is_empty()
    }

    fn render_context(&self) -> RenderContext<'_> {
        RenderContext {
            lang: self.options.current_language(),
            selected: &self.selected,
            hovered: self.hovered.as_ref(),
            loading_label: &self.options.lang.loading,
        }
    }

    /// Visible rows in display order.
    pub fn rows(&self) -> Vec<RenderedRow> {
        visible_rows(&self.tree, &self.render_context())
    }

    /// Nested projection with class names.
    pub fn render(&self) -> Vec<RenderedNode> {
        render(&self.tree, &self.render_context())
    }

    /// Visible rows as an indented plain-text outline.
    pub fn outline(&self) -> String {
        render_text(&self.tree, &self.render_context())
    }

    /// Title of `id` in the instance's language.
    pub fn title(&self, id: &NodeId) -> Option<&str> {
        let lang = self.options.current_language();
        self.tree.get(id).map(|n| n.title(lang))
    }

    /// Serialize a subtree, or the whole tree, into the data contract.
    pub fn get_json(&self, node: Option<&NodeId>) -> Vec<NodeData> {
        match node {
            Some(id) => self.tree.export(id).into_iter().collect(),
            None => self.tree.export_all(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Error reporting
    // ─────────────────────────────────────────────────────────────────────

    /// Hand `err` to the `error` callback and give it back for returning.
    pub(crate) fn report(&mut self, err: Error) -> Error {
        warn!("Tree {}: {}", self.id, err);
        self.callbacks.error(&err.code(), self.id);
        err
    }

    fn ensure_unlocked(&mut self) -> Result<()> {
        if self.locked {
            return Err(self.report(Error::Locked));
        }
        Ok(())
    }

    fn require(&mut self, id: &NodeId) -> Result<()> {
        if !self.tree.contains(id) {
            return Err(self.report(Error::unknown_node(id)));
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Loading
    // ─────────────────────────────────────────────────────────────────────

    /// Load the configured data source and restore persisted state.
    ///
    /// Persisted open/selected ids win over the configured `opened` and
    /// `selected` defaults, which only apply when nothing was persisted.
    pub fn initialize(&mut self) -> Result<()> {
        let persisted = PersistedState::read(self.store.as_ref(), &self.options.persistence.prefix);
        self.pending_open = persisted
            .open
            .unwrap_or_else(|| self.options.opened.clone());
        self.pending_select = persisted
            .selected
            .unwrap_or_else(|| self.options.selected.clone());
        self.load_root()
    }

    fn load_root(&mut self) -> Result<()> {
        let data = &self.options.data;
        let nodes = if !data.nodes.is_empty() {
            Some(data.nodes.clone())
        } else if let Some(json) = &data.json {
            match Payload::parse(json) {
                Ok(nodes) => Some(nodes),
                Err(e) => return Err(self.report(e)),
            }
        } else if let Some(markup) = &data.markup {
            let kind = match data.kind {
                DataKind::Xml => DataKind::Xml,
                _ => DataKind::Markup,
            };
            match kind.parse(markup) {
                Ok(nodes) => Some(nodes),
                Err(e) => return Err(self.report(e)),
            }
        } else {
            None
        };

        match nodes {
            Some(nodes) => {
                if let Err(e) = self.tree.load(&nodes, None) {
                    return Err(self.report(e));
                }
                debug!("Tree {}: loaded {} nodes", self.id, self.tree.len());
                self.restore_pending();
                self.callbacks.on_load(self.id);
                self.persist();
            }
            None if self.remote_root || data.url.is_some() => self.start_load(None),
            None => {
                self.callbacks.on_load(self.id);
            }
        }
        Ok(())
    }

    /// Fetch the root level when no inline data is configured.
    pub(crate) fn set_remote_root(&mut self, remote: bool) {
        self.remote_root = remote;
    }

    /// Queue a fetch unless one for the same node is already in flight.
    fn start_load(&mut self, node: Option<NodeId>) {
        if self.loads.in_flight.contains_key(&node) {
            debug!("Tree {}: load for {:?} already in flight", self.id, node);
            return;
        }
        self.loads.generation += 1;
        let generation = self.loads.generation;
        if let Some(id) = &node {
            if let Err(e) = self.tree.begin_load(id) {
                warn!("Tree {}: cannot load {}: {}", self.id, id, e);
                return;
            }
        }
        debug!("Tree {}: loading {:?} (generation {})", self.id, node, generation);
        self.loads.in_flight.insert(node.clone(), generation);
        self.loads.requests.push(LoadRequest { node, generation });
    }

    fn is_current(&self, node: &Option<NodeId>, generation: u64) -> bool {
        self.loads.in_flight.get(node) == Some(&generation)
    }

    /// Apply a fetch response. Stale responses are discarded.
    pub fn finish_load(
        &mut self,
        node: Option<NodeId>,
        generation: u64,
        nodes: Vec<NodeData>,
    ) -> Result<Vec<NodeId>> {
        if !self.is_current(&node, generation) {
            debug!("Tree {}: discarding stale load for {:?}", self.id, node);
            return Ok(Vec::new());
        }
        self.loads.in_flight.remove(&node);

        let inserted = match &node {
            None => match self.tree.load(&nodes, None) {
                Ok(ids) => ids,
                Err(e) => return Err(self.report(e)),
            },
            Some(id) => match self.tree.finish_load(id, &nodes) {
                Ok(ids) => ids,
                Err(e) => return Err(self.report(e)),
            },
        };

        match &node {
            None => self.callbacks.on_load(self.id),
            Some(id) => {
                self.callbacks.on_load_node(id, self.id);
                if self.tree.get(id).map(|n| n.state()) == Some(NodeState::Open) {
                    self.callbacks.on_open(id, self.id);
                }
                if self.cascade_open.remove(id) {
                    self.open_subtree(Some(id))?;
                }
            }
        }
        self.restore_pending();
        self.persist();
        Ok(inserted)
    }

    /// Record a failed or timed-out fetch. The node becomes a leaf and the
    /// error is reported; stale failures are ignored.
    pub fn fail_load(&mut self, node: Option<NodeId>, generation: u64, err: Error) -> Result<()> {
        if !self.is_current(&node, generation) {
            debug!("Tree {}: discarding stale failure for {:?}", self.id, node);
            return Ok(());
        }
        self.loads.in_flight.remove(&node);
        if let Some(id) = &node {
            self.tree.fail_load(id);
            self.cascade_open.remove(id);
        }
        Err(self.report(err))
    }

    /// Open/select persisted ids that have appeared in the arena.
    fn restore_pending(&mut self) {
        let open = std::mem::take(&mut self.pending_open);
        for id in open {
            match self.tree.get(&id).map(|n| n.state()) {
                None => self.pending_open.push(id),
                Some(NodeState::Closed) => {
                    if self.tree.get(&id).is_some_and(|n| n.has_pending_children()) {
                        self.start_load(Some(id));
                    } else if let Err(e) = self.tree.set_state(&id, NodeState::Open) {
                        debug!("Tree {}: cannot restore {}: {}", self.id, id, e);
                    }
                }
                Some(_) => {}
            }
        }

        let select = std::mem::take(&mut self.pending_select);
        for id in select {
            if self.tree.contains(&id) {
                if !self.selected.contains(&id) {
                    self.selected.push(id);
                }
            } else {
                self.pending_select.push(id);
            }
        }
    }

    /// Drop the arena and load the data source again. Open and selected
    /// state survive through the store.
    pub fn refresh(&mut self) -> Result<()> {
        self.ensure_unlocked()?;
        self.persist();
        self.tree.clear();
        self.selected.clear();
        self.hovered = None;
        self.rename = None;
        self.cascade_open.clear();
        self.loads.in_flight.clear();
        self.loads.requests.clear();
        self.initialize()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Open / close
    // ─────────────────────────────────────────────────────────────────────

    /// Open a node, fetching its children first when they are not known.
    ///
    /// A node that is already loading reuses the pending fetch.
    pub fn open_node(&mut self, id: &NodeId) -> Result<bool> {
        self.ensure_unlocked()?;
        let (state, loading, pending) = match self.tree.get(id) {
            Some(n) => (n.state(), n.is_loading(), n.has_pending_children()),
            None => return Err(self.report(Error::unknown_node(id))),
        };
        match state {
            NodeState::Leaf => Err(self.report(Error::invalid_operation("OPEN: OPENING_LEAF"))),
            NodeState::Open => Ok(true),
            NodeState::Closed if loading => {
                // Closed while loading: show it again, the fetch is still running.
                self.tree.set_state(id, NodeState::Open)?;
                Ok(true)
            }
            NodeState::Closed => {
                if !self.callbacks.before_open(id, self.id) {
                    return Ok(false);
                }
                if pending {
                    self.start_load(Some(id.clone()));
                } else {
                    self.tree.set_state(id, NodeState::Open)?;
                    self.callbacks.on_open(id, self.id);
                }
                self.persist();
                Ok(true)
            }
        }
    }

    /// Close a node. Selected descendants are deselected; in multi-select
    /// mode with other selected survivors the closing node joins the
    /// selection, otherwise the selection is cleared.
    pub fn close_node(&mut self, id: &NodeId) -> Result<bool> {
        self.ensure_unlocked()?;
        let state = match self.tree.get(id) {
            Some(n) => n.state(),
            None => return Err(self.report(Error::unknown_node(id))),
        };
        if state != NodeState::Open {
            return Ok(false);
        }
        if !self.callbacks.before_close(id, self.id) {
            return Ok(false);
        }
        self.tree.set_state(id, NodeState::Closed)?;

        let hidden: Vec<NodeId> = self
            .selected
            .iter()
            .filter(|s| *s != id && self.tree.is_self_or_ancestor(id, s))
            .cloned()
            .collect();
        if !hidden.is_empty() {
            self.selected.retain(|s| !hidden.contains(s));
            for node in &hidden {
                self.callbacks.on_deselect(node, self.id);
            }
            let multiple = self.options.rules.multiple != grove_core::MultipleMode::Off;
            if multiple && !self.selected.is_empty() {
                if !self.selected.contains(id) {
                    self.selected.push(id.clone());
                    self.callbacks.on_change(id, self.id);
                }
            } else {
                self.selected.clear();
            }
        }
        if let Some(h) = self.hovered.clone() {
            if &h != id && self.tree.is_self_or_ancestor(id, &h) {
                self.hovered = Some(id.clone());
            }
        }

        self.callbacks.on_close(id, self.id);
        self.persist();
        Ok(true)
    }

    /// Open a closed node, close an open one. Leaves are left alone.
    pub fn toggle_node(&mut self, id: &NodeId) -> Result<bool> {
        self.ensure_unlocked()?;
        let state = match self.tree.get(id) {
            Some(n) => n.state(),
            None => return Err(self.report(Error::unknown_node(id))),
        };
        match state {
            NodeState::Open => self.close_node(id),
            NodeState::Closed => self.open_node(id),
            NodeState::Leaf => Ok(false),
        }
    }

    /// Open every node below `root` (or the whole tree). Nodes with unknown
    /// children are fetched and opened recursively as they arrive.
    pub fn open_all(&mut self, root: Option<&NodeId>) -> Result<()> {
        self.ensure_unlocked()?;
        self.open_subtree(root)
    }

    fn open_subtree(&mut self, root: Option<&NodeId>) -> Result<()> {
        let targets = match root {
            Some(id) => {
                self.require(id)?;
                self.tree.subtree(id)
            }
            None => self.tree.preorder(),
        };
        for id in targets {
            let Some(node) = self.tree.get(&id) else {
                continue;
            };
            if node.state() != NodeState::Closed {
                continue;
            }
            if node.has_pending_children() {
                self.cascade_open.insert(id.clone());
                self.start_load(Some(id));
            } else {
                self.tree.set_state(&id, NodeState::Open)?;
                self.callbacks.on_open(&id, self.id);
            }
        }
        self.persist();
        Ok(())
    }

    /// Close every open node below `root` (or the whole tree).
    pub fn close_all(&mut self, root: Option<&NodeId>) -> Result<()> {
        self.ensure_unlocked()?;
        let targets = match root {
            Some(id) => {
                self.require(id)?;
                self.tree.subtree(id)
            }
            None => self.tree.preorder(),
        };
        for id in targets {
            if self.tree.get(&id).map(|n| n.state()) == Some(NodeState::Open) {
                self.close_node(&id)?;
            }
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Locking
    // ─────────────────────────────────────────────────────────────────────

    /// Freeze the instance: every operation that changes the arena, the
    /// open set or the selection reports `LOCKED` until
    /// [`TreeInstance::unlock`]. Fetches already in flight still land.
    pub fn lock(&mut self) {
        debug!("Tree {}: locked", self.id);
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        debug!("Tree {}: unlocked", self.id);
        self.locked = false;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────────────

    /// Ids currently open, including persisted ones not loaded yet.
    pub fn open_ids(&self) -> Vec<NodeId> {
        let mut open: Vec<NodeId> = self
            .tree
            .preorder()
            .into_iter()
            .filter(|id| self.tree.get(id).map(|n| n.state()) == Some(NodeState::Open))
            .collect();
        open.extend(self.pending_open.iter().cloned());
        open
    }

    /// Write open (and selected) ids to the store. Failures are logged.
    fn persist(&mut self) {
        let open = self.open_ids();
        let selected: Option<Vec<NodeId>> = self.options.persistence.persist_selected.then(|| {
            self.selected
                .iter()
                .chain(self.pending_select.iter())
                .cloned()
                .collect()
        });
        if let Err(e) = write_state(
            self.store.as_mut(),
            &self.options.persistence.prefix,
            &open,
            selected.as_deref(),
        ) {
            warn!("Tree {}: failed to persist state: {}", self.id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::test_utils::{ids, sample_options, typed, Recorder};
    use grove_core::DeclaredState;

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

    fn async_options() -> TreeOptions {
        let mut options = TreeOptions::with_nodes(vec![
            typed("lazy", "folder").with_state(DeclaredState::Closed),
            typed("file", "file"),
        ]);
        options.data.async_load = true;
        options
    }

    #[test]
    fn test_initialize_from_inline_json() {
        let mut options = TreeOptions::default();
        options.data.json = Some(r#"[{"attributes": {"id": "a"}, "data": "A"}]"#.to_string());
        let (inst, recorder) = instance(options);
        assert_eq!(inst.tree().len(), 1);
        assert_eq!(recorder.count("on_load"), 1);
    }

    #[test]
    fn test_invalid_inline_json_reports_error() {
        let mut options = TreeOptions::default();
        options.data.json = Some("{broken".to_string());
        let recorder = Recorder::default();
        let mut inst = TreeInstance::new(
            1,
            options,
            Box::new(recorder.clone()),
            Box::new(MemoryStore::new()),
        );
        assert!(inst.initialize().is_err());
        assert_eq!(recorder.errors(), vec!["PARSE: INVALID JSON"]);
    }

    #[test]
    fn test_inline_markup_and_xml_build_the_json_tree() {
        let mut json = TreeOptions::default();
        json.data.json = Some(
            r#"[{"attributes": {"id": "home", "rel": "folder"}, "data": "Home", "state": "open",
                 "children": [{"attributes": {"id": "a", "rel": "file"}, "data": "A"}]},
                {"attributes": {"id": "b", "rel": "file"}, "data": {"en": "B", "fr": "Bé"}}]"#
                .to_string(),
        );
        let mut markup = TreeOptions::default();
        markup.data.markup = Some(
            r#"<ul>
                <li id="home" rel="folder" class="open"><a>Home</a>
                    <ul><li id="a" rel="file"><a>A</a></li></ul>
                </li>
                <li id="b" rel="file"><a class="en">B</a><a class="fr">Bé</a></li>
            </ul>"#
                .to_string(),
        );
        let mut xml = TreeOptions::default();
        xml.data.kind = DataKind::Xml;
        xml.data.markup = Some(
            r#"<root>
                <item id="home" rel="folder" state="open">
                    <content><name>Home</name></content>
                    <item id="a" rel="file"><content><name>A</name></content></item>
                </item>
                <item id="b" rel="file">
                    <content><name lang="en">B</name><name lang="fr">Bé</name></content>
                </item>
            </root>"#
                .to_string(),
        );

        let (from_json, _) = instance(json);
        let (from_markup, _) = instance(markup);
        let (from_xml, _) = instance(xml);
        assert_eq!(from_markup.get_json(None), from_json.get_json(None));
        assert_eq!(from_xml.get_json(None), from_json.get_json(None));
        assert_eq!(from_markup.open_ids(), vec![NodeId::new("home")]);
        assert_eq!(from_xml.outline(), from_json.outline());
    }

    #[test]
    fn test_invalid_inline_markup_reports_error() {
        let mut options = TreeOptions::default();
        options.data.markup = Some("<ul><li>".to_string());
        let recorder = Recorder::default();
        let mut inst = TreeInstance::new(
            1,
            options,
            Box::new(recorder.clone()),
            Box::new(MemoryStore::new()),
        );
        assert!(inst.initialize().is_err());
        assert_eq!(recorder.errors(), vec!["PARSE: INVALID MARKUP"]);
    }

    #[test]
    fn test_outline_follows_open_state() {
        let (mut inst, _) = instance(sample_options());
        assert!(inst.outline().starts_with("+ Home\n"));

        inst.open_node(&NodeId::new("home")).unwrap();
        let outline = inst.outline();
        assert!(outline.starts_with("- Home\n"));
        assert!(outline.contains("\n    A\n"));
        assert!(outline.ends_with("Second\n"));
    }

    #[test]
    fn test_open_leaf_is_invalid_operation() {
        let (mut inst, recorder) = instance(sample_options());
        let err = inst.open_node(&NodeId::new("second")).unwrap_err();
        assert_eq!(err.code(), "OPEN: OPENING_LEAF");
        assert_eq!(recorder.errors(), vec!["OPEN: OPENING_LEAF"]);
    }

    #[test]
    fn test_open_pending_node_queues_one_load() {
        let (mut inst, _) = instance(async_options());
        let lazy = NodeId::new("lazy");

        assert!(inst.open_node(&lazy).unwrap());
        assert!(inst.open_node(&lazy).unwrap());
        let requests = inst.take_load_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].node, Some(lazy.clone()));
        assert!(inst.tree().get(&lazy).unwrap().is_loading());
        inst.tree().validate().unwrap();
    }

    #[test]
    fn test_finish_load_inserts_children_and_fires_open() {
        let (mut inst, recorder) = instance(async_options());
        let lazy = NodeId::new("lazy");
        inst.open_node(&lazy).unwrap();
        let request = inst.take_load_requests().remove(0);

        inst.finish_load(
            request.node,
            request.generation,
            vec![typed("child", "file")],
        )
        .unwrap();

        let node = inst.tree().get(&lazy).unwrap();
        assert_eq!(node.state(), NodeState::Open);
        assert_eq!(node.children(), &ids(&["child"])[..]);
        assert_eq!(recorder.count("on_open"), 1);
        assert!(!inst.has_pending_loads());
        inst.tree().validate().unwrap();
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let (mut inst, _) = instance(async_options());
        let lazy = NodeId::new("lazy");
        inst.open_node(&lazy).unwrap();
        let request = inst.take_load_requests().remove(0);

        let inserted = inst
            .finish_load(request.node.clone(), request.generation + 7, vec![typed("x", "file")])
            .unwrap();
        assert!(inserted.is_empty());
        assert!(inst.tree().get(&lazy).unwrap().is_loading());
    }

    #[test]
    fn test_failed_load_turns_node_into_leaf() {
        let (mut inst, recorder) = instance(async_options());
        let lazy = NodeId::new("lazy");
        inst.open_node(&lazy).unwrap();
        let request = inst.take_load_requests().remove(0);

        let err = inst
            .fail_load(request.node, request.generation, Error::load_failed("boom"))
            .unwrap_err();
        assert_eq!(err.code(), "LOAD: FAILED");
        assert_eq!(inst.tree().get(&lazy).unwrap().state(), NodeState::Leaf);
        assert_eq!(recorder.errors(), vec!["LOAD: FAILED"]);
        inst.tree().validate().unwrap();
    }

    #[test]
    fn test_close_clears_selected_descendant_in_single_mode() {
        let (mut inst, _) = instance(sample_options());
        let home = NodeId::new("home");
        inst.open_node(&home).unwrap();
        inst.select_node(&NodeId::new("a"), false).unwrap();

        inst.close_node(&home).unwrap();
        assert!(inst.selected().is_empty());
    }

    #[test]
    fn test_close_moves_selection_to_closing_node_with_survivors() {
        let mut options = sample_options();
        options.rules.multiple = grove_core::MultipleMode::On;
        let (mut inst, _) = instance(options);
        let home = NodeId::new("home");
        inst.open_node(&home).unwrap();
        inst.select_node(&NodeId::new("a"), true).unwrap();
        inst.select_node(&NodeId::new("second"), true).unwrap();

        inst.close_node(&home).unwrap();
        assert_eq!(inst.selected(), &ids(&["second", "home"])[..]);
    }

    #[test]
    fn test_before_open_veto() {
        let (mut inst, recorder) = instance(sample_options());
        recorder.veto("before_open");
        assert!(!inst.open_node(&NodeId::new("home")).unwrap());
        assert_eq!(
            inst.tree().get(&NodeId::new("home")).unwrap().state(),
            NodeState::Closed
        );
        assert!(recorder.errors().is_empty());
    }

    #[test]
    fn test_open_all_and_close_all() {
        let (mut inst, _) = instance(sample_options());
        inst.open_all(None).unwrap();
        assert_eq!(inst.open_ids(), ids(&["home"]));
        inst.close_all(None).unwrap();
        assert!(inst.open_ids().is_empty());
    }

    #[test]
    fn test_open_all_cascades_through_async_loads() {
        let (mut inst, _) = instance(async_options());
        inst.open_all(None).unwrap();
        let request = inst.take_load_requests().remove(0);
        inst.finish_load(
            request.node,
            request.generation,
            vec![typed("sub", "folder").with_children(vec![typed("leaf", "file")])],
        )
        .unwrap();
        assert_eq!(inst.open_ids(), ids(&["lazy", "sub"]));
    }

    #[test]
    fn test_locked_refresh_reports_locked() {
        let (mut inst, recorder) = instance(sample_options());
        inst.lock();
        assert!(inst.refresh().is_err());
        assert_eq!(recorder.errors(), vec!["LOCKED"]);
        inst.unlock();
        inst.refresh().unwrap();
        assert_eq!(inst.tree().len(), 4);
    }

    #[test]
    fn test_locked_tree_keeps_selection_and_open_set() {
        let store = MemoryStore::new();
        let recorder = Recorder::default();
        let mut inst = TreeInstance::new(
            1,
            sample_options(),
            Box::new(recorder.clone()),
            Box::new(store.clone()),
        );
        inst.initialize().unwrap();
        let home = NodeId::new("home");
        inst.select_node(&NodeId::new("second"), false).unwrap();
        let snapshot = |s: &MemoryStore| (s.get_item("grove_open"), s.get_item("grove_selected"));
        let before = snapshot(&store);

        inst.lock();
        assert!(inst.select_node(&home, false).is_err());
        assert!(inst.deselect_node(&NodeId::new("second")).is_err());
        assert!(inst.deselect_all().is_err());
        assert!(inst.open_node(&home).is_err());
        assert!(inst.toggle_node(&home).is_err());
        assert!(inst.open_all(None).is_err());
        assert!(inst.close_all(None).is_err());
        assert_eq!(recorder.errors(), vec!["LOCKED"; 7]);

        assert_eq!(inst.selected(), &ids(&["second"])[..]);
        assert!(inst.open_ids().is_empty());
        assert_eq!(snapshot(&store), before);

        inst.unlock();
        assert!(inst.open_node(&home).unwrap());
        assert_eq!(inst.open_ids(), ids(&["home"]));
    }

    #[test]
    fn test_persisted_state_wins_over_defaults() {
        let store = MemoryStore::new();
        let mut options = sample_options();
        options.opened = ids(&["home"]);

        let mut first = TreeInstance::new(
            1,
            options.clone(),
            Box::new(Recorder::default()),
            Box::new(store.clone()),
        );
        first.initialize().unwrap();
        assert_eq!(first.open_ids(), ids(&["home"]));
        first.close_node(&NodeId::new("home")).unwrap();
        first.select_node(&NodeId::new("second"), false).unwrap();

        let mut second = TreeInstance::new(
            2,
            options,
            Box::new(Recorder::default()),
            Box::new(store.clone()),
        );
        second.initialize().unwrap();
        assert!(second.open_ids().is_empty());
        assert_eq!(second.selected(), &ids(&["second"])[..]);
    }

    #[test]
    fn test_viewport_scroll_is_clamped() {
        let mut viewport = Viewport::default();
        viewport.set_bounds(0.0, 30.0);
        assert!(viewport.scroll_by(5.0, 50.0));
        assert_eq!(viewport.offset_x, 0.0);
        assert_eq!(viewport.offset_y, 30.0);
        assert!(!viewport.scroll_by(0.0, 10.0));
    }
}

//! # Node Domain Types
//!
//! A [`Node`] is one entry in a tree instance's arena. Structural fields
//! (`parent`, `children`, `state`, `is_last`) are owned by [`crate::tree::Tree`]
//! and only exposed read-only, so every mutation goes through code that
//! repairs the invariants.
//!
//! ## Key Types
//!
//! - [`NodeId`] - Opaque, string-backed node identity (as supplied by the data source)
//! - [`NodeState`] - `Leaf`, `Open` or `Closed`
//! - [`DropPosition`] - `Before`, `After` or `Inside` a reference node
//! - [`Labels`] - Per-language titles and icons
//! - [`NodeMetadata`] - Optional constraints and per-node rule overrides

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// NodeId
// ============================================================================

/// Identity of a node within one tree instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ============================================================================
// NodeState
// ============================================================================

/// Expansion state of a node. Exactly one applies at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    /// No children and nothing left to load.
    #[default]
    Leaf,
    /// Children are shown (or are being loaded).
    Open,
    /// Children exist or are declared but hidden.
    Closed,
}

impl NodeState {
    /// Rendering class for this state.
    pub fn class(&self) -> &'static str {
        match self {
            NodeState::Leaf => "leaf",
            NodeState::Open => "open",
            NodeState::Closed => "closed",
        }
    }
}

// ============================================================================
// DropPosition
// ============================================================================

/// Where a moved or created node lands relative to a reference node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPosition {
    Before,
    After,
    Inside,
}

impl DropPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropPosition::Before => "before",
            DropPosition::After => "after",
            DropPosition::Inside => "inside",
        }
    }

    /// Parse the lowercase keyword used by drag rules.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "before" => Some(Self::Before),
            "after" => Some(Self::After),
            "inside" => Some(Self::Inside),
            _ => None,
        }
    }
}

impl fmt::Display for DropPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Labels
// ============================================================================

/// Title and optional icon of a node in one language.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Label {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Label {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            icon: None,
        }
    }
}

/// Per-language labels. Single-language trees store one entry under
/// [`Labels::DEFAULT_LANG`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Labels(BTreeMap<String, Label>);

impl Labels {
    /// Key used when a tree declares no languages.
    pub const DEFAULT_LANG: &'static str = "";

    pub fn single(title: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(Self::DEFAULT_LANG.to_string(), Label::new(title));
        Self(map)
    }

    pub fn insert(&mut self, lang: impl Into<String>, label: Label) {
        self.0.insert(lang.into(), label);
    }

    /// Label for `lang`, falling back to the first available label.
    pub fn get(&self, lang: Option<&str>) -> Option<&Label> {
        lang.and_then(|l| self.0.get(l))
            .or_else(|| self.0.get(Self::DEFAULT_LANG))
            .or_else(|| self.0.values().next())
    }

    pub fn title(&self, lang: Option<&str>) -> &str {
        self.get(lang).map(|l| l.title.as_str()).unwrap_or("")
    }

    /// Set the title for `lang` (or the default slot), keeping any icon.
    pub fn set_title(&mut self, lang: Option<&str>, title: impl Into<String>) {
        let key = lang.unwrap_or(Self::DEFAULT_LANG).to_string();
        self.0.entry(key).or_default().title = title.into();
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Label)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keep only the variants in `languages`; languages the node lacks are
    /// filled from its first label. An empty list collapses to the default
    /// slot.
    pub fn retain_languages(&mut self, languages: &[String]) {
        let fallback = self.get(None).cloned().unwrap_or_default();
        if languages.is_empty() {
            *self = Self(BTreeMap::from([(Self::DEFAULT_LANG.to_string(), fallback)]));
            return;
        }
        let mut kept = BTreeMap::new();
        for lang in languages {
            let label = self.0.get(lang).cloned().unwrap_or_else(|| fallback.clone());
            kept.insert(lang.clone(), label);
        }
        self.0 = kept;
    }
}

// ============================================================================
// NodeMetadata
// ============================================================================

/// Optional constraints and rule overrides attached to a node.
///
/// Constraints are only consulted when the rule set enables metadata;
/// overrides only when it enables inline rules.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_children: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_children: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clickable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renameable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creatable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draggable: Option<bool>,
}

impl NodeMetadata {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// Node
// ============================================================================

/// One record in a tree arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) node_type: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) state: NodeState,
    pub(crate) is_last: bool,
    /// Children are declared by the source but not fetched yet.
    pub(crate) children_pending: bool,
    /// A fetch for this node's children is in flight.
    pub(crate) loading: bool,

    pub labels: Labels,
    /// Remaining source attributes (`class`, custom data).
    pub attributes: BTreeMap<String, String>,
    pub metadata: NodeMetadata,
}

impl Node {
    /// A detached leaf. Insert it through [`crate::tree::Tree::insert`].
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>, labels: Labels) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            parent: None,
            children: Vec::new(),
            state: NodeState::Leaf,
            is_last: false,
            children_pending: false,
            loading: false,
            labels,
            attributes: BTreeMap::new(),
            metadata: NodeMetadata::default(),
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn parent(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn is_last(&self) -> bool {
        self.is_last
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Children are declared but have not been fetched.
    pub fn has_pending_children(&self) -> bool {
        self.children_pending
    }

    pub fn title(&self, lang: Option<&str>) -> &str {
        self.labels.title(lang)
    }

    /// Space separated `class` attribute split into names.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace())
            .into_iter()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_fall_back_to_first_language() {
        let mut labels = Labels::default();
        labels.insert("en", Label::new("Home"));
        labels.insert("fr", Label::new("Accueil"));

        assert_eq!(labels.title(Some("fr")), "Accueil");
        assert_eq!(labels.title(Some("de")), "Home");
        assert_eq!(labels.title(None), "Home");
    }

    #[test]
    fn test_retain_languages_strips_and_fills() {
        let mut labels = Labels::default();
        labels.insert("en", Label::new("Home"));
        labels.insert("fr", Label::new("Accueil"));

        labels.retain_languages(&["fr".to_string(), "de".to_string()]);

        let langs: Vec<&str> = labels.languages().collect();
        assert_eq!(langs, vec!["de", "fr"]);
        assert_eq!(labels.title(Some("fr")), "Accueil");
        // "de" was missing, filled from the first available label
        assert_eq!(labels.title(Some("de")), "Home");
    }

    #[test]
    fn test_retain_no_languages_collapses_to_default() {
        let mut labels = Labels::default();
        labels.insert("en", Label::new("Home"));
        labels.retain_languages(&[]);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels.title(None), "Home");
    }

    #[test]
    fn test_drop_position_parse() {
        assert_eq!(DropPosition::parse("inside"), Some(DropPosition::Inside));
        assert_eq!(DropPosition::parse("*"), None);
        assert_eq!(DropPosition::After.to_string(), "after");
    }

    #[test]
    fn test_node_classes() {
        let mut node = Node::new("a", "page", Labels::single("A"));
        node.attributes
            .insert("class".to_string(), "draft  published".to_string());
        let classes: Vec<&str> = node.classes().collect();
        assert_eq!(classes, vec!["draft", "published"]);
    }
}

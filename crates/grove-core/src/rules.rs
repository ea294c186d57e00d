//! # Rule Engine
//!
//! Pure decision functions over a [`Tree`]: whether a node may be clicked,
//! renamed, deleted, dragged or receive new children, and whether a proposed
//! move or creation is permitted.
//!
//! Nothing here mutates. Callers run [`check_move`] / [`check_create`] first
//! and only mutate on `Ok`, which is what keeps failed drags side-effect free.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::node::{DropPosition, Node, NodeId};
use crate::tree::Tree;

/// Type name used for the root level in rule lists and drag patterns.
pub const ROOT_TYPE: &str = "root";

// ============================================================================
// RuleScope
// ============================================================================

/// Which node types a simple rule applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScopeRepr", into = "ScopeRepr")]
pub enum RuleScope {
    None,
    All,
    Types(Vec<String>),
}

impl RuleScope {
    pub fn allows(&self, node_type: &str) -> bool {
        match self {
            RuleScope::None => false,
            RuleScope::All => true,
            RuleScope::Types(types) => types.iter().any(|t| t == node_type),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ScopeRepr {
    Keyword(String),
    Types(Vec<String>),
}

impl TryFrom<ScopeRepr> for RuleScope {
    type Error = String;

    fn try_from(repr: ScopeRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            ScopeRepr::Keyword(k) => match k.as_str() {
                "none" => Ok(RuleScope::None),
                "all" => Ok(RuleScope::All),
                other => Err(format!("unknown rule scope '{other}' (expected none, all or a list)")),
            },
            ScopeRepr::Types(types) => Ok(RuleScope::Types(types)),
        }
    }
}

impl From<RuleScope> for ScopeRepr {
    fn from(scope: RuleScope) -> Self {
        match scope {
            RuleScope::None => ScopeRepr::Keyword("none".to_string()),
            RuleScope::All => ScopeRepr::Keyword("all".to_string()),
            RuleScope::Types(types) => ScopeRepr::Types(types),
        }
    }
}

/// The simple per-node rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleRule {
    Clickable,
    Renameable,
    Deletable,
    Creatable,
    Draggable,
}

impl SimpleRule {
    pub fn name(&self) -> &'static str {
        match self {
            SimpleRule::Clickable => "clickable",
            SimpleRule::Renameable => "renameable",
            SimpleRule::Deletable => "deletable",
            SimpleRule::Creatable => "creatable",
            SimpleRule::Draggable => "draggable",
        }
    }
}

// ============================================================================
// Drag rules
// ============================================================================

/// One signed pattern `"[!]source position target"`. `*` matches anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragRule {
    pub allow: bool,
    pub source: Option<String>,
    pub position: Option<DropPosition>,
    pub target: Option<String>,
}

impl DragRule {
    pub fn matches(&self, source: &str, position: DropPosition, target: &str) -> bool {
        self.source.as_deref().is_none_or(|s| s == source)
            && self.position.is_none_or(|p| p == position)
            && self.target.as_deref().is_none_or(|t| t == target)
    }
}

impl FromStr for DragRule {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (allow, body) = match trimmed.strip_prefix('!') {
            Some(rest) => (false, rest.trim_start()),
            None => (true, trimmed),
        };
        let parts: Vec<&str> = body.split_whitespace().collect();
        let [source, position, target] = parts.as_slice() else {
            return Err(format!("drag rule '{s}' must have three parts"));
        };
        let wildcard = |p: &str| (p != "*").then(|| p.to_string());
        let position = match *position {
            "*" => None,
            p => Some(DropPosition::parse(p).ok_or_else(|| format!("unknown position '{p}' in drag rule '{s}'"))?),
        };
        Ok(Self {
            allow,
            source: wildcard(source),
            position,
            target: wildcard(target),
        })
    }
}

impl fmt::Display for DragRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} {} {}",
            if self.allow { "" } else { "!" },
            self.source.as_deref().unwrap_or("*"),
            self.position.map(|p| p.as_str()).unwrap_or("*"),
            self.target.as_deref().unwrap_or("*"),
        )
    }
}

/// Ordered pattern list, or `All` to skip pattern checks entirely.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "DragRulesRepr", into = "DragRulesRepr")]
pub enum DragRules {
    #[default]
    All,
    Patterns(Vec<DragRule>),
}

impl DragRules {
    /// First matching pattern decides; no match denies.
    pub fn evaluate(&self, source: &str, position: DropPosition, target: &str) -> bool {
        match self {
            DragRules::All => true,
            DragRules::Patterns(rules) => rules
                .iter()
                .find(|r| r.matches(source, position, target))
                .is_some_and(|r| r.allow),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DragRulesRepr {
    Keyword(String),
    Patterns(Vec<String>),
}

impl TryFrom<DragRulesRepr> for DragRules {
    type Error = String;

    fn try_from(repr: DragRulesRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            DragRulesRepr::Keyword(k) => match k.as_str() {
                "all" => Ok(DragRules::All),
                "none" => Ok(DragRules::Patterns(Vec::new())),
                other => Ok(DragRules::Patterns(vec![other.parse()?])),
            },
            DragRulesRepr::Patterns(list) => list
                .iter()
                .map(|p| p.parse())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(DragRules::Patterns),
        }
    }
}

impl From<DragRules> for DragRulesRepr {
    fn from(rules: DragRules) -> Self {
        match rules {
            DragRules::All => DragRulesRepr::Keyword("all".to_string()),
            DragRules::Patterns(list) => {
                DragRulesRepr::Patterns(list.iter().map(|r| r.to_string()).collect())
            }
        }
    }
}

// ============================================================================
// Mode enums
// ============================================================================

/// Multi-selection behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultipleMode {
    /// One selected node at a time.
    #[default]
    Off,
    /// Every click toggles membership.
    On,
    /// Clicks with the modifier held toggle membership.
    Ctrl,
}

/// Where new nodes are inserted among their siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreateAt {
    Top,
    #[default]
    Bottom,
}

/// When a drop copies instead of moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragCopy {
    Off,
    /// Copy while the modifier key is held.
    #[default]
    Ctrl,
    On,
}

impl DragCopy {
    pub fn is_copy(&self, modifier_held: bool) -> bool {
        match self {
            DragCopy::Off => false,
            DragCopy::Ctrl => modifier_held,
            DragCopy::On => true,
        }
    }
}

// ============================================================================
// RuleSet
// ============================================================================

/// Per-instance rule configuration (`[rules]` in the options file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub multiple: MultipleMode,
    /// Enforce `max_children`, `max_depth` and `valid_children`.
    pub metadata: bool,
    /// Let per-node metadata override the simple rules.
    pub use_inline: bool,
    /// Source attribute holding the node type.
    pub type_attr: String,
    /// Accept drops from and into other instances.
    pub multitree: bool,
    pub createat: CreateAt,
    pub clickable: RuleScope,
    pub renameable: RuleScope,
    pub deletable: RuleScope,
    pub creatable: RuleScope,
    pub draggable: RuleScope,
    pub dragrules: DragRules,
    pub drag_copy: DragCopy,
    /// Classes that make a foreign item droppable. The first class a
    /// foreign item carries from this list becomes its type.
    pub droppable: Vec<String>,
    /// Dropping outside every tree deletes the dragged nodes.
    pub drag_out_delete: bool,

    /// Root-level constraints, used when `metadata` is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_children: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_children: Option<Vec<String>>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            multiple: MultipleMode::default(),
            metadata: false,
            use_inline: false,
            type_attr: "rel".to_string(),
            multitree: false,
            createat: CreateAt::default(),
            clickable: RuleScope::All,
            renameable: RuleScope::All,
            deletable: RuleScope::All,
            creatable: RuleScope::All,
            draggable: RuleScope::None,
            dragrules: DragRules::All,
            drag_copy: DragCopy::default(),
            droppable: Vec::new(),
            drag_out_delete: false,
            max_children: None,
            max_depth: None,
            valid_children: None,
        }
    }
}

impl RuleSet {
    fn scope(&self, rule: SimpleRule) -> &RuleScope {
        match rule {
            SimpleRule::Clickable => &self.clickable,
            SimpleRule::Renameable => &self.renameable,
            SimpleRule::Deletable => &self.deletable,
            SimpleRule::Creatable => &self.creatable,
            SimpleRule::Draggable => &self.draggable,
        }
    }
}

/// Evaluate a simple rule for `node` (`None` is the root level).
pub fn check(rules: &RuleSet, rule: SimpleRule, node: Option<&Node>) -> bool {
    if rules.use_inline {
        if let Some(node) = node {
            let meta = &node.metadata;
            let inline = match rule {
                SimpleRule::Clickable => meta.clickable,
                SimpleRule::Renameable => meta.renameable,
                SimpleRule::Deletable => meta.deletable,
                SimpleRule::Creatable => meta.creatable,
                SimpleRule::Draggable => meta.draggable,
            };
            if let Some(value) = inline {
                return value;
            }
        }
    }
    let node_type = node.map(|n| n.node_type()).unwrap_or(ROOT_TYPE);
    rules.scope(rule).allows(node_type)
}

// ============================================================================
// Moves
// ============================================================================

/// Where a dragged node comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOrigin {
    /// Already in the target tree.
    SameTree,
    /// Duplicated within the target tree; the original stays where it is.
    Copy,
    /// Tracked by another instance.
    OtherTree,
    /// Not tracked by any instance; typed by its classes.
    Foreign { classes: Vec<String> },
}

/// A node taking part in a proposed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSubject {
    pub id: NodeId,
    pub node_type: String,
    /// Levels in the subject's subtree, counting itself.
    pub height: usize,
    pub origin: MoveOrigin,
}

impl MoveSubject {
    /// Describe a node of `tree` as a move subject.
    pub fn from_tree(tree: &Tree, id: &NodeId, origin: MoveOrigin) -> Option<Self> {
        let node = tree.get(id)?;
        Some(Self {
            id: id.clone(),
            node_type: node.node_type().to_string(),
            height: tree.subtree_height(id),
            origin,
        })
    }

    pub fn foreign(id: impl Into<NodeId>, classes: Vec<String>) -> Self {
        Self {
            id: id.into(),
            node_type: String::new(),
            height: 1,
            origin: MoveOrigin::Foreign { classes },
        }
    }
}

/// Validate moving `subjects` to `(reference, position)` in `tree`.
///
/// Each subject after the first is checked against the previous one with
/// position `After`, matching where the batch actually lands. Foreign
/// subjects are tagged with their droppable type in place.
pub fn check_move(
    rules: &RuleSet,
    tree: &Tree,
    subjects: &mut [MoveSubject],
    reference: &NodeId,
    position: DropPosition,
) -> Result<()> {
    if subjects.is_empty() {
        return Err(Error::invalid_operation("MOVE: NOTHING TO MOVE"));
    }
    let ref_node = tree.get(reference).ok_or_else(|| Error::unknown_node(reference))?;
    let (parent, _) = tree.resolve_drop(reference, position)?;

    // Children already at the destination that are not leaving it.
    let staying = tree
        .level(parent.as_ref())
        .iter()
        .filter(|c| {
            !subjects
                .iter()
                .any(|s| s.origin == MoveOrigin::SameTree && &s.id == *c)
        })
        .count();

    let mut ref_type = ref_node.node_type().to_string();
    let mut ref_position = position;
    for (i, subject) in subjects.iter_mut().enumerate() {
        match &subject.origin {
            MoveOrigin::SameTree | MoveOrigin::Copy => {
                if i == 0 && &subject.id == reference {
                    return Err(Error::validation("MOVE: NODE OVER SELF"));
                }
                if let Some(p) = &parent {
                    if tree.is_self_or_ancestor(&subject.id, p) {
                        return Err(Error::validation("MOVE: PARENT OVER CHILD"));
                    }
                }
                if i == 0 && tree.is_self_or_ancestor(&subject.id, reference) {
                    return Err(Error::validation("MOVE: PARENT OVER CHILD"));
                }
            }
            MoveOrigin::OtherTree => {}
            MoveOrigin::Foreign { classes } => {
                let matched = rules
                    .droppable
                    .iter()
                    .find(|d| classes.iter().any(|c| c == *d))
                    .cloned();
                match matched {
                    Some(t) => subject.node_type = t,
                    None => return Err(Error::validation("MOVE: NOT DROPPABLE")),
                }
            }
        }

        if !rules
            .dragrules
            .evaluate(&subject.node_type, ref_position, &ref_type)
        {
            tracing::debug!(
                "Drag rule denied {} {} {}",
                subject.node_type,
                ref_position,
                ref_type
            );
            return Err(Error::validation("MOVE: RULE DENIED"));
        }

        if rules.metadata {
            check_metadata(
                rules,
                tree,
                parent.as_ref(),
                &subject.node_type,
                subject.height,
                staying + i + 1,
                "MOVE",
            )?;
        }

        ref_type = subject.node_type.clone();
        ref_position = DropPosition::After;
    }
    Ok(())
}

/// Validate creating a node of `node_type` under `parent`.
pub fn check_create(
    rules: &RuleSet,
    tree: &Tree,
    parent: Option<&NodeId>,
    node_type: &str,
) -> Result<()> {
    if let Some(p) = parent {
        if !tree.contains(p) {
            return Err(Error::unknown_node(p));
        }
    }
    if !rules.metadata {
        return Ok(());
    }
    let count = tree.level(parent).len() + 1;
    check_metadata(rules, tree, parent, node_type, 1, count, "CREATE")
}

fn check_metadata(
    rules: &RuleSet,
    tree: &Tree,
    parent: Option<&NodeId>,
    node_type: &str,
    height: usize,
    child_count: usize,
    prefix: &str,
) -> Result<()> {
    let (max_children, valid_children) = match parent.and_then(|p| tree.get(p)) {
        Some(node) => (node.metadata.max_children, node.metadata.valid_children.as_ref()),
        None => (rules.max_children, rules.valid_children.as_ref()),
    };

    if let Some(max) = max_children {
        if child_count > max {
            return Err(Error::validation(format!("{prefix}: MAX_CHILDREN REACHED")));
        }
    }

    if let Some(valid) = valid_children {
        if !valid.iter().any(|t| t == node_type) {
            return Err(Error::validation(format!("{prefix}: INVALID CHILD TYPE")));
        }
    }

    // Levels below each ancestor once the subject lands under `parent`.
    if let Some(p) = parent {
        let chain = std::iter::once(p.clone()).chain(tree.ancestors(p));
        for (distance, ancestor) in chain.enumerate() {
            let limit = tree.get(&ancestor).and_then(|n| n.metadata.max_depth);
            if let Some(limit) = limit {
                if distance + height > limit {
                    return Err(Error::validation(format!("{prefix}: MAX_DEPTH REACHED")));
                }
            }
        }
    }
    if let Some(limit) = rules.max_depth {
        let parent_levels = parent.map(|p| tree.depth(p) + 1).unwrap_or(0);
        if parent_levels + height > limit {
            return Err(Error::validation(format!("{prefix}: MAX_DEPTH REACHED")));
        }
    }
    Ok(())
}

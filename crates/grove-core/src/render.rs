//! # Render Projection
//!
//! Pure functions from a [`Tree`] plus instance state to a renderable form.
//! Two shapes are produced:
//!
//! - [`render`] - the nested structure with class names (`open`, `closed`,
//!   `leaf`, `last`, `loading`, `selected`, `hovered`), every node included;
//! - [`visible_rows`] - the flat list of rows a view actually shows, in
//!   pre-order, skipping children of closed nodes and inserting a single
//!   placeholder row under nodes that are loading.

use crate::node::{NodeId, NodeState};
use crate::tree::Tree;

/// Instance state the projection needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext<'a> {
    pub lang: Option<&'a str>,
    pub selected: &'a [NodeId],
    pub hovered: Option<&'a NodeId>,
    /// Text of the placeholder row under loading nodes.
    pub loading_label: &'a str,
}

impl RenderContext<'_> {
    fn is_selected(&self, id: &NodeId) -> bool {
        self.selected.contains(id)
    }

    fn is_hovered(&self, id: &NodeId) -> bool {
        self.hovered == Some(id)
    }
}

/// One node of the nested projection.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNode {
    pub id: NodeId,
    pub title: String,
    pub icon: Option<String>,
    pub classes: Vec<String>,
    pub children: Vec<RenderedNode>,
}

impl RenderedNode {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Nested projection of the whole tree.
pub fn render(tree: &Tree, ctx: &RenderContext<'_>) -> Vec<RenderedNode> {
    tree.roots()
        .iter()
        .filter_map(|id| render_node(tree, id, ctx))
        .collect()
}

fn render_node(tree: &Tree, id: &NodeId, ctx: &RenderContext<'_>) -> Option<RenderedNode> {
    let node = tree.get(id)?;
    let label = node.labels.get(ctx.lang).cloned().unwrap_or_default();

    let mut classes = vec![node.state().class().to_string()];
    if node.is_last() {
        classes.push("last".to_string());
    }
    if node.is_loading() {
        classes.push("loading".to_string());
    }
    if ctx.is_selected(id) {
        classes.push("selected".to_string());
    }
    if ctx.is_hovered(id) {
        classes.push("hovered".to_string());
    }
    classes.extend(node.classes().map(str::to_string));

    let children = if node.is_loading() {
        vec![RenderedNode {
            id: NodeId::new(format!("{id}__loading")),
            title: ctx.loading_label.to_string(),
            icon: None,
            classes: vec!["leaf".to_string(), "last".to_string(), "placeholder".to_string()],
            children: Vec::new(),
        }]
    } else {
        node.children()
            .iter()
            .filter_map(|c| render_node(tree, c, ctx))
            .collect()
    };

    Some(RenderedNode {
        id: id.clone(),
        title: label.title,
        icon: label.icon,
        classes,
        children,
    })
}

/// What a visible row stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    Node(NodeId),
    /// Placeholder shown while the parent's children load.
    Loading { parent: NodeId },
}

/// One visible line of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRow {
    pub kind: RowKind,
    pub depth: usize,
    pub title: String,
    pub icon: Option<String>,
    pub state: NodeState,
    pub is_last: bool,
    pub selected: bool,
    pub hovered: bool,
}

impl RenderedRow {
    pub fn node_id(&self) -> Option<&NodeId> {
        match &self.kind {
            RowKind::Node(id) => Some(id),
            RowKind::Loading { .. } => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, RowKind::Loading { .. })
    }
}

/// Rows currently visible, in display order.
pub fn visible_rows(tree: &Tree, ctx: &RenderContext<'_>) -> Vec<RenderedRow> {
    let mut rows = Vec::new();
    for root in tree.roots() {
        collect_visible(tree, root, 0, ctx, &mut rows);
    }
    rows
}

fn collect_visible(
    tree: &Tree,
    id: &NodeId,
    depth: usize,
    ctx: &RenderContext<'_>,
    rows: &mut Vec<RenderedRow>,
) {
    let Some(node) = tree.get(id) else {
        return;
    };
    let label = node.labels.get(ctx.lang);
    rows.push(RenderedRow {
        kind: RowKind::Node(id.clone()),
        depth,
        title: label.map(|l| l.title.clone()).unwrap_or_default(),
        icon: label.and_then(|l| l.icon.clone()),
        state: node.state(),
        is_last: node.is_last(),
        selected: ctx.is_selected(id),
        hovered: ctx.is_hovered(id),
    });

    if node.state() != NodeState::Open {
        return;
    }
    if node.is_loading() {
        rows.push(RenderedRow {
            kind: RowKind::Loading { parent: id.clone() },
            depth: depth + 1,
            title: ctx.loading_label.to_string(),
            icon: None,
            state: NodeState::Leaf,
            is_last: true,
            selected: false,
            hovered: false,
        });
        return;
    }
    for child in node.children() {
        collect_visible(tree, child, depth + 1, ctx, rows);
    }
}

/// Plain-text outline of the visible rows, one per line.
pub fn render_text(tree: &Tree, ctx: &RenderContext<'_>) -> String {
    let mut out = String::new();
    for row in visible_rows(tree, ctx) {
        let marker = match row.state {
            NodeState::Open => "- ",
            NodeState::Closed => "+ ",
            NodeState::Leaf => "  ",
        };
        out.push_str(&"  ".repeat(row.depth));
        out.push_str(marker);
        if row.selected {
            out.push('*');
        }
        out.push_str(&row.title);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DeclaredState, NodeData};

    fn tree() -> Tree {
        let mut tree = Tree::new("rel");
        tree.load(
            &[
                NodeData::new("home", "Home")
                    .with_state(DeclaredState::Open)
                    .with_children(vec![NodeData::new("a", "A"), NodeData::new("b", "B")]),
                NodeData::new("lazy", "Lazy").with_state(DeclaredState::Closed),
            ],
            None,
        )
        .unwrap();
        tree
    }

    #[test]
    fn test_render_classes() {
        let tree = tree();
        let selected = [NodeId::new("a")];
        let ctx = RenderContext {
            selected: &selected,
            ..Default::default()
        };
        let nested = render(&tree, &ctx);
        assert!(nested[0].has_class("open"));
        assert!(!nested[0].has_class("last"));
        assert!(nested[1].has_class("closed"));
        assert!(nested[1].has_class("last"));
        assert!(nested[0].children[0].has_class("selected"));
        assert!(nested[0].children[0].has_class("leaf"));
        assert!(nested[0].children[1].has_class("last"));
    }

    #[test]
    fn test_visible_rows_skip_closed_children() {
        let mut tree = tree();
        tree.set_state(&NodeId::new("home"), NodeState::Closed).unwrap();
        let rows = visible_rows(&tree, &RenderContext::default());
        let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Home", "Lazy"]);
    }

    #[test]
    fn test_loading_node_shows_single_placeholder() {
        let mut tree = tree();
        tree.begin_load(&NodeId::new("lazy")).unwrap();
        let ctx = RenderContext {
            loading_label: "Loading ...",
            ..Default::default()
        };
        let rows = visible_rows(&tree, &ctx);
        let placeholders: Vec<_> = rows.iter().filter(|r| r.is_placeholder()).collect();
        assert_eq!(placeholders.len(), 1);
        assert_eq!(placeholders[0].title, "Loading ...");
        assert_eq!(placeholders[0].depth, 1);

        let nested = render(&tree, &ctx);
        assert!(nested[1].has_class("loading"));
        assert_eq!(nested[1].children.len(), 1);
    }

    #[test]
    fn test_render_text_outline() {
        let tree = tree();
        let text = render_text(&tree, &RenderContext::default());
        assert_eq!(text, "- Home\n    A\n    B\n+ Lazy\n");
    }
}

//! Geometry a view reports for hit-testing

use grove_core::{DropPosition, NodeId, Point, Rect};

use crate::registry::InstanceId;

/// Screen rectangle of one visible node row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    pub node: NodeId,
    pub rect: Rect,
}

/// Where an instance is drawn and where its rows are, in the same
/// coordinate space as pointer events. Row rects are already scrolled.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerLayout {
    pub instance: InstanceId,
    pub viewport: Rect,
    pub rows: Vec<RowLayout>,
    /// Full size of the rendered tree, for scroll bounds.
    pub content_width: f32,
    pub content_height: f32,
}

impl ContainerLayout {
    pub fn new(instance: InstanceId, viewport: Rect) -> Self {
        Self {
            instance,
            viewport,
            rows: Vec::new(),
            content_width: viewport.width,
            content_height: 0.0,
        }
    }

    pub fn with_row(mut self, node: impl Into<NodeId>, rect: Rect) -> Self {
        self.content_height = self.content_height.max(rect.bottom() - self.viewport.top());
        self.rows.push(RowLayout {
            node: node.into(),
            rect,
        });
        self
    }

    pub fn with_content_size(mut self, width: f32, height: f32) -> Self {
        self.content_width = width;
        self.content_height = height;
        self
    }

    pub fn contains(&self, p: Point) -> bool {
        self.viewport.contains(p)
    }

    /// Row under `p`. Rows span the container width, so only `y` matters
    /// once `p` is inside the viewport.
    pub fn row_at(&self, p: Point) -> Option<&RowLayout> {
        if !self.contains(p) {
            return None;
        }
        self.rows.iter().find(|r| r.rect.contains_y(p.y))
    }

    pub fn row_of(&self, node: &NodeId) -> Option<&RowLayout> {
        self.rows.iter().find(|r| &r.node == node)
    }

    pub fn overflows_x(&self) -> bool {
        self.content_width > self.viewport.width
    }

    /// Largest scroll offsets for this content.
    pub fn scroll_bounds(&self) -> (f32, f32) {
        (
            (self.content_width - self.viewport.width).max(0.0),
            (self.content_height - self.viewport.height).max(0.0),
        )
    }
}

/// Top third → `Before`, bottom third → `After`, middle → `Inside`.
pub fn drop_position(rect: &Rect, y: f32) -> DropPosition {
    let third = rect.height / 3.0;
    if y < rect.top() + third {
        DropPosition::Before
    } else if y >= rect.bottom() - third {
        DropPosition::After
    } else {
        DropPosition::Inside
    }
}

/// Y of the drop marker: the boundary the node would land on.
pub fn marker_y(rect: &Rect, position: DropPosition) -> f32 {
    match position {
        DropPosition::Before => rect.top(),
        DropPosition::After => rect.bottom(),
        DropPosition::Inside => rect.center().y,
    }
}

//! Tree panel widget
//!
//! Draws one instance's visible rows inside a bordered panel and computes
//! the matching [`ContainerLayout`] so pointer events hit the rows that are
//! actually on screen. Rows are one cell high.


use grove_app::instance::TreeInstance;
use grove_app::ContainerLayout;
use grove_core::{NodeState, Rect as HostRect, RenderedRow};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::Span,
    widgets::{Block, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::theme::{palette, styles};

/// Width of the marker gutter left of every row.
const GUTTER: u16 = 1;

/// One tree instance drawn as an indented outline
pub struct TreeView<'a> {
    instance: &'a TreeInstance,
    focused: bool,
    /// Drop marker `y` in screen cells, when the drag cue points here
    marker: Option<f32>,
}

impl<'a> TreeView<'a> {
    pub fn new(instance: &'a TreeInstance) -> Self {
        Self {
            instance,
            focused: false,
            marker: None,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn marker(mut self, y: Option<f32>) -> Self {
        self.marker = y;
        self
    }

    fn block(&self) -> Block<'static> {
        let mut title = vec![Span::styled(
            format!(" Tree {} ", self.instance.id()),
            if self.focused {
                styles::border_active()
            } else {
                Style::default().fg(palette::ACCENT_DIM)
            },
        )];
        if self.instance.is_locked() {
            title.push(Span::styled(
                "[locked] ",
                Style::default().fg(palette::LOCKED),
            ));
        }
        styles::tree_block(self.focused).title(title)
    }

    /// Text of one row: indent, expander and title (or the rename buffer).
    fn row_text(&self, row: &RenderedRow) -> String {
        let indent = "  ".repeat(row.depth);
        if row.is_placeholder() {
            return format!("{indent}  {}", row.title);
        }
        let expander = match row.state {
            NodeState::Open => "▾ ",
            NodeState::Closed => "▸ ",
            NodeState::Leaf => "  ",
        };
        let renaming = self
            .instance
            .rename_session()
            .filter(|r| Some(&r.node) == row.node_id());
        match renaming {
            Some(session) => format!("{indent}{expander}{}▏", session.buffer),
            None => format!("{indent}{expander}{}", row.title),
        }
    }

    fn row_style(&self, row: &RenderedRow) -> Style {
        if row.is_placeholder() {
            return styles::row_loading();
        }
        let renaming = self
            .instance
            .rename_session()
            .is_some_and(|r| Some(&r.node) == row.node_id());
        if renaming {
            styles::rename_input()
        } else if row.selected {
            styles::row_selected()
        } else if row.hovered && self.focused {
            styles::row_hovered().fg(palette::TEXT_PRIMARY)
        } else {
            styles::text_secondary()
        }
    }

    fn render_marker(&self, inner: Rect, visible_rows: u16, buf: &mut Buffer) {
        let Some(y) = self.marker else {
            return;
        };
        let cell = y.floor();
        if cell < inner.y as f32 {
            return;
        }
        let row = (cell - inner.y as f32) as u16;
        if y - cell > 0.25 {
            // Inside: point at the row
            if row < inner.height {
                buf.set_string(inner.x, inner.y + row, "▶", styles::drop_marker());
            }
            return;
        }
        // Boundary above `row`: underline the row before it
        if row > 0 && row - 1 < visible_rows.min(inner.height) {
            let line_y = inner.y + row - 1;
            for x in inner.x..inner.right() {
                if let Some(c) = buf.cell_mut((x, line_y)) {
                    c.set_style(styles::drop_line());
                }
            }
        } else if row == 0 {
            buf.set_string(inner.x, inner.y, "▔", styles::drop_marker());
        }
    }
}

impl Widget for TreeView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = self.block();
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width <= GUTTER || inner.height == 0 {
            return;
        }

        let rows = self.instance.rows();
        let viewport = self.instance.viewport();
        let skip_rows = viewport.offset_y.max(0.0) as usize;
        let skip_cols = viewport.offset_x.max(0.0) as usize;
        let text_x = inner.x + GUTTER;
        let text_width = (inner.width - GUTTER) as usize;

        if rows.is_empty() {
            buf.set_string(text_x, inner.y, "(empty)", styles::text_muted());
        }

        let mut drawn = 0u16;
        for (offset, row) in rows.iter().skip(skip_rows).enumerate() {
            if offset as u16 >= inner.height {
                break;
            }
            let y = inner.y + offset as u16;
            let style = self.row_style(row);
            if row.selected || row.hovered {
                for x in text_x..inner.right() {
                    if let Some(c) = buf.cell_mut((x, y)) {
                        c.set_style(style);
                    }
                }
            }
            let text = self.row_text(row);
            buf.set_string(text_x, y, fit(&text, skip_cols, text_width), style);
            drawn += 1;
        }

        self.render_marker(inner, drawn, buf);
    }
}

/// Cut `text` to `width` columns after skipping `skip` columns.
pub fn fit(text: &str, skip: usize, width: usize) -> String {
    let mut out = String::new();
    let mut col = 0;
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if col < skip {
            col += w;
            continue;
        }
        if used + w > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out
}

/// Geometry of `instance` drawn in `area`, for hit-testing.
///
/// Only rows on screen are reported; their rects are already scrolled.
pub fn container_layout(instance: &TreeInstance, area: Rect) -> ContainerLayout {
    let inner = Block::bordered().inner(area);
    let viewport = HostRect::new(
        inner.x as f32,
        inner.y as f32,
        inner.width as f32,
        inner.height as f32,
    );

    let rows = instance.rows();
    let content_width = rows
        .iter()
        .map(|r| (GUTTER as usize + r.depth * 2 + 2 + r.title.width()) as f32)
        .fold(viewport.width, f32::max);
    let mut layout = ContainerLayout::new(instance.id(), viewport);

    let skip = instance.viewport().offset_y.max(0.0) as usize;
    for (offset, row) in rows.iter().skip(skip).enumerate() {
        if offset as u16 >= inner.height {
            break;
        }
        if let Some(node) = row.node_id() {
            let rect = HostRect::new(viewport.x, viewport.y + offset as f32, viewport.width, 1.0);
            layout = layout.with_row(node.clone(), rect);
        }
    }
    layout.with_content_size(content_width, rows.len() as f32)
}

/// Scroll `instance` so a row it asked to reveal is on screen.
pub fn reveal_requested(instance: &mut TreeInstance, area: Rect) {
    let Some(target) = instance.take_scroll_request() else {
        return;
    };
    let height = Block::bordered().inner(area).height as f32;
    let Some(index) = instance
        .rows()
        .iter()
        .position(|r| r.node_id() == Some(&target))
    else {
        return;
    };
    let index = index as f32;
    let offset = instance.viewport().offset_y;
    let dy = if index < offset {
        index - offset
    } else if index >= offset + height {
        index - (offset + height) + 1.0
    } else {
        0.0
    };
    if dy != 0.0 {
        let max_y = (instance.rows().len() as f32 - height).max(0.0);
        let viewport = instance.viewport_mut();
        viewport.max_y = viewport.max_y.max(max_y);
        viewport.scroll_by(0.0, dy);
    }
}

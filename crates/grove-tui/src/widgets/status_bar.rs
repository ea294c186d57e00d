//! Status bar widget
//!
//! Shows the last status message on the left and the keys that apply to
//! the current mode on the right.

use grove_app::state::AppState;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::theme::styles;

const HINTS_NORMAL: &[(&str, &str)] = &[
    ("Space", "select"),
    ("Enter", "toggle"),
    ("F2", "rename"),
    ("n", "new"),
    ("Del", "remove"),
    ("Tab", "focus"),
    ("q", "quit"),
];

const HINTS_RENAME: &[(&str, &str)] = &[("Enter", "commit"), ("Esc", "cancel")];

const HINTS_DRAG: &[(&str, &str)] = &[
    ("Ctrl", "copy"),
    ("Shift", "before"),
    ("Alt", "after"),
    ("Esc", "cancel"),
];

/// Status bar widget showing the last message and key hints
pub struct StatusBar<'a> {
    state: &'a AppState,
}

impl<'a> StatusBar<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        if self.state.drag.is_dragging() {
            HINTS_DRAG
        } else if self.state.is_renaming() {
            HINTS_RENAME
        } else {
            HINTS_NORMAL
        }
    }

    /// Error codes are upper case (`MOVE: RULE DENIED`, `LOCKED`).
    fn message(&self) -> Option<Span<'static>> {
        let status = self.state.status.as_deref()?;
        let is_code = !status.chars().any(char::is_lowercase);
        let style = if is_code {
            styles::status_error()
        } else {
            styles::status_info()
        };
        Some(Span::styled(format!(" {status} "), style))
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans: Vec<Span> = Vec::new();
        if let Some(message) = self.message() {
            spans.push(message);
            spans.push(Span::styled("│ ", styles::text_muted()));
        }
        for (key, action) in self.hints() {
            spans.push(Span::styled(*key, styles::keybinding()));
            spans.push(Span::styled(format!(" {action}  "), styles::text_primary()));
        }
        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(buf: &Buffer) -> String {
        (buf.area.x..buf.area.right())
            .map(|x| buf[(x, buf.area.y)].symbol().to_string())
            .collect()
    }

    fn draw(state: &AppState) -> Buffer {
        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);
        StatusBar::new(state).render(area, &mut buf);
        buf
    }

    #[test]
    fn test_normal_hints_without_message() {
        let state = AppState::new();
        let line = text(&draw(&state));
        assert!(line.starts_with("Space select"));
        assert!(line.contains("q quit"));
    }

    #[test]
    fn test_error_code_is_highlighted() {
        let mut state = AppState::new();
        state.set_status("MOVE: RULE DENIED");
        let buf = draw(&state);
        assert!(text(&buf).starts_with(" MOVE: RULE DENIED "));
        assert_eq!(buf[(1, 0)].fg, crate::theme::palette::STATUS_ERROR);
    }

    #[test]
    fn test_info_message_uses_info_style() {
        let mut state = AppState::new();
        state.set_status("Moved 1 node(s)");
        let buf = draw(&state);
        assert_eq!(buf[(1, 0)].fg, crate::theme::palette::STATUS_INFO);
    }
}

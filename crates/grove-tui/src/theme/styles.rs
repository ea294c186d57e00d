//! Semantic style builders.

use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, BorderType, Borders};

use super::palette;

// --- Text styles ---
pub fn text_primary() -> Style {
    Style::default().fg(palette::TEXT_PRIMARY)
}

pub fn text_secondary() -> Style {
    Style::default().fg(palette::TEXT_SECONDARY)
}

pub fn text_muted() -> Style {
    Style::default().fg(palette::TEXT_MUTED)
}

// --- Border styles ---
pub fn border_inactive() -> Style {
    Style::default().fg(palette::BORDER_DIM)
}

pub fn border_active() -> Style {
    Style::default().fg(palette::BORDER_ACTIVE)
}

// --- Rows ---
pub fn row_selected() -> Style {
    Style::default()
        .bg(palette::SELECTED_ROW_BG)
        .fg(palette::TEXT_PRIMARY)
        .add_modifier(Modifier::BOLD)
}

pub fn row_hovered() -> Style {
    Style::default().bg(palette::HOVERED_ROW_BG)
}

pub fn row_loading() -> Style {
    text_muted().add_modifier(Modifier::ITALIC)
}

pub fn rename_input() -> Style {
    Style::default()
        .bg(palette::RENAME_BG)
        .fg(palette::TEXT_PRIMARY)
}

// --- Drag feedback ---
pub fn drop_marker() -> Style {
    Style::default()
        .fg(palette::DROP_OK)
        .add_modifier(Modifier::BOLD)
}

pub fn drop_line() -> Style {
    Style::default()
        .fg(palette::DROP_OK)
        .add_modifier(Modifier::UNDERLINED)
}

/// Drag proxy label; red while the drop would be refused.
pub fn drag_proxy(allowed: bool) -> Style {
    let color = if allowed {
        palette::DROP_OK
    } else {
        palette::DROP_DENIED
    };
    Style::default()
        .fg(color)
        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
}

// --- Status ---
pub fn status_error() -> Style {
    Style::default().fg(palette::STATUS_ERROR)
}

pub fn status_info() -> Style {
    Style::default().fg(palette::STATUS_INFO)
}

pub fn keybinding() -> Style {
    Style::default().fg(palette::ACCENT)
}

// --- Block builders ---

/// Rounded panel around one tree.
pub fn tree_block(focused: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if focused {
            border_active()
        } else {
            border_inactive()
        })
}

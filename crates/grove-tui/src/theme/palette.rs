//! Color palette.

use ratatui::style::Color;

// --- Borders ---
pub const BORDER_DIM: Color = Color::DarkGray; // Unfocused panels
pub const BORDER_ACTIVE: Color = Color::Cyan; // Focused panel

// --- Accent ---
pub const ACCENT: Color = Color::Cyan;
pub const ACCENT_DIM: Color = Color::DarkGray;

// --- Text ---
pub const TEXT_PRIMARY: Color = Color::White;
pub const TEXT_SECONDARY: Color = Color::Gray;
pub const TEXT_MUTED: Color = Color::DarkGray;

// --- Rows ---
pub const SELECTED_ROW_BG: Color = Color::Rgb(30, 50, 80);
pub const HOVERED_ROW_BG: Color = Color::Rgb(35, 35, 35);
pub const RENAME_BG: Color = Color::Rgb(60, 60, 20);

// --- Drag feedback ---
pub const DROP_OK: Color = Color::Green;
pub const DROP_DENIED: Color = Color::Red;

// --- Status ---
pub const STATUS_ERROR: Color = Color::Red;
pub const STATUS_INFO: Color = Color::Gray;
pub const LOCKED: Color = Color::Yellow;

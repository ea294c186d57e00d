//! grove-tui - Terminal UI for Grove
//!
//! This crate provides the ratatui-based terminal interface. It drives an
//! Engine from grove-app, draws every tree side by side, reports row
//! geometry back for hit-testing, and turns mouse input into drag gestures.

pub mod event;
pub mod layout;
pub mod render;
pub mod runner;
pub mod terminal;
pub mod theme;
pub mod widgets;

// Re-export main entry point
pub use runner::run;

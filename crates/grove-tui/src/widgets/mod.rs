//! Custom widget components

mod status_bar;
pub mod tree_view;

pub use status_bar::StatusBar;
pub use tree_view::TreeView;

//! Configuration for tree instances
//!
//! Supports:
//! - `grove.toml` - Options for a tree instance (data source, rules, drag tuning)

pub mod settings;
pub mod types;

pub use settings::{load_options, save_options, OPTIONS_FILENAME};
pub use types::*;

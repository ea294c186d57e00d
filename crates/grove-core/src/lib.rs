//! # grove-core - Core Domain Types
//!
//! Foundation crate for Grove. Provides the node arena, the JSON data
//! contract, the rule engine, the render projection and error handling.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, serde_json, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Node Model (`node`, `tree`)
//! - [`Node`], [`NodeId`], [`NodeState`] - One arena record and its identity/state
//! - [`Tree`] - Arena plus root list; every mutation repairs `last` markers and leaf state
//! - [`DropPosition`] - `before` / `after` / `inside`
//!
//! ### Data Contract (`data`)
//! - [`NodeData`] - Serde shape of a source node (`attributes`, `data`, `children`, ...)
//! - [`Payload`] - A source response: one node or a list
//! - [`DataKind`] - JSON, nested-list markup or XML; parsed via `markup`
//!
//! ### Rule Engine (`rules`)
//! - [`RuleSet`] - Per-instance rules (simple rules, drag patterns, metadata switches)
//! - [`check()`], [`check_move()`], [`check_create()`] - Pure validation
//!
//! ### Rendering (`render`)
//! - [`render()`] - Nested projection with class names
//! - [`visible_rows()`] - Flat list of displayed rows
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Error enum; [`Error::code`] gives the callback code
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use grove_core::prelude::*;
//! ```

pub mod data;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod markup;
pub mod node;
pub mod render;
pub mod rules;
pub mod tree;

/// Prelude for common imports used throughout all Grove crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use data::{DataKind, DeclaredState, NodeData, NodeLabelData, Payload};
pub use error::{Error, Result, ResultExt};
pub use geometry::{Point, Rect};
pub use node::{DropPosition, Label, Labels, Node, NodeId, NodeMetadata, NodeState};
pub use render::{render, render_text, visible_rows, RenderContext, RenderedNode, RenderedRow, RowKind};
pub use rules::{
    check, check_create, check_move, CreateAt, DragCopy, DragRule, DragRules, MoveOrigin,
    MoveSubject, MultipleMode, RuleScope, RuleSet, SimpleRule, ROOT_TYPE,
};
pub use tree::{InsertAt, Tree};

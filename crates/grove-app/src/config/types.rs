//! Configuration types for tree instances
//!
//! Defines:
//! - `TreeOptions` - Everything one tree instance is constructed from
//! - `DataSettings`, `LangSettings`, `PersistenceSettings`, `DragSettings` - Its sections
//!
//! Rules live in [`grove_core::RuleSet`] and are embedded as `[rules]`.

use grove_core::{NodeData, NodeId, RuleSet};
use serde::{Deserialize, Serialize};

pub use grove_core::DataKind;

/// Options for one tree instance (`grove.toml`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TreeOptions {
    /// Nodes selected on first load when nothing is persisted
    #[serde(default)]
    pub selected: Vec<NodeId>,

    /// Nodes opened on first load when nothing is persisted
    #[serde(default)]
    pub opened: Vec<NodeId>,

    /// Declared label languages; empty means single-language
    #[serde(default)]
    pub languages: Vec<String>,

    #[serde(default)]
    pub data: DataSettings,

    #[serde(default)]
    pub rules: RuleSet,

    #[serde(default)]
    pub lang: LangSettings,

    #[serde(default)]
    pub persistence: PersistenceSettings,

    #[serde(default)]
    pub drag: DragSettings,
}

impl TreeOptions {
    /// Options for an in-memory tree.
    pub fn with_nodes(nodes: Vec<NodeData>) -> Self {
        Self {
            data: DataSettings {
                nodes,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Language used for titles: the first declared one, if any.
    pub fn current_language(&self) -> Option<&str> {
        self.languages.first().map(String::as_str)
    }
}

/// Where the tree's nodes come from (`[data]`)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DataSettings {
    #[serde(default)]
    pub kind: DataKind,

    /// Location of the data. `file://` URLs and plain paths name a directory
    /// of `<id>.<ext>` files, the extension following `kind`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Request method recorded for hosts that proxy fetches
    #[serde(default = "default_method")]
    pub method: String,

    /// Fetch children per node on first open instead of all at once
    #[serde(default)]
    pub async_load: bool,

    /// Inline JSON payload (array or single object)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<String>,

    /// Inline nested-list markup, or XML when `kind` is `xml`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,

    /// Pre-parsed nodes (programmatic construction)
    #[serde(skip)]
    pub nodes: Vec<NodeData>,

    /// Upper bound for a single fetch
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            kind: DataKind::default(),
            url: None,
            method: default_method(),
            async_load: false,
            json: None,
            markup: None,
            nodes: Vec::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

/// Strings the tree itself displays (`[lang]`)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LangSettings {
    #[serde(default = "default_new_node")]
    pub new_node: String,

    #[serde(default = "default_loading")]
    pub loading: String,

    #[serde(default = "default_multiple_selection")]
    pub multiple_selection: String,
}

impl Default for LangSettings {
    fn default() -> Self {
        Self {
            new_node: default_new_node(),
            loading: default_loading(),
            multiple_selection: default_multiple_selection(),
        }
    }
}

fn default_new_node() -> String {
    "New folder".to_string()
}

fn default_loading() -> String {
    "Loading ...".to_string()
}

fn default_multiple_selection() -> String {
    "Multiple selection".to_string()
}

/// Persisted UI state (`[persistence]`)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PersistenceSettings {
    /// Namespace for this instance's keys; `<prefix>open`, `<prefix>selected`
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Also persist the selection
    #[serde(default = "default_true")]
    pub persist_selected: bool,
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            persist_selected: true,
        }
    }
}

fn default_prefix() -> String {
    "grove_".to_string()
}

fn default_true() -> bool {
    true
}

/// Drag gesture tuning (`[drag]`), in host units
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DragSettings {
    /// Pointer travel before a press becomes a drag
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Auto-scroll band at the top and bottom edges
    #[serde(default = "default_scroll_margin_y")]
    pub scroll_margin_y: f32,

    /// Auto-scroll band at the left and right edges
    #[serde(default = "default_scroll_margin_x")]
    pub scroll_margin_x: f32,

    /// Distance scrolled per tick
    #[serde(default = "default_scroll_step")]
    pub scroll_step: f32,

    /// Hover time before a closed target opens
    #[serde(default = "default_open_ahead_ms")]
    pub open_ahead_ms: u64,

    /// Proxy offset from the pointer
    #[serde(default = "default_proxy_offset")]
    pub proxy_offset: (f32, f32),
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            scroll_margin_y: default_scroll_margin_y(),
            scroll_margin_x: default_scroll_margin_x(),
            scroll_step: default_scroll_step(),
            open_ahead_ms: default_open_ahead_ms(),
            proxy_offset: default_proxy_offset(),
        }
    }
}

fn default_threshold() -> f32 {
    5.0
}

fn default_scroll_margin_y() -> f32 {
    20.0
}

fn default_scroll_margin_x() -> f32 {
    40.0
}

fn default_scroll_step() -> f32 {
    10.0
}

fn default_open_ahead_ms() -> u64 {
    500
}

fn default_proxy_offset() -> (f32, f32) {
    (15.0, 5.0)
}

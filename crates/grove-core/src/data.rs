//! # Data Contract
//!
//! Serde types for the JSON shape tree sources deliver:
//!
//! ```json
//! [{ "attributes": {"id": "n1", "rel": "folder", "class": "draft"},
//!    "data": "Home" | {"title": "Home", "icon": "home.png"} | {"en": "Home", "fr": "Accueil"},
//!    "state": "closed",
//!    "metadata": {"max_children": 3},
//!    "children": [ ... ] }]
//! ```
//!
//! A response may be a single object or an array. Attribute values may be
//! strings or numbers; they are normalized to strings on load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::node::{Label, Labels, NodeMetadata};

/// Declared expansion state of a source node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclaredState {
    Open,
    Closed,
}

/// A title with optional icon and link attributes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RichLabel {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

/// One language variant of a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LanguageLabel {
    Title(String),
    Rich(RichLabel),
}

/// The `data` field of a source node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeLabelData {
    Title(String),
    Rich(RichLabel),
    Languages(BTreeMap<String, LanguageLabel>),
}

impl Default for NodeLabelData {
    fn default() -> Self {
        Self::Title(String::new())
    }
}

impl NodeLabelData {
    pub fn to_labels(&self) -> Labels {
        match self {
            NodeLabelData::Title(title) => Labels::single(title.clone()),
            NodeLabelData::Rich(rich) => {
                let mut labels = Labels::default();
                labels.insert(Labels::DEFAULT_LANG, rich_to_label(rich));
                labels
            }
            NodeLabelData::Languages(map) => {
                let mut labels = Labels::default();
                for (lang, label) in map {
                    let label = match label {
                        LanguageLabel::Title(t) => Label::new(t.clone()),
                        LanguageLabel::Rich(rich) => rich_to_label(rich),
                    };
                    labels.insert(lang.clone(), label);
                }
                labels
            }
        }
    }

    pub fn from_labels(labels: &Labels) -> Self {
        let single = labels.len() == 1 && labels.languages().all(|l| l == Labels::DEFAULT_LANG);
        if single {
            let label = labels.get(None).cloned().unwrap_or_default();
            return match label.icon {
                None => NodeLabelData::Title(label.title),
                Some(icon) => NodeLabelData::Rich(RichLabel {
                    title: label.title,
                    icon: Some(icon),
                    attributes: BTreeMap::new(),
                }),
            };
        }
        let map = labels
            .iter()
            .map(|(lang, label)| {
                let value = match &label.icon {
                    None => LanguageLabel::Title(label.title.clone()),
                    Some(icon) => LanguageLabel::Rich(RichLabel {
                        title: label.title.clone(),
                        icon: Some(icon.clone()),
                        attributes: BTreeMap::new(),
                    }),
                };
                (lang.to_string(), value)
            })
            .collect();
        NodeLabelData::Languages(map)
    }
}

fn rich_to_label(rich: &RichLabel) -> Label {
    Label {
        title: rich.title.clone(),
        icon: rich.icon.clone(),
    }
}

/// A node as delivered by (or exported to) a data source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,

    #[serde(default)]
    pub data: NodeLabelData,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<DeclaredState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<NodeMetadata>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeData>,
}

impl NodeData {
    /// A titled node with an `id` attribute.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert("id".to_string(), Value::String(id.into()));
        Self {
            attributes,
            data: NodeLabelData::Title(title.into()),
            ..Default::default()
        }
    }

    /// Set a string attribute (e.g. the type attribute `rel`).
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .insert(key.into(), Value::String(value.into()));
        self
    }

    pub fn with_children(mut self, children: Vec<NodeData>) -> Self {
        self.children = children;
        self
    }

    pub fn with_state(mut self, state: DeclaredState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_metadata(mut self, metadata: NodeMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Attribute value normalized to a string. Numbers and booleans are
    /// formatted, `null` and compound values are ignored.
    pub fn attr(&self, key: &str) -> Option<String> {
        match self.attributes.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<String> {
        self.attr("id").filter(|id| !id.is_empty())
    }
}

/// Format of a source body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    #[default]
    Json,
    /// Pre-rendered nested `<ul><li>` lists
    Markup,
    /// Nested `<root><item>` documents
    Xml,
}

impl DataKind {
    /// File extension used for per-node source files.
    pub fn extension(self) -> &'static str {
        match self {
            DataKind::Json => "json",
            DataKind::Markup => "html",
            DataKind::Xml => "xml",
        }
    }

    /// Guess the kind from a file name; unknown extensions read as JSON.
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xml") => DataKind::Xml,
            Some(ext) if ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm") => {
                DataKind::Markup
            }
            _ => DataKind::Json,
        }
    }

    /// Parse a response body of this kind into a node list.
    pub fn parse(self, body: &str) -> Result<Vec<NodeData>> {
        match self {
            DataKind::Json => Payload::parse(body),
            DataKind::Markup => crate::markup::parse_markup(body),
            DataKind::Xml => crate::markup::parse_xml(body),
        }
    }
}

/// A source response: one node or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Many(Vec<NodeData>),
    One(Box<NodeData>),
}

impl Payload {
    pub fn into_nodes(self) -> Vec<NodeData> {
        match self {
            Payload::Many(nodes) => nodes,
            Payload::One(node) => vec![*node],
        }
    }

    /// Parse a JSON response body into a node list.
    pub fn parse(body: &str) -> Result<Vec<NodeData>> {
        let payload: Payload = serde_json::from_str(body)?;
        Ok(payload.into_nodes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_array_of_nodes() {
        let json = r#"[
            {"attributes": {"id": "1", "rel": "folder"}, "data": "Home",
             "children": [{"attributes": {"id": 2}, "data": "Child"}]},
            {"attributes": {"id": "3"}, "data": "Other", "state": "closed"}
        ]"#;
        let nodes = Payload::parse(json).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].attr("rel").as_deref(), Some("folder"));
        assert_eq!(nodes[0].children[0].id().as_deref(), Some("2"));
        assert_eq!(nodes[1].state, Some(DeclaredState::Closed));
    }

    #[test]
    fn test_parse_single_object() {
        let json = r#"{"attributes": {"id": "solo"}, "data": {"title": "Solo", "icon": "s.png"}}"#;
        let nodes = Payload::parse(json).unwrap();
        assert_eq!(nodes.len(), 1);
        let labels = nodes[0].data.to_labels();
        let label = labels.get(None).unwrap();
        assert_eq!(label.title, "Solo");
        assert_eq!(label.icon.as_deref(), Some("s.png"));
    }

    #[test]
    fn test_parse_language_map() {
        let json = r#"{"attributes": {"id": "x"},
                       "data": {"en": "Home", "fr": {"title": "Accueil", "icon": "a.png"}}}"#;
        let nodes = Payload::parse(json).unwrap();
        let labels = nodes[0].data.to_labels();
        assert_eq!(labels.title(Some("en")), "Home");
        assert_eq!(labels.title(Some("fr")), "Accueil");
    }

    #[test]
    fn test_kind_from_path() {
        use std::path::Path;
        assert_eq!(DataKind::from_path(Path::new("tree.xml")), DataKind::Xml);
        assert_eq!(DataKind::from_path(Path::new("tree.HTM")), DataKind::Markup);
        assert_eq!(DataKind::from_path(Path::new("tree.json")), DataKind::Json);
        assert_eq!(DataKind::from_path(Path::new("tree")), DataKind::Json);
    }

    #[test]
    fn test_kind_parse_dispatches_by_format() {
        let json = DataKind::Json.parse(r#"{"attributes": {"id": "a"}, "data": "A"}"#).unwrap();
        let xml = DataKind::Xml
            .parse(r#"<root><item id="a"><content><name>A</name></content></item></root>"#)
            .unwrap();
        let markup = DataKind::Markup.parse(r#"<ul><li id="a"><a>A</a></li></ul>"#).unwrap();
        assert_eq!(json, xml);
        assert_eq!(json, markup);
        assert_eq!(DataKind::Json.parse("<ul/>").unwrap_err().code(), "PARSE: INVALID JSON");
    }

    #[test]
    fn test_empty_array_is_no_nodes() {
        assert!(Payload::parse("[]").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(Payload::parse("{not json").is_err());
    }

    #[test]
    fn test_label_data_export_keeps_single_language_compact() {
        let labels = Labels::single("Home");
        assert_eq!(
            NodeLabelData::from_labels(&labels),
            NodeLabelData::Title("Home".to_string())
        );
    }

    #[test]
    fn test_metadata_parses() {
        let json = r#"{"attributes": {"id": "m"}, "data": "M",
                       "metadata": {"max_children": 2, "valid_children": ["file"]}}"#;
        let nodes = Payload::parse(json).unwrap();
        let meta = nodes[0].metadata.as_ref().unwrap();
        assert_eq!(meta.max_children, Some(2));
        assert_eq!(meta.valid_children, Some(vec!["file".to_string()]));
    }
}

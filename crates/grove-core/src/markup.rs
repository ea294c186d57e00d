//! # Markup Sources
//!
//! Two tag-based source formats, both read into the same [`NodeData`] the
//! JSON contract produces.
//!
//! Pre-rendered nested lists (`markup`):
//!
//! ```html
//! <ul>
//!   <li id="home" rel="folder" class="open">
//!     <a href="#">Home</a>
//!     <ul><li id="a"><a href="#">A</a></li></ul>
//!   </li>
//!   <li id="lazy" class="closed"><a href="#" class="en">Lazy</a><a href="#" class="fr">Paresseux</a></li>
//! </ul>
//! ```
//!
//! Server XML (`xml`):
//!
//! ```xml
//! <root>
//!   <item id="home" rel="folder" state="open">
//!     <content><name icon="home.png">Home</name></content>
//!     <item id="a"><content><name lang="en">A</name><name lang="fr">Un</name></content></item>
//!   </item>
//! </root>
//! ```
//!
//! Markup must be well-formed (XHTML-style): every tag closed, attributes quoted.

use std::collections::BTreeMap;

use roxmltree::{Document, Node};
use serde_json::Value;

use crate::data::{DeclaredState, LanguageLabel, NodeData, NodeLabelData, RichLabel};
use crate::error::{Error, Result};

/// Class tokens that describe expansion state rather than the node.
const STATE_CLASSES: &[&str] = &["open", "closed", "leaf", "last"];

fn parse_document(body: &str) -> Result<Document<'_>> {
    Document::parse(body).map_err(|e| Error::markup(e.to_string()))
}

fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |c| c.is_element() && c.tag_name().name().eq_ignore_ascii_case(tag))
}

fn text_of(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

// ─────────────────────────────────────────────────────────────────────────
// Nested-list markup
// ─────────────────────────────────────────────────────────────────────────

/// Parse pre-rendered `<ul><li>` markup. The first list in the document is
/// the root level; an empty document or one without a list yields no nodes.
pub fn parse_markup(body: &str) -> Result<Vec<NodeData>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let doc = parse_document(body)?;
    let Some(list) = doc
        .root_element()
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name().eq_ignore_ascii_case("ul"))
    else {
        return Ok(Vec::new());
    };
    Ok(list_items(list))
}

fn list_items(list: Node<'_, '_>) -> Vec<NodeData> {
    element_children(list, "li").map(list_item).collect()
}

fn list_item(li: Node<'_, '_>) -> NodeData {
    let mut attributes = BTreeMap::new();
    let mut state = None;
    for attr in li.attributes() {
        if attr.name() != "class" {
            attributes.insert(attr.name().to_string(), Value::String(attr.value().to_string()));
            continue;
        }
        let mut kept = Vec::new();
        for token in attr.value().split_whitespace() {
            let bare = token.strip_prefix("jstree-").unwrap_or(token);
            match bare {
                "open" => state = Some(DeclaredState::Open),
                "closed" => state = Some(DeclaredState::Closed),
                _ if STATE_CLASSES.contains(&bare) => {}
                _ => kept.push(token),
            }
        }
        if !kept.is_empty() {
            attributes.insert("class".to_string(), Value::String(kept.join(" ")));
        }
    }

    let anchors: Vec<Node<'_, '_>> = element_children(li, "a").collect();
    let data = match anchors.as_slice() {
        [] => NodeLabelData::default(),
        [single] => anchor_label(*single),
        many => NodeLabelData::Languages(
            many.iter()
                .map(|a| {
                    let lang = a
                        .attribute("class")
                        .and_then(|c| c.split_whitespace().next())
                        .unwrap_or_default()
                        .to_string();
                    (lang, LanguageLabel::Title(text_of(*a)))
                })
                .collect(),
        ),
    };

    let children = element_children(li, "ul").flat_map(list_items).collect();
    NodeData {
        attributes,
        data,
        state,
        metadata: None,
        children,
    }
}

fn anchor_label(a: Node<'_, '_>) -> NodeLabelData {
    let title = text_of(a);
    match a.attribute("data-icon") {
        Some(icon) => NodeLabelData::Rich(RichLabel {
            title,
            icon: Some(icon.to_string()),
            attributes: BTreeMap::new(),
        }),
        None => NodeLabelData::Title(title),
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Server XML
// ─────────────────────────────────────────────────────────────────────────

/// Parse a nested `<root><item>` XML response.
pub fn parse_xml(body: &str) -> Result<Vec<NodeData>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let doc = parse_document(body)?;
    let root = doc.root_element();
    if root.tag_name().name() == "item" {
        return Ok(vec![xml_item(root)]);
    }
    Ok(element_children(root, "item").map(xml_item).collect())
}

fn xml_item(item: Node<'_, '_>) -> NodeData {
    let mut attributes = BTreeMap::new();
    let mut state = None;
    for attr in item.attributes() {
        match (attr.name(), attr.value()) {
            ("state", "open") => state = Some(DeclaredState::Open),
            ("state", "closed") => state = Some(DeclaredState::Closed),
            ("state", _) => {}
            (name, value) => {
                attributes.insert(name.to_string(), Value::String(value.to_string()));
            }
        }
    }

    let names: Vec<Node<'_, '_>> = element_children(item, "content")
        .flat_map(|c| element_children(c, "name"))
        .collect();
    let data = match names.as_slice() {
        [] => NodeLabelData::default(),
        [single] if single.attribute("lang").is_none() => {
            match name_label(*single) {
                LanguageLabel::Title(title) => NodeLabelData::Title(title),
                LanguageLabel::Rich(rich) => NodeLabelData::Rich(rich),
            }
        }
        many => NodeLabelData::Languages(
            many.iter()
                .map(|n| (n.attribute("lang").unwrap_or_default().to_string(), name_label(*n)))
                .collect(),
        ),
    };

    let children = element_children(item, "item").map(xml_item).collect();
    NodeData {
        attributes,
        data,
        state,
        metadata: None,
        children,
    }
}

fn name_label(name: Node<'_, '_>) -> LanguageLabel {
    let title = text_of(name);
    match name.attribute("icon") {
        Some(icon) => LanguageLabel::Rich(RichLabel {
            title,
            icon: Some(icon.to_string()),
            attributes: BTreeMap::new(),
        }),
        None => LanguageLabel::Title(title),
    }
}

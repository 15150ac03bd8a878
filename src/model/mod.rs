//! # Document Model
//!
//! The in-memory form of a report template: a tree of tagged nodes, each with
//! string attributes, inner text and owned children. Templates are authored
//! as XML, and the tree keeps the XML's shape exactly, so sibling order is
//! the drawing order.
//!
//! The tree is rewritten in place by the transform pass and then borrowed by
//! the print pass. Every node is owned by exactly one parent; cloning a
//! subtree yields an independent copy.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{ReportError, Result};

/// The kind of a template node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Tag {
    /// The document element, whatever its XML name.
    Root,
    Move,
    Text,
    Line,
    Rectangle,
    Circle,
    Font,
    Color,
    Table,
    Columns,
    Column,
    Data,
    Tr,
    Td,
    NewPage,
    PageTexts,
    /// Any element the engine does not interpret. Kept, never drawn.
    Other(String),
}

impl Tag {
    /// Map an XML element name to a tag. Names are case-sensitive.
    pub fn from_name(name: &str) -> Tag {
        match name {
            "root" => Tag::Root,
            "move" => Tag::Move,
            "text" => Tag::Text,
            "line" => Tag::Line,
            "rectangle" => Tag::Rectangle,
            "circle" => Tag::Circle,
            "font" => Tag::Font,
            "color" => Tag::Color,
            "table" => Tag::Table,
            "columns" => Tag::Columns,
            "column" => Tag::Column,
            "data" => Tag::Data,
            "tr" => Tag::Tr,
            "td" => Tag::Td,
            "newpage" => Tag::NewPage,
            "pageTexts" => Tag::PageTexts,
            other => Tag::Other(other.to_string()),
        }
    }

    /// The XML element name for this tag.
    pub fn name(&self) -> &str {
        match self {
            Tag::Root => "root",
            Tag::Move => "move",
            Tag::Text => "text",
            Tag::Line => "line",
            Tag::Rectangle => "rectangle",
            Tag::Circle => "circle",
            Tag::Font => "font",
            Tag::Color => "color",
            Tag::Table => "table",
            Tag::Columns => "columns",
            Tag::Column => "column",
            Tag::Data => "data",
            Tag::Tr => "tr",
            Tag::Td => "td",
            Tag::NewPage => "newpage",
            Tag::PageTexts => "pageTexts",
            Tag::Other(name) => name,
        }
    }
}

/// A node in the template tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentNode {
    pub tag: Tag,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub inner_text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentNode>,
}

/// A whole template. The root node's attributes carry the page configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentModel {
    /// The XML name of the document element (e.g. `report`).
    pub element_name: String,
    pub root: DocumentNode,
}

impl DocumentModel {
    pub fn new(element_name: &str, root: DocumentNode) -> Self {
        Self {
            element_name: element_name.to_string(),
            root,
        }
    }
}

impl DocumentNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: BTreeMap::new(),
            inner_text: String::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    /// Builder-style numeric attribute setter.
    pub fn with_number(self, name: &str, value: f64) -> Self {
        self.with_attr(name, format_number(value))
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.inner_text = text.into();
        self
    }

    pub fn with_children(mut self, children: Vec<DocumentNode>) -> Self {
        self.children = children;
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    /// Parse an optional numeric attribute.
    pub fn number(&self, name: &str) -> Result<Option<f64>> {
        match self.attr(name) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ReportError::Format {
                    tag: self.tag.name().to_string(),
                    attribute: name.to_string(),
                    value: raw.to_string(),
                }),
        }
    }

    pub fn number_or(&self, name: &str, default: f64) -> Result<f64> {
        Ok(self.number(name)?.unwrap_or(default))
    }

    /// Parse a numeric attribute that must be present.
    pub fn required_number(&self, name: &str) -> Result<f64> {
        self.number(name)?.ok_or_else(|| ReportError::MissingAttribute {
            tag: self.tag.name().to_string(),
            attribute: name.to_string(),
        })
    }

    /// Boolean flag: only the literal values `1` and `true` are true.
    pub fn flag(&self, name: &str) -> bool {
        is_true(self.attr(name))
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// First direct child with the given tag.
    pub fn child(&self, tag: &Tag) -> Option<&DocumentNode> {
        self.children.iter().find(|c| &c.tag == tag)
    }

    pub fn child_mut(&mut self, tag: &Tag) -> Option<&mut DocumentNode> {
        self.children.iter_mut().find(|c| &c.tag == tag)
    }

    /// Visit this node and every descendant in document order.
    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut DocumentNode)) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }

    /// Count nodes with the given tag in this subtree, including this node.
    pub fn count(&self, tag: &Tag) -> usize {
        let own = usize::from(&self.tag == tag);
        own + self.children.iter().map(|c| c.count(tag)).sum::<usize>()
    }
}

/// Boolean attribute semantics shared by every flag in the wire format.
pub fn is_true(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true"))
}

/// Render a number the way synthesized attributes store it.
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_names_round_trip() {
        for name in ["move", "text", "pageTexts", "newpage", "td"] {
            assert_eq!(Tag::from_name(name).name(), name);
        }
        assert_eq!(Tag::from_name("image"), Tag::Other("image".to_string()));
    }

    #[test]
    fn tag_names_are_case_sensitive() {
        assert_eq!(Tag::from_name("Move"), Tag::Other("Move".to_string()));
    }

    #[test]
    fn flags_accept_only_literal_true() {
        let node = DocumentNode::new(Tag::Column)
            .with_attr("leftLine", "1")
            .with_attr("rightLine", "true")
            .with_attr("topLine", "yes")
            .with_attr("bottomLine", "True");
        assert!(node.flag("leftLine"));
        assert!(node.flag("rightLine"));
        assert!(!node.flag("topLine"));
        assert!(!node.flag("bottomLine"));
        assert!(!node.flag("missing"));
    }

    #[test]
    fn number_parse_failure_is_format_error() {
        let node = DocumentNode::new(Tag::Move).with_attr("relX", "ten");
        match node.number("relX") {
            Err(ReportError::Format { attribute, .. }) => assert_eq!(attribute, "relX"),
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn required_number_reports_missing_attribute() {
        let node = DocumentNode::new(Tag::Circle).with_attr("radX", "2");
        assert!(node.required_number("radX").is_ok());
        assert!(matches!(
            node.required_number("radY"),
            Err(ReportError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn format_number_drops_trailing_zero() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-3.0), "-3");
    }

    #[test]
    fn count_includes_nested_nodes() {
        let tree = DocumentNode::new(Tag::Root).with_children(vec![
            DocumentNode::new(Tag::Text),
            DocumentNode::new(Tag::Font).with_children(vec![DocumentNode::new(Tag::Text)]),
        ]);
        assert_eq!(tree.count(&Tag::Text), 2);
        assert_eq!(tree.count(&Tag::Root), 1);
    }
}

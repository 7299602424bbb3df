//! Node types - the building blocks of a document tree

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Style;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random NodeId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a NodeId from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse a NodeId from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in the document tree
///
/// Every node knows its parent, so structural queries can walk upward
/// without a rendering surface:
/// - A unique identifier
/// - An optional parent (detached nodes and the root have none)
/// - Either a text run or an element
/// - Ordered children (always empty for text runs)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node
    pub id: NodeId,

    /// Parent node ID (None for the root and detached nodes)
    pub parent_id: Option<NodeId>,

    /// What this node holds
    pub kind: NodeKind,

    /// Ordered list of child node IDs
    pub children: Vec<NodeId>,
}

impl Node {
    /// Create a new text run
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            parent_id: None,
            kind: NodeKind::Text(text.into()),
            children: Vec::new(),
        }
    }

    /// Create a new element with no attributes
    pub fn element(tag: impl Into<String>) -> Self {
        Self::from_element(Element::new(tag))
    }

    /// Create a node holding an existing element
    pub fn from_element(element: Element) -> Self {
        Self {
            id: NodeId::new(),
            parent_id: None,
            kind: NodeKind::Element(element),
            children: Vec::new(),
        }
    }

    /// Set the parent of this node
    pub fn with_parent(mut self, parent_id: NodeId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    /// Tag name, if this is an element
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(el) => Some(el.tag.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    /// Check whether this is an element with the given tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag().is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(text) => Some(text.as_str()),
            NodeKind::Element(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match &self.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match &mut self.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    /// Add a child node ID
    pub fn add_child(&mut self, child_id: NodeId) {
        if !self.children.contains(&child_id) {
            self.children.push(child_id);
        }
    }

    /// Remove a child node ID
    pub fn remove_child(&mut self, child_id: &NodeId) -> bool {
        if let Some(pos) = self.children.iter().position(|id| id == child_id) {
            self.children.remove(pos);
            true
        } else {
            false
        }
    }
}

/// Content of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum NodeKind {
    /// A run of text
    Text(String),

    /// A tagged element
    Element(Element),
}

/// Element payload: tag, attributes and inline style
///
/// `style` is kept apart from `attributes` so commands can edit single
/// properties; the markup writer emits it as the `style` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Lowercase tag name
    pub tag: String,

    /// Attributes other than `style`
    pub attributes: BTreeMap<String, String>,

    /// Inline style properties
    pub style: Style,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            style: Style::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.set(property, value);
        self
    }

    /// Set an attribute; `style` is routed into the style map
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_ascii_lowercase();
        let value = value.into();
        if name == "style" {
            self.style = Style::parse(&value);
        } else {
            self.attributes.insert(name, value);
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Well-known tags
pub mod tags {
    /// Sentinel root of every document, never serialized
    pub const ROOT: &str = "root";

    pub const P: &str = "p";
    pub const DIV: &str = "div";
    pub const BR: &str = "br";
    pub const SPAN: &str = "span";
    pub const A: &str = "a";
    pub const B: &str = "b";
    pub const STRONG: &str = "strong";
    pub const I: &str = "i";
    pub const EM: &str = "em";
    pub const U: &str = "u";
    pub const SUP: &str = "sup";
    pub const IMG: &str = "img";

    pub const TABLE: &str = "table";
    pub const THEAD: &str = "thead";
    pub const TBODY: &str = "tbody";
    pub const TFOOT: &str = "tfoot";
    pub const TR: &str = "tr";
    pub const TD: &str = "td";
    pub const TH: &str = "th";

    /// Elements that never have children or a closing tag
    pub fn is_void(tag: &str) -> bool {
        matches!(
            tag,
            "img" | "br" | "hr" | "input" | "meta" | "link" | "col" | "wbr" | "source"
        )
    }

    /// Elements that start on their own line when rendered
    pub fn is_block(tag: &str) -> bool {
        matches!(
            tag,
            "p" | "div"
                | "h1"
                | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
                | "ul"
                | "ol"
                | "li"
                | "blockquote"
                | "pre"
                | "hr"
                | "table"
                | "thead"
                | "tbody"
                | "tfoot"
                | "tr"
                | "section"
                | "article"
                | "header"
                | "footer"
        )
    }

    /// Table cells
    pub fn is_cell(tag: &str) -> bool {
        matches!(tag, "td" | "th")
    }

    /// Row groups that may sit between a table and its rows
    pub fn is_row_group(tag: &str) -> bool {
        matches!(tag, "thead" | "tbody" | "tfoot")
    }
}

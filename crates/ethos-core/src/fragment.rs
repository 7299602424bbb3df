//! Detached subtrees built outside a document

use serde::{Deserialize, Serialize};

use crate::{markup, Element, Result};

/// A node of a detached subtree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FragmentNode {
    Text {
        text: String,
    },
    Element {
        element: Element,
        children: Vec<FragmentNode>,
    },
}

impl FragmentNode {
    pub fn text(text: impl Into<String>) -> Self {
        FragmentNode::Text { text: text.into() }
    }

    pub fn element(tag: impl Into<String>) -> Self {
        FragmentNode::Element {
            element: Element::new(tag),
            children: Vec::new(),
        }
    }

    /// Set an attribute (no-op on text)
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let FragmentNode::Element { element, .. } = &mut self {
            element.set_attr(name, value);
        }
        self
    }

    /// Set a style property (no-op on text)
    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        if let FragmentNode::Element { element, .. } = &mut self {
            element.style.set(property, value);
        }
        self
    }

    /// Append a child (no-op on text)
    pub fn with_child(mut self, child: FragmentNode) -> Self {
        if let FragmentNode::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            FragmentNode::Element { element, .. } => Some(&element.tag),
            FragmentNode::Text { .. } => None,
        }
    }
}

/// An ordered list of detached subtrees, spliced in as siblings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    nodes: Vec<FragmentNode>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<FragmentNode>) -> Self {
        Self { nodes }
    }

    /// Parse markup into a fragment
    pub fn parse(source: &str) -> Result<Self> {
        markup::parse(source).map(Self::from_nodes)
    }

    pub fn push(&mut self, node: FragmentNode) {
        self.nodes.push(node);
    }

    pub fn with(mut self, node: FragmentNode) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn nodes(&self) -> &[FragmentNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

impl From<FragmentNode> for Fragment {
    fn from(node: FragmentNode) -> Self {
        Self { nodes: vec![node] }
    }
}

//! The document tree - the single mutable artifact the editor acts on

use std::collections::HashMap;

use tracing::debug;

use crate::node::tags;
use crate::{markup, CoreError, Element, Fragment, FragmentNode, Node, NodeId, NodeKind, Result};

/// An ordered, mutable tree rooted at a sentinel `root` element
///
/// Nodes live in a map keyed by id and point back at their parent, so
/// upward walks (the structural locator) are cheap and need no host.
#[derive(Debug, Clone)]
pub struct Document {
    root: NodeId,
    nodes: HashMap<NodeId, Node>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        let root = Node::element(tags::ROOT);
        let root_id = root.id;
        let mut nodes = HashMap::new();
        nodes.insert(root_id, root);
        Self {
            root: root_id,
            nodes,
        }
    }

    /// Build a document from serialized markup
    pub fn from_markup(source: &str) -> Result<Self> {
        let fragment = Fragment::parse(source)?;
        let mut doc = Self::new();
        let root = doc.root;
        doc.insert_fragment(root, 0, &fragment)?;
        Ok(doc)
    }

    /// Serialize everything under the root
    pub fn to_markup(&self) -> String {
        markup::write_children(self, self.root)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, including the root and detached nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the root has no children
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(CoreError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(CoreError::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Whether the node is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || (self.contains(id) && self.ancestors(id).any(|a| a == self.root))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent_id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).and_then(Node::tag)
    }

    pub fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.is_tag(tag))
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(&id).and_then(Node::as_element)
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.nodes.get_mut(&id).and_then(Node::as_element_mut)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).and_then(Node::as_text)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(Node::is_text)
    }

    /// Length of a text run in characters (0 for elements)
    pub fn text_len(&self, id: NodeId) -> usize {
        self.text(id).map(|t| t.chars().count()).unwrap_or(0)
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<()> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Text(t) => {
                *t = text.into();
                Ok(())
            }
            NodeKind::Element(_) => Err(CoreError::NotText(id)),
        }
    }

    /// Create a detached text run
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.insert_node(Node::text(text))
    }

    /// Create a detached element
    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.insert_node(Node::from_element(element))
    }

    fn insert_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child)
    }

    /// Attach a detached node under `parent` at `index` (clamped)
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
        if !self.node(parent)?.is_element() {
            return Err(CoreError::NotAnElement(parent));
        }
        if self.node(child)?.parent_id.is_some() || child == self.root {
            return Err(CoreError::AlreadyAttached(child));
        }
        if child == parent || self.ancestors(parent).any(|a| a == child) {
            return Err(CoreError::InvalidStructure(format!(
                "{} cannot be inserted under its own descendant {}",
                child, parent
            )));
        }

        let parent_node = self.node_mut(parent)?;
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, child);
        self.node_mut(child)?.parent_id = Some(parent);
        Ok(())
    }

    /// Unlink a node from its parent, keeping its subtree
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(CoreError::InvalidStructure("the root cannot be detached".into()));
        }
        let parent = self.node(id)?.parent_id;
        if let Some(pid) = parent {
            self.node_mut(pid)?.remove_child(&id);
        }
        self.node_mut(id)?.parent_id = None;
        Ok(())
    }

    /// Remove a node and its whole subtree
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend(node.children);
            }
        }
        Ok(())
    }

    /// Remove every node under the root
    pub fn clear(&mut self) {
        let children: Vec<NodeId> = self.children(self.root).to_vec();
        for child in children {
            // Children of the root always exist, so this cannot fail
            let _ = self.remove(child);
        }
        self.nodes.retain(|_, node| node.parent_id.is_some() || node.id == self.root);
        debug!("Cleared document");
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Iterate over the parent chain of a node, nearest first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// All nodes under `id` in document (pre-)order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Create a detached copy of a node without its children
    pub fn shallow_clone(&mut self, id: NodeId) -> Result<NodeId> {
        let kind = self.node(id)?.kind.clone();
        let node = Node {
            id: NodeId::new(),
            parent_id: None,
            kind,
            children: Vec::new(),
        };
        Ok(self.insert_node(node))
    }

    /// Split a text run at a character offset
    ///
    /// `id` keeps the text before `offset`; a new run with the remainder is
    /// inserted right after it and returned.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId> {
        let text = self.text(id).ok_or(CoreError::NotText(id))?.to_string();
        let byte = char_to_byte(&text, offset);
        let (head, tail) = text.split_at(byte);
        let tail_id = self.create_text(tail);
        self.set_text(id, head)?;

        if let (Some(parent), Some(index)) = (self.parent(id), self.index_in_parent(id)) {
            self.insert_child(parent, index + 1, tail_id)?;
        }
        Ok(tail_id)
    }

    /// Put `wrapper` where `id` is and move `id` inside it
    pub fn wrap(&mut self, id: NodeId, wrapper: Element) -> Result<NodeId> {
        let parent = self
            .parent(id)
            .ok_or_else(|| CoreError::InvalidStructure(format!("{} has no parent", id)))?;
        let index = self.index_in_parent(id).unwrap_or(0);
        let wrapper_id = self.create_element(wrapper);
        self.detach(id)?;
        self.insert_child(parent, index, wrapper_id)?;
        self.append_child(wrapper_id, id)?;
        Ok(wrapper_id)
    }

    /// Replace an element by its children
    pub fn unwrap(&mut self, id: NodeId) -> Result<()> {
        let parent = self
            .parent(id)
            .ok_or_else(|| CoreError::InvalidStructure(format!("{} has no parent", id)))?;
        let index = self.index_in_parent(id).unwrap_or(0);
        let children: Vec<NodeId> = self.children(id).to_vec();
        for (offset, child) in children.into_iter().enumerate() {
            self.detach(child)?;
            self.insert_child(parent, index + 1 + offset, child)?;
        }
        self.remove(id)
    }

    /// Move the children of `id` starting at `from` into a new sibling
    /// inserted right after `id`, returning the sibling
    pub fn split_element(&mut self, id: NodeId, from: usize) -> Result<NodeId> {
        let parent = self
            .parent(id)
            .ok_or_else(|| CoreError::InvalidStructure(format!("{} has no parent", id)))?;
        let index = self.index_in_parent(id).unwrap_or(0);
        let sibling = self.shallow_clone(id)?;
        let moved: Vec<NodeId> = self.children(id).iter().skip(from).copied().collect();
        for child in moved {
            self.detach(child)?;
            self.append_child(sibling, child)?;
        }
        self.insert_child(parent, index + 1, sibling)?;
        Ok(sibling)
    }

    /// Materialize a fragment under `parent` starting at `index`
    ///
    /// Returns the ids of the top-level nodes in insertion order.
    pub fn insert_fragment(
        &mut self,
        parent: NodeId,
        index: usize,
        fragment: &Fragment,
    ) -> Result<Vec<NodeId>> {
        if !self.node(parent)?.is_element() {
            return Err(CoreError::NotAnElement(parent));
        }
        let mut inserted = Vec::with_capacity(fragment.len());
        for (offset, node) in fragment.nodes().iter().enumerate() {
            let id = self.build(node);
            self.insert_child(parent, index + offset, id)?;
            inserted.push(id);
        }
        Ok(inserted)
    }

    fn build(&mut self, node: &FragmentNode) -> NodeId {
        match node {
            FragmentNode::Text { text } => self.create_text(text.clone()),
            FragmentNode::Element { element, children } => {
                let id = self.create_element(element.clone());
                for child in children {
                    let child_id = self.build(child);
                    // Freshly built nodes are detached and acyclic
                    if let Some(node) = self.nodes.get_mut(&child_id) {
                        node.parent_id = Some(id);
                    }
                    if let Some(node) = self.nodes.get_mut(&id) {
                        node.children.push(child_id);
                    }
                }
                id
            }
        }
    }

    /// Text content as a reader sees it: blocks and `br` break lines,
    /// table cells are separated by tabs
    pub fn rendered_text(&self) -> String {
        let mut out = String::new();
        self.render_into(self.root, &mut out);
        out
    }

    /// Rendered text of a single subtree
    pub fn rendered_text_of(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_into(id, &mut out);
        out
    }

    fn render_into(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element(el) => {
                let tag = el.tag.as_str();
                if tag == tags::BR {
                    out.push('\n');
                    return;
                }
                let block = tags::is_block(tag);
                if block && !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                for child in &node.children {
                    self.render_into(*child, out);
                }
                if tags::is_cell(tag) {
                    out.push('\t');
                } else if block && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a node's ancestors, nearest first
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// Byte index of the `offset`-th character, clamped to the string length
pub fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

//! Structural lookups bounded by the document root

use ethos_core::{Document, NodeId, Selection};

/// Nearest node with `tag`, starting at `from` itself and walking up
///
/// The walk stops at the root, which never matches; a detached `from`
/// yields `None` once its parent chain runs out.
pub fn find_ancestor(doc: &Document, from: NodeId, tag: &str) -> Option<NodeId> {
    let mut current = Some(from);
    while let Some(id) = current {
        if id == doc.root() {
            return None;
        }
        if doc.has_tag(id, tag) {
            return Some(id);
        }
        current = doc.parent(id);
    }
    None
}

/// [`find_ancestor`] from the selection's anchor node
pub fn find_selection_ancestor(
    doc: &Document,
    selection: Option<&Selection>,
    tag: &str,
) -> Option<NodeId> {
    let anchor = selection?.anchor.node;
    if !doc.is_attached(anchor) {
        return None;
    }
    find_ancestor(doc, anchor, tag)
}

//! Applying commands to the tracked selection
//!
//! Every operation takes the document plus the host-reported selection and
//! returns the selection that should be tracked afterwards. `Ok(None)` means
//! there was no usable selection and nothing was touched.
//!
//! Positions are compared through their boundary paths: the child indices
//! from the root down to the position's node, followed by its offset. For a
//! text run that makes `(parent, i)` sort before every offset inside the
//! run and `(parent, i + 1)` after them, so plain lexicographic order is
//! document order.

use ethos_core::{tags, CoreError, Document, Element, Fragment, NodeId, Position, Selection};
use tracing::debug;

use crate::command::{Alignment, Command};
use crate::error::Result;

/// Apply `command` to `selection`
pub fn apply(
    doc: &mut Document,
    selection: Option<&Selection>,
    command: &Command,
) -> Result<Option<Selection>> {
    let Some(range) = selection.and_then(|s| Range::resolve(doc, s)) else {
        debug!("Ignoring {}: no selection in the document", command.name());
        return Ok(None);
    };

    let selection = match command {
        Command::Align(alignment) => align(doc, &range, *alignment)?,
        Command::InsertFragment(fragment) => insert_fragment(doc, &range, fragment)?,
        _ if range.is_collapsed() => format_caret(doc, range.start, command)?,
        _ => format_range(doc, &range, command)?,
    };
    debug!("Applied {}", command.name());
    Ok(Some(selection))
}

/// Type `text` at the selection, replacing any selected content
pub fn insert_text(
    doc: &mut Document,
    selection: Option<&Selection>,
    text: &str,
) -> Result<Option<Selection>> {
    let Some(range) = selection.and_then(|s| Range::resolve(doc, s)) else {
        return Ok(None);
    };
    let caret = if range.is_collapsed() {
        range.start
    } else {
        delete_range(doc, &range)?
    };
    if text.is_empty() {
        return Ok(Some(Selection::caret(caret)));
    }

    let added = text.chars().count();
    if let Some(current) = doc.text(caret.node) {
        let mut updated = current.to_string();
        updated.insert_str(ethos_core::char_to_byte(current, caret.offset), text);
        doc.set_text(caret.node, updated)?;
        return Ok(Some(Selection::caret(Position::new(
            caret.node,
            caret.offset + added,
        ))));
    }

    let (parent, index) = insertion_point(doc, caret)?;
    let children = doc.children(parent);
    let before = index.checked_sub(1).and_then(|i| children.get(i)).copied();
    let after = children.get(index).copied();

    let position = match (before, after) {
        (Some(prev), _) if doc.is_text(prev) => {
            let mut updated = doc.text(prev).unwrap_or_default().to_string();
            updated.push_str(text);
            doc.set_text(prev, updated)?;
            Position::new(prev, doc.text_len(prev))
        }
        (_, Some(next)) if doc.is_text(next) => {
            let mut updated = text.to_string();
            updated.push_str(doc.text(next).unwrap_or_default());
            doc.set_text(next, updated)?;
            Position::new(next, added)
        }
        _ => {
            let run = doc.create_text(text);
            doc.insert_child(parent, index, run)?;
            Position::new(run, added)
        }
    };
    Ok(Some(Selection::caret(position)))
}

/// Remove the selected content, leaving a caret where it started
pub fn delete_selection(
    doc: &mut Document,
    selection: Option<&Selection>,
) -> Result<Option<Selection>> {
    let Some(range) = selection.and_then(|s| Range::resolve(doc, s)) else {
        return Ok(None);
    };
    if range.is_collapsed() {
        return Ok(Some(Selection::caret(range.start)));
    }
    delete_range(doc, &range).map(|caret| Some(Selection::caret(caret)))
}

/// A selection resolved against the tree, in document order
#[derive(Debug, Clone)]
struct Range {
    start: Position,
    end: Position,
    start_path: Vec<usize>,
    end_path: Vec<usize>,
}

impl Range {
    fn resolve(doc: &Document, selection: &Selection) -> Option<Self> {
        let anchor = clamp(doc, selection.anchor)?;
        let focus = clamp(doc, selection.focus)?;
        let anchor_path = boundary_path(doc, anchor)?;
        let focus_path = boundary_path(doc, focus)?;

        Some(if anchor_path <= focus_path {
            Self {
                start: anchor,
                end: focus,
                start_path: anchor_path,
                end_path: focus_path,
            }
        } else {
            Self {
                start: focus,
                end: anchor,
                start_path: focus_path,
                end_path: anchor_path,
            }
        })
    }

    fn is_collapsed(&self) -> bool {
        self.start_path == self.end_path
    }
}

/// Selected content, in document order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    /// Characters `start..end` of a text run
    Text {
        node: NodeId,
        start: usize,
        end: usize,
    },
    /// A void element (image, line break) lying wholly inside the range
    Atom(NodeId),
}

/// A segment after its text run was split to cover exactly the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece {
    Text(NodeId),
    Atom(NodeId),
}

impl Piece {
    fn id(&self) -> NodeId {
        match self {
            Piece::Text(id) | Piece::Atom(id) => *id,
        }
    }
}

fn clamp(doc: &Document, position: Position) -> Option<Position> {
    if !doc.is_attached(position.node) {
        return None;
    }
    let limit = if doc.is_text(position.node) {
        doc.text_len(position.node)
    } else {
        doc.children(position.node).len()
    };
    Some(Position::new(position.node, position.offset.min(limit)))
}

/// Child indices from the root down to `id`
fn node_path(doc: &Document, id: NodeId) -> Option<Vec<usize>> {
    let mut path = Vec::new();
    let mut current = id;
    while current != doc.root() {
        path.push(doc.index_in_parent(current)?);
        current = doc.parent(current)?;
    }
    path.reverse();
    Some(path)
}

fn boundary_path(doc: &Document, position: Position) -> Option<Vec<usize>> {
    let mut path = node_path(doc, position.node)?;
    path.push(position.offset);
    Some(path)
}

fn collect_segments(doc: &Document, range: &Range) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut path = Vec::new();
    collect_under(doc, doc.root(), &mut path, range, &mut segments);
    segments
}

fn collect_under(
    doc: &Document,
    parent: NodeId,
    path: &mut Vec<usize>,
    range: &Range,
    out: &mut Vec<Segment>,
) {
    for (index, child) in doc.children(parent).iter().copied().enumerate() {
        path.push(index);

        if doc.is_text(child) {
            let len = doc.text_len(child);
            let mut run_start = path.clone();
            run_start.push(0);
            let mut run_end = path.clone();
            run_end.push(len);

            let start = if range.start.node == child {
                Some(range.start.offset)
            } else if range.start_path <= run_start {
                Some(0)
            } else {
                None
            };
            let end = if range.end.node == child {
                Some(range.end.offset)
            } else if range.end_path >= run_end {
                Some(len)
            } else {
                None
            };
            if let (Some(start), Some(end)) = (start, end) {
                if start < end {
                    out.push(Segment::Text {
                        node: child,
                        start,
                        end,
                    });
                }
            }
        } else if doc.tag(child).is_some_and(tags::is_void) {
            let mut after = path.clone();
            if let Some(last) = after.last_mut() {
                *last += 1;
            }
            if range.start_path <= *path && after <= range.end_path {
                out.push(Segment::Atom(child));
            }
        } else {
            collect_under(doc, child, path, range, out);
        }

        path.pop();
    }
}

/// Split boundary runs so every piece is selected in full
fn isolate(doc: &mut Document, segments: &[Segment]) -> Result<Vec<Piece>> {
    let mut pieces = Vec::with_capacity(segments.len());
    for segment in segments {
        match *segment {
            Segment::Text { node, start, end } => {
                if end < doc.text_len(node) {
                    doc.split_text(node, end)?;
                }
                let node = if start > 0 {
                    doc.split_text(node, start)?
                } else {
                    node
                };
                pieces.push(Piece::Text(node));
            }
            Segment::Atom(node) => pieces.push(Piece::Atom(node)),
        }
    }
    Ok(pieces)
}

fn position_before(doc: &Document, piece: Piece) -> Result<Position> {
    match piece {
        Piece::Text(id) => Ok(Position::new(id, 0)),
        Piece::Atom(id) => sibling_position(doc, id, 0),
    }
}

fn position_after(doc: &Document, piece: Piece) -> Result<Position> {
    match piece {
        Piece::Text(id) => Ok(Position::new(id, doc.text_len(id))),
        Piece::Atom(id) => sibling_position(doc, id, 1),
    }
}

/// Position in the parent of `id`, `shift` children past it
fn sibling_position(doc: &Document, id: NodeId, shift: usize) -> Result<Position> {
    let parent = doc.parent(id).ok_or(CoreError::NodeNotFound(id))?;
    let index = doc.index_in_parent(id).ok_or(CoreError::NodeNotFound(id))?;
    Ok(Position::new(parent, index + shift))
}

/// Turn a caret into a (parent, child index) slot, splitting a text run
/// when the caret sits inside one
fn insertion_point(doc: &mut Document, caret: Position) -> Result<(NodeId, usize)> {
    if doc.is_text(caret.node) {
        let slot = sibling_position(doc, caret.node, 0)?;
        let len = doc.text_len(caret.node);
        return Ok(if caret.offset == 0 {
            (slot.node, slot.offset)
        } else if caret.offset >= len {
            (slot.node, slot.offset + 1)
        } else {
            doc.split_text(caret.node, caret.offset)?;
            (slot.node, slot.offset + 1)
        });
    }
    if doc.tag(caret.node).is_some_and(tags::is_void) {
        let slot = sibling_position(doc, caret.node, usize::from(caret.offset > 0))?;
        return Ok((slot.node, slot.offset));
    }
    Ok((caret.node, caret.offset))
}

/// Nearest element at or above `id` whose tag is one of `matching`
fn formatting_ancestor(doc: &Document, id: NodeId, matching: &[&str]) -> Option<NodeId> {
    std::iter::once(id)
        .chain(doc.ancestors(id))
        .take_while(|a| *a != doc.root())
        .find(|a| doc.tag(*a).is_some_and(|tag| matching.contains(&tag)))
}

/// Move `node` out of `wrapper`, splitting every element in between so
/// content before and after `node` keeps its formatting
fn lift_out(doc: &mut Document, node: NodeId, wrapper: NodeId) -> Result<()> {
    let mut current = node;
    loop {
        let parent = doc.parent(current).ok_or(CoreError::NodeNotFound(current))?;
        let index = doc.index_in_parent(current).ok_or(CoreError::NodeNotFound(current))?;
        if index + 1 < doc.children(parent).len() {
            doc.split_element(parent, index + 1)?;
        }

        if parent == wrapper {
            let outer = sibling_position(doc, wrapper, 1)?;
            doc.detach(current)?;
            doc.insert_child(outer.node, outer.offset, current)?;
            if doc.children(wrapper).is_empty() {
                doc.remove(wrapper)?;
            }
            return Ok(());
        }

        if index > 0 {
            let middle = doc.shallow_clone(parent)?;
            let slot = sibling_position(doc, parent, 1)?;
            doc.detach(current)?;
            doc.append_child(middle, current)?;
            doc.insert_child(slot.node, slot.offset, middle)?;
            current = middle;
        } else {
            current = parent;
        }
    }
}

fn format_range(doc: &mut Document, range: &Range, command: &Command) -> Result<Selection> {
    let segments = collect_segments(doc, range);
    if segments.is_empty() {
        return Ok(Selection::new(range.start, range.end));
    }
    let pieces = isolate(doc, &segments)?;
    let texts: Vec<NodeId> = pieces
        .iter()
        .filter_map(|p| match p {
            Piece::Text(id) => Some(*id),
            Piece::Atom(_) => None,
        })
        .collect();

    if let Some(matching) = command.toggle_tags() {
        let formatted = texts
            .iter()
            .all(|t| formatting_ancestor(doc, *t, matching).is_some());
        if formatted {
            for text in &texts {
                while let Some(wrapper) = formatting_ancestor(doc, *text, matching) {
                    lift_out(doc, *text, wrapper)?;
                }
            }
        } else if let Some(wrapper) = command.wrapper() {
            for text in &texts {
                if formatting_ancestor(doc, *text, matching).is_none() {
                    doc.wrap(*text, wrapper.clone())?;
                }
            }
        }
    } else if let Some(wrapper) = command.wrapper() {
        for text in &texts {
            restyle_or_wrap(doc, *text, &wrapper)?;
        }
    }

    // `isolate` returned at least one piece for a non-empty segment list
    let first = pieces[0];
    let last = pieces[pieces.len() - 1];
    Ok(Selection::new(
        position_before(doc, first)?,
        position_after(doc, last)?,
    ))
}

/// Wrap `text`, or update its parent in place when the parent is the same
/// kind of wrapper holding nothing else
fn restyle_or_wrap(doc: &mut Document, text: NodeId, wrapper: &Element) -> Result<()> {
    if let Some(parent) = doc.parent(text).filter(|p| *p != doc.root()) {
        let sole_child = doc.children(parent) == [text];
        if sole_child && doc.has_tag(parent, &wrapper.tag) {
            if let Some(existing) = doc.element_mut(parent) {
                for (name, value) in &wrapper.attributes {
                    existing.set_attr(name.clone(), value.clone());
                }
                for (property, value) in wrapper.style.iter() {
                    existing.style.set(property, value);
                }
            }
            return Ok(());
        }
    }
    doc.wrap(text, wrapper.clone())?;
    Ok(())
}

fn format_caret(doc: &mut Document, caret: Position, command: &Command) -> Result<Selection> {
    if let Some(matching) = command.toggle_tags() {
        if formatting_ancestor(doc, caret.node, matching).is_some() {
            // Step out of the formatting: park an empty run at the caret and
            // lift it out, then drop it and keep its slot
            let (parent, index) = insertion_point(doc, caret)?;
            let marker = doc.create_text("");
            doc.insert_child(parent, index, marker)?;
            while let Some(wrapper) = formatting_ancestor(doc, marker, matching) {
                lift_out(doc, marker, wrapper)?;
            }
            let slot = sibling_position(doc, marker, 0)?;
            doc.remove(marker)?;
            return Ok(Selection::caret(slot));
        }
    }

    let Some(wrapper) = command.wrapper() else {
        return Ok(Selection::caret(caret));
    };
    let (parent, index) = insertion_point(doc, caret)?;
    let id = doc.create_element(wrapper);
    doc.insert_child(parent, index, id)?;

    if let Command::Link(url) = command {
        let label = doc.create_text(url.as_str());
        doc.append_child(id, label)?;
        return Ok(Selection::caret(Position::new(label, doc.text_len(label))));
    }
    Ok(Selection::caret(Position::new(id, 0)))
}

/// Blocks whose `text-align` controls the text inside them
fn is_alignable(tag: &str) -> bool {
    tags::is_cell(tag)
        || (tags::is_block(tag)
            && !matches!(
                tag,
                "table" | "thead" | "tbody" | "tfoot" | "tr" | "ul" | "ol" | "hr"
            ))
}

fn align(doc: &mut Document, range: &Range, alignment: Alignment) -> Result<Selection> {
    let mut targets: Vec<NodeId> = collect_segments(doc, range)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text { node, .. } | Segment::Atom(node) => node,
        })
        .collect();
    if targets.is_empty() {
        targets.push(caret_target(doc, range.start));
    }

    let mut blocks: Vec<NodeId> = Vec::new();
    let mut caret = None;
    for target in targets {
        let block = match alignment_block(doc, target)? {
            Some(block) => block,
            None => {
                let block = doc.create_element(Element::new(tags::DIV));
                let root = doc.root();
                doc.insert_child(root, range.start.offset, block)?;
                caret = Some(Position::new(block, 0));
                block
            }
        };
        if !blocks.contains(&block) {
            blocks.push(block);
        }
    }

    for block in &blocks {
        if let Some(element) = doc.element_mut(*block) {
            element.style.set("text-align", alignment.as_css());
        }
    }

    Ok(match caret {
        Some(caret) => Selection::caret(caret),
        None => Selection::new(
            clamp(doc, range.start).unwrap_or(range.start),
            clamp(doc, range.end).unwrap_or(range.end),
        ),
    })
}

/// Node whose block a collapsed caret aligns
///
/// A caret between root children aligns the child after it, else the one
/// before it. Tables, lists and rules are skipped.
fn caret_target(doc: &Document, at: Position) -> NodeId {
    let root = doc.root();
    if at.node != root {
        return at.node;
    }
    let children = doc.children(root);
    let after = children.get(at.offset);
    let before = at.offset.checked_sub(1).and_then(|i| children.get(i));
    after
        .into_iter()
        .chain(before)
        .copied()
        .find(|id| {
            doc.tag(*id)
                .map_or(true, |tag| is_alignable(tag) || !tags::is_block(tag))
        })
        .unwrap_or(root)
}

/// The block whose alignment governs `id`
///
/// Inline content sitting directly under the root is gathered into a new
/// `div` first. `None` means `id` is the root and there is no content
/// next to the caret to align.
fn alignment_block(doc: &mut Document, id: NodeId) -> Result<Option<NodeId>> {
    let root = doc.root();
    if id == root {
        return Ok(None);
    }
    if let Some(block) = std::iter::once(id)
        .chain(doc.ancestors(id))
        .take_while(|a| *a != root)
        .find(|a| doc.tag(*a).is_some_and(is_alignable))
    {
        return Ok(Some(block));
    }

    let top = std::iter::once(id)
        .chain(doc.ancestors(id))
        .find(|a| doc.parent(*a) == Some(root))
        .ok_or(CoreError::NodeNotFound(id))?;
    wrap_inline_run(doc, top).map(Some)
}

/// Move the run of inline root children around `top` into a new `div`
fn wrap_inline_run(doc: &mut Document, top: NodeId) -> Result<NodeId> {
    let root = doc.root();
    let children = doc.children(root).to_vec();
    let index = doc.index_in_parent(top).ok_or(CoreError::NodeNotFound(top))?;
    let is_inline = |id: &NodeId| !doc.tag(*id).is_some_and(tags::is_block);

    let first = children[..index]
        .iter()
        .rposition(|c| !is_inline(c))
        .map_or(0, |i| i + 1);
    let last = children[index..]
        .iter()
        .position(|c| !is_inline(c))
        .map_or(children.len(), |i| index + i);

    let block = doc.create_element(Element::new(tags::DIV));
    for child in &children[first..last] {
        doc.detach(*child)?;
        doc.append_child(block, *child)?;
    }
    doc.insert_child(root, first, block)?;
    Ok(block)
}

/// Whether the insertion slot can hold block content
fn accepts_blocks(doc: &Document, id: NodeId) -> bool {
    id == doc.root()
        || doc.tag(id).is_some_and(|tag| {
            tags::is_cell(tag)
                || matches!(
                    tag,
                    "div" | "li" | "blockquote" | "section" | "article" | "header" | "footer"
                )
        })
}

fn insert_fragment(doc: &mut Document, range: &Range, fragment: &Fragment) -> Result<Selection> {
    let caret = if range.is_collapsed() {
        range.start
    } else {
        delete_range(doc, range)?
    };
    let (mut parent, mut index) = insertion_point(doc, caret)?;

    let has_blocks = fragment
        .nodes()
        .iter()
        .any(|n| n.tag().is_some_and(tags::is_block));
    if has_blocks && !accepts_blocks(doc, parent) {
        (parent, index) = hoist_slot(doc, parent, index)?;
    }

    let inserted = doc.insert_fragment(parent, index, fragment)?;
    Ok(Selection::caret(Position::new(parent, index + inserted.len())))
}

/// Split the inline and paragraph elements around a slot until it sits in
/// an element that can hold blocks
fn hoist_slot(doc: &mut Document, parent: NodeId, index: usize) -> Result<(NodeId, usize)> {
    let container = doc
        .ancestors(parent)
        .find(|a| accepts_blocks(doc, *a))
        .unwrap_or(doc.root());
    let outermost = std::iter::once(parent)
        .chain(doc.ancestors(parent))
        .find(|a| doc.parent(*a) == Some(container))
        .ok_or(CoreError::NodeNotFound(parent))?;

    let marker = doc.create_text("");
    doc.insert_child(parent, index, marker)?;
    split_out(doc, marker, outermost)?;
    let slot = sibling_position(doc, marker, 0)?;
    doc.remove(marker)?;
    Ok((slot.node, slot.offset))
}

/// Split every element from the parent of `node` up to `outermost` at
/// `node`, leaving `node` as a bare sibling right after `outermost`
///
/// Unlike [`lift_out`] nothing is wrapped around `node`. Elements left
/// empty by the split are removed.
fn split_out(doc: &mut Document, node: NodeId, outermost: NodeId) -> Result<()> {
    loop {
        let parent = doc.parent(node).ok_or(CoreError::NodeNotFound(node))?;
        let index = doc.index_in_parent(node).ok_or(CoreError::NodeNotFound(node))?;
        if index + 1 < doc.children(parent).len() {
            doc.split_element(parent, index + 1)?;
        }

        let slot = sibling_position(doc, parent, 1)?;
        doc.detach(node)?;
        doc.insert_child(slot.node, slot.offset, node)?;
        if doc.children(parent).is_empty() {
            doc.remove(parent)?;
        }
        if parent == outermost {
            return Ok(());
        }
    }
}

/// Remove everything in `range`, returning the caret left behind
fn delete_range(doc: &mut Document, range: &Range) -> Result<Position> {
    let segments = collect_segments(doc, range);
    if segments.is_empty() {
        return Ok(range.start);
    }
    let pieces = isolate(doc, &segments)?;
    let mut caret = position_before_slot(doc, pieces[0])?;

    let mut parents: Vec<NodeId> = Vec::new();
    for piece in &pieces {
        if let Some(parent) = doc.parent(piece.id()) {
            if !parents.contains(&parent) {
                parents.push(parent);
            }
        }
        remove_tracking(doc, piece.id(), &mut caret)?;
    }

    // Inline wrappers emptied by the removal go too
    for parent in parents {
        let mut current = parent;
        while current != doc.root()
            && doc.contains(current)
            && doc.children(current).is_empty()
            && doc
                .tag(current)
                .is_some_and(|tag| !tags::is_block(tag) && !tags::is_cell(tag) && !tags::is_void(tag))
        {
            let Some(next) = doc.parent(current) else {
                break;
            };
            remove_tracking(doc, current, &mut caret)?;
            current = next;
        }
    }
    Ok(caret)
}

/// Slot just before a piece, in its parent
fn position_before_slot(doc: &Document, piece: Piece) -> Result<Position> {
    sibling_position(doc, piece.id(), 0)
}

/// Remove `id`, keeping `caret` pointing at the same place
fn remove_tracking(doc: &mut Document, id: NodeId, caret: &mut Position) -> Result<()> {
    let slot = sibling_position(doc, id, 0)?;
    if caret.node == id {
        *caret = slot;
    } else if caret.node == slot.node && slot.offset < caret.offset {
        caret.offset -= 1;
    }
    doc.remove(id)?;
    Ok(())
}

//! Image selection, resize drags and alignment

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use ethos_core::{format_px, tags, Document, NodeId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EditorError, Result};

/// Horizontal placement of a block-displayed image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageAlignment {
    Left,
    Center,
    Right,
}

impl ImageAlignment {
    /// `margin-left` and `margin-right` values for this alignment
    fn margins(&self) -> (&'static str, &'static str) {
        match self {
            ImageAlignment::Left => ("0", "auto"),
            ImageAlignment::Center => ("auto", "auto"),
            ImageAlignment::Right => ("auto", "0"),
        }
    }
}

impl fmt::Display for ImageAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageAlignment::Left => "left",
            ImageAlignment::Center => "center",
            ImageAlignment::Right => "right",
        })
    }
}

impl FromStr for ImageAlignment {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(ImageAlignment::Left),
            "center" => Ok(ImageAlignment::Center),
            "right" => Ok(ImageAlignment::Right),
            _ => Err(EditorError::invalid("image alignment", s)),
        }
    }
}

/// Alignment an image currently has, read back from its margins
pub fn image_alignment(doc: &Document, image: NodeId) -> Option<ImageAlignment> {
    let style = &doc.element(image)?.style;
    let margins = (style.get("margin-left")?, style.get("margin-right")?);
    [
        ImageAlignment::Left,
        ImageAlignment::Center,
        ImageAlignment::Right,
    ]
    .into_iter()
    .find(|alignment| alignment.margins() == margins)
}

/// What a pointer-down landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Image(NodeId),
    /// The resize handle drawn over the selected image
    ResizeHandle,
    /// One of the image toolbar controls (align, reset)
    ImageControl,
    Elsewhere,
}

/// Kinds of global listener a drag session needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    PointerMove,
    PointerUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// The host's registry of global pointer listeners
pub trait ListenerRegistry: Send {
    fn add(&mut self, kind: ListenerKind) -> ListenerId;

    /// Remove a listener, returning whether it was registered
    fn remove(&mut self, id: ListenerId) -> bool;

    /// Number of listeners currently registered
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process listener registry
#[derive(Debug, Default)]
pub struct WindowListeners {
    next_id: u64,
    active: HashMap<ListenerId, ListenerKind>,
}

impl WindowListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered listeners of one kind
    pub fn count(&self, kind: ListenerKind) -> usize {
        self.active.values().filter(|k| **k == kind).count()
    }
}

impl ListenerRegistry for WindowListeners {
    fn add(&mut self, kind: ListenerKind) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.active.insert(id, kind);
        id
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        self.active.remove(&id).is_some()
    }

    fn len(&self) -> usize {
        self.active.len()
    }
}

/// A resize drag in progress
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub image: NodeId,
    pub start_x: f32,
    pub start_width: f32,
    move_listener: ListenerId,
    up_listener: ListenerId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResizeState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Tracks the selected image and its resize session
///
/// At most one image is selected and at most one drag runs at a time. Every
/// listener a drag registers is removed when that drag ends, whether by
/// pointer-up, cancellation, or a new drag replacing it.
#[derive(Debug)]
pub struct ImageController {
    selected: Option<NodeId>,
    resize: ResizeState,
    min_width: f32,
}

impl ImageController {
    pub fn new(min_width: f32) -> Self {
        Self {
            selected: None,
            resize: ResizeState::Idle,
            min_width,
        }
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn resize_state(&self) -> &ResizeState {
        &self.resize
    }

    pub fn is_resizing(&self) -> bool {
        matches!(self.resize, ResizeState::Dragging(_))
    }

    /// Update the selection for a pointer-down
    ///
    /// Returns the new selection when it changed.
    pub fn pointer_down(
        &mut self,
        doc: &Document,
        target: PointerTarget,
        listeners: &mut dyn ListenerRegistry,
    ) -> Option<Option<NodeId>> {
        let next = match target {
            PointerTarget::ResizeHandle | PointerTarget::ImageControl => return None,
            PointerTarget::Image(id) if is_live_image(doc, id) => Some(id),
            PointerTarget::Image(_) | PointerTarget::Elsewhere => None,
        };
        self.select(next, listeners)
    }

    fn select(
        &mut self,
        next: Option<NodeId>,
        listeners: &mut dyn ListenerRegistry,
    ) -> Option<Option<NodeId>> {
        if next == self.selected {
            return None;
        }
        self.cancel_resize(listeners);
        self.selected = next;
        debug!("Image selection changed to {:?}", next);
        Some(next)
    }

    /// Start a resize drag on the selected image
    ///
    /// A drag already running is cancelled first.
    pub fn begin_resize(
        &mut self,
        doc: &Document,
        listeners: &mut dyn ListenerRegistry,
        start_x: f32,
        start_width: f32,
    ) -> Result<()> {
        let image = self
            .selected
            .filter(|id| is_live_image(doc, *id))
            .ok_or(EditorError::NoImageSelected)?;
        self.cancel_resize(listeners);

        let move_listener = listeners.add(ListenerKind::PointerMove);
        let up_listener = listeners.add(ListenerKind::PointerUp);
        self.resize = ResizeState::Dragging(DragSession {
            image,
            start_x,
            start_width,
            move_listener,
            up_listener,
        });
        debug!("Resize started on {} at width {}", image, start_width);
        Ok(())
    }

    /// Apply a pointer-move to the running drag
    ///
    /// Returns whether the image changed.
    pub fn pointer_move(&self, doc: &mut Document, x: f32) -> bool {
        let ResizeState::Dragging(session) = &self.resize else {
            return false;
        };
        if !is_live_image(doc, session.image) {
            return false;
        }
        let width = (session.start_width + (x - session.start_x)).max(self.min_width);
        match doc.element_mut(session.image) {
            Some(element) => {
                element.style.set("width", format_px(width));
                element.style.set("height", "auto");
                true
            }
            None => false,
        }
    }

    /// End the running drag, returning whether one was running
    pub fn pointer_up(&mut self, listeners: &mut dyn ListenerRegistry) -> bool {
        self.cancel_resize(listeners)
    }

    /// Drop the running drag and its listeners
    pub fn cancel_resize(&mut self, listeners: &mut dyn ListenerRegistry) -> bool {
        match std::mem::take(&mut self.resize) {
            ResizeState::Dragging(session) => {
                listeners.remove(session.move_listener);
                listeners.remove(session.up_listener);
                debug!("Resize ended on {}", session.image);
                true
            }
            ResizeState::Idle => false,
        }
    }

    /// Place the selected image left, centered or right
    pub fn align(&self, doc: &mut Document, alignment: ImageAlignment) -> Result<NodeId> {
        let image = self.live_selection(doc)?;
        let (left, right) = alignment.margins();
        if let Some(element) = doc.element_mut(image) {
            element.style.set("display", "block");
            element.style.set("margin-left", left);
            element.style.set("margin-right", right);
        }
        Ok(image)
    }

    /// Drop explicit width and height from the selected image
    pub fn reset(&self, doc: &mut Document) -> Result<NodeId> {
        let image = self.live_selection(doc)?;
        if let Some(element) = doc.element_mut(image) {
            element.style.remove("width");
            element.style.remove("height");
        }
        Ok(image)
    }

    /// Forget a selection whose image left the tree
    ///
    /// Returns true when the selection was cleared.
    pub fn sync(&mut self, doc: &Document, listeners: &mut dyn ListenerRegistry) -> bool {
        match self.selected {
            Some(id) if !is_live_image(doc, id) => {
                self.select(None, listeners);
                true
            }
            _ => false,
        }
    }

    fn live_selection(&self, doc: &Document) -> Result<NodeId> {
        self.selected
            .filter(|id| is_live_image(doc, *id))
            .ok_or(EditorError::NoImageSelected)
    }
}

fn is_live_image(doc: &Document, id: NodeId) -> bool {
    doc.has_tag(id, tags::IMG) && doc.is_attached(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images(markup: &str) -> (Document, Vec<NodeId>) {
        let doc = Document::from_markup(markup).unwrap();
        let images = doc
            .descendants(doc.root())
            .into_iter()
            .filter(|id| doc.has_tag(*id, tags::IMG))
            .collect();
        (doc, images)
    }

    #[test]
    fn test_selection_replaced_atomically() {
        let (doc, imgs) = images("<img src=\"a\"><p>text</p><img src=\"b\">");
        let mut listeners = WindowListeners::new();
        let mut controller = ImageController::new(16.0);

        assert_eq!(
            controller.pointer_down(&doc, PointerTarget::Image(imgs[0]), &mut listeners),
            Some(Some(imgs[0]))
        );
        assert_eq!(
            controller.pointer_down(&doc, PointerTarget::Image(imgs[1]), &mut listeners),
            Some(Some(imgs[1]))
        );
        assert_eq!(controller.selected(), Some(imgs[1]));

        assert_eq!(
            controller.pointer_down(&doc, PointerTarget::ResizeHandle, &mut listeners),
            None
        );
        assert_eq!(
            controller.pointer_down(&doc, PointerTarget::Elsewhere, &mut listeners),
            Some(None)
        );
        assert_eq!(
            controller.pointer_down(&doc, PointerTarget::Elsewhere, &mut listeners),
            None
        );
    }

    #[test]
    fn test_pointer_down_on_non_image_deselects() {
        let (doc, imgs) = images("<img src=\"a\"><p>text</p>");
        let paragraph = doc.children(doc.root())[1];
        let mut listeners = WindowListeners::new();
        let mut controller = ImageController::new(16.0);

        controller.pointer_down(&doc, PointerTarget::Image(imgs[0]), &mut listeners);
        controller.pointer_down(&doc, PointerTarget::Image(paragraph), &mut listeners);
        assert_eq!(controller.selected(), None);
    }

    #[test]
    fn test_resize_session_listeners_balance() {
        let (mut doc, imgs) = images("<img src=\"a\" style=\"width: 300px\">");
        let mut listeners = WindowListeners::new();
        let mut controller = ImageController::new(16.0);
        controller.pointer_down(&doc, PointerTarget::Image(imgs[0]), &mut listeners);

        let before = listeners.len();
        controller.begin_resize(&doc, &mut listeners, 100.0, 300.0).unwrap();
        assert_eq!(listeners.count(ListenerKind::PointerMove), 1);
        assert_eq!(listeners.count(ListenerKind::PointerUp), 1);

        assert!(controller.pointer_move(&mut doc, 150.0));
        let style = &doc.element(imgs[0]).unwrap().style;
        assert_eq!(style.get("width"), Some("350px"));
        assert_eq!(style.get("height"), Some("auto"));

        assert!(controller.pointer_up(&mut listeners));
        assert_eq!(listeners.len(), before);
        assert!(!controller.pointer_move(&mut doc, 400.0));
        assert_eq!(doc.element(imgs[0]).unwrap().style.get("width"), Some("350px"));
    }

    #[test]
    fn test_width_clamped_to_minimum() {
        let (mut doc, imgs) = images("<img src=\"a\">");
        let mut listeners = WindowListeners::new();
        let mut controller = ImageController::new(16.0);
        controller.pointer_down(&doc, PointerTarget::Image(imgs[0]), &mut listeners);
        controller.begin_resize(&doc, &mut listeners, 200.0, 100.0).unwrap();

        controller.pointer_move(&mut doc, 0.0);
        assert_eq!(doc.element(imgs[0]).unwrap().style.get("width"), Some("16px"));
    }

    #[test]
    fn test_second_begin_cancels_first() {
        let (doc, imgs) = images("<img src=\"a\">");
        let mut listeners = WindowListeners::new();
        let mut controller = ImageController::new(16.0);
        controller.pointer_down(&doc, PointerTarget::Image(imgs[0]), &mut listeners);

        controller.begin_resize(&doc, &mut listeners, 0.0, 100.0).unwrap();
        controller.begin_resize(&doc, &mut listeners, 10.0, 120.0).unwrap();
        assert_eq!(listeners.len(), 2);

        controller.pointer_up(&mut listeners);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_deselect_during_drag_cancels_it() {
        let (doc, imgs) = images("<img src=\"a\">");
        let mut listeners = WindowListeners::new();
        let mut controller = ImageController::new(16.0);
        controller.pointer_down(&doc, PointerTarget::Image(imgs[0]), &mut listeners);
        controller.begin_resize(&doc, &mut listeners, 0.0, 100.0).unwrap();

        controller.pointer_down(&doc, PointerTarget::Elsewhere, &mut listeners);
        assert!(!controller.is_resizing());
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_begin_without_selection() {
        let (doc, _) = images("<p>no images</p>");
        let mut listeners = WindowListeners::new();
        let mut controller = ImageController::new(16.0);
        assert!(matches!(
            controller.begin_resize(&doc, &mut listeners, 0.0, 10.0),
            Err(EditorError::NoImageSelected)
        ));
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_align_and_reset() {
        let (mut doc, imgs) = images("<img src=\"a\" style=\"width: 120px; height: 80px\">");
        let mut listeners = WindowListeners::new();
        let mut controller = ImageController::new(16.0);
        controller.pointer_down(&doc, PointerTarget::Image(imgs[0]), &mut listeners);

        controller.align(&mut doc, ImageAlignment::Right).unwrap();
        assert_eq!(image_alignment(&doc, imgs[0]), Some(ImageAlignment::Right));
        controller.align(&mut doc, ImageAlignment::Center).unwrap();
        assert_eq!(image_alignment(&doc, imgs[0]), Some(ImageAlignment::Center));

        controller.reset(&mut doc).unwrap();
        assert_eq!(
            doc.to_markup(),
            "<img src=\"a\" style=\"display: block; margin-left: auto; margin-right: auto\">"
        );
    }

    #[test]
    fn test_removed_image_is_forgotten() {
        let (mut doc, imgs) = images("<p><img src=\"a\"></p>");
        let mut listeners = WindowListeners::new();
        let mut controller = ImageController::new(16.0);
        controller.pointer_down(&doc, PointerTarget::Image(imgs[0]), &mut listeners);
        controller.begin_resize(&doc, &mut listeners, 0.0, 50.0).unwrap();

        doc.clear();
        assert!(controller.sync(&doc, &mut listeners));
        assert_eq!(controller.selected(), None);
        assert!(listeners.is_empty());
        assert!(matches!(
            controller.align(&mut doc, ImageAlignment::Left),
            Err(EditorError::NoImageSelected)
        ));
    }
}

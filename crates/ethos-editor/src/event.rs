//! Events published by an editor session

use std::fmt;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use ethos_core::NodeId;
use tracing::debug;

use crate::command::Color;
use crate::image::ImageAlignment;

/// Events sent from the editor to the host
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Something the user should be told about
    Notice(Notice),
    /// The editing surface should take focus again
    FocusRequested,
    WordCountChanged(usize),
    ColorChanged(Color),
    ImageSelectionChanged(Option<NodeId>),
    /// Input that feeds the writing metrics
    Activity(Activity),
    /// The whole tree was replaced (hydration or a generated draft)
    ContentReplaced,
}

/// Short user-facing messages
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    TableCreated { rows: usize, cols: usize },
    RowAdded,
    ColumnAdded,
    TableDeleted,
    NoTableInScope,
    IrregularTable,
    ImageInserted,
    ImageAligned(ImageAlignment),
    ImageReset,
    Saved,
    ShareLinkCopied,
    /// A share link was present but could not be decoded
    ShareLinkInvalid,
    CitationInserted,
    FootnoteInserted(usize),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::TableCreated { rows, cols } => write!(f, "Created {}x{} table", cols, rows),
            Notice::RowAdded => f.write_str("Row added"),
            Notice::ColumnAdded => f.write_str("Column added"),
            Notice::TableDeleted => f.write_str("Table deleted"),
            Notice::NoTableInScope => f.write_str("Place the cursor inside a table first"),
            Notice::IrregularTable => f.write_str("Table rows have different cell counts"),
            Notice::ImageInserted => f.write_str("Image inserted"),
            Notice::ImageAligned(alignment) => write!(f, "Image aligned {}", alignment),
            Notice::ImageReset => f.write_str("Image size reset"),
            Notice::Saved => f.write_str("Document saved"),
            Notice::ShareLinkCopied => f.write_str("Share link copied"),
            Notice::ShareLinkInvalid => f.write_str("Share link could not be read"),
            Notice::CitationInserted => f.write_str("Citation added"),
            Notice::FootnoteInserted(n) => write!(f, "Footnote [{}] added", n),
        }
    }
}

/// Kinds of user input the writing metrics react to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
    Paste,
    Keystroke,
}

/// Sending half of the event channel
///
/// Sends never block: when the host stops draining and the channel fills
/// up, new events are dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender<EditorEvent>,
}

impl EventSink {
    pub fn emit(&self, event: EditorEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => debug!("Event channel full, dropped {:?}", event),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    pub fn notice(&self, notice: Notice) {
        self.emit(EditorEvent::Notice(notice));
    }
}

/// Receiving half of the event channel
#[derive(Debug, Clone)]
pub struct EventStream {
    rx: Receiver<EditorEvent>,
}

impl EventStream {
    /// Try to receive an event (non-blocking)
    pub fn try_recv(&self) -> Option<EditorEvent> {
        self.rx.try_recv().ok()
    }

    /// Take every event currently queued
    pub fn drain(&self) -> Vec<EditorEvent> {
        self.rx.try_iter().collect()
    }

    pub fn receiver(&self) -> &Receiver<EditorEvent> {
        &self.rx
    }
}

/// Create a bounded event channel
pub fn event_channel(capacity: usize) -> (EventSink, EventStream) {
    let (tx, rx) = bounded::<EditorEvent>(capacity.max(1));
    (EventSink { tx }, EventStream { rx })
}

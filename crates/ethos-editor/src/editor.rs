//! The editor session: one document, its selection and everything acting on it

use ethos_core::{tags, Document, Fragment, NodeId, Selection, TemplateKey};
use ethos_store::{decode_share, share_url, take_share_token, Clipboard, Persistence, SnapshotStore};
use tracing::{debug, info, warn};
use url::Url;

use crate::command::{Color, Command};
use crate::config::EditorConfig;
use crate::dispatcher;
use crate::error::{EditorError, Result};
use crate::event::{event_channel, Activity, EditorEvent, EventSink, EventStream, Notice};
use crate::fragments;
use crate::image::{ImageAlignment, ImageController, ListenerRegistry, PointerTarget, WindowListeners};
use crate::table::{self, TableShape};
use crate::word_count::WordCounter;

/// Where the tree came from when a template was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationSource {
    ShareLink,
    Snapshot,
    Empty,
}

/// An editing session
///
/// The session owns the document tree. The host reports the selection with
/// [`Editor::set_selection`] and drains [`EditorEvent`]s from the stream
/// returned by [`Editor::new`].
pub struct Editor {
    config: EditorConfig,
    key: TemplateKey,
    document: Document,
    selection: Option<Selection>,
    images: ImageController,
    listeners: Box<dyn ListenerRegistry>,
    words: WordCounter,
    current_color: Color,
    persistence: Persistence<Box<dyn SnapshotStore>>,
    events: EventSink,
}

impl Editor {
    pub fn new(config: EditorConfig, store: Box<dyn SnapshotStore>) -> (Self, EventStream) {
        let (events, stream) = event_channel(config.event_capacity);
        let current_color = config.default_color.parse().unwrap_or_else(|_| {
            warn!("Invalid default color '{}', using black", config.default_color);
            Color::default()
        });
        let editor = Self {
            key: TemplateKey::new(ethos_core::Mode::None),
            document: Document::new(),
            selection: None,
            images: ImageController::new(config.min_image_width),
            listeners: Box::new(WindowListeners::new()),
            words: WordCounter::new(),
            current_color,
            persistence: Persistence::with_namespace(store, config.storage_namespace.clone()),
            events,
            config,
        };
        (editor, stream)
    }

    /// Use the host's listener registry for resize drags
    pub fn with_listeners(mut self, listeners: Box<dyn ListenerRegistry>) -> Self {
        self.listeners = listeners;
        self
    }

    // Lifecycle

    /// Discard the current tree and load the document for `key`
    ///
    /// A share token wins over the saved snapshot. A token that cannot be
    /// decoded is logged and reported, and the snapshot is used instead. A
    /// snapshot that cannot be read is logged and an empty tree is opened.
    pub fn open(&mut self, key: TemplateKey, share_token: Option<&str>) -> Result<HydrationSource> {
        let shared = share_token.and_then(|token| match self.read_share_token(token) {
            Ok(document) => Some(document),
            Err(e) => {
                warn!("Ignoring share link: {}", e);
                self.events.notice(Notice::ShareLinkInvalid);
                None
            }
        });

        let (document, source) = match shared {
            Some(document) => (document, HydrationSource::ShareLink),
            None => match self.persistence.load(&key)? {
                Some(snapshot) => match Document::from_markup(&snapshot) {
                    Ok(document) => (document, HydrationSource::Snapshot),
                    Err(e) => {
                        warn!("Ignoring unreadable snapshot for {}: {}", key, e);
                        (Document::new(), HydrationSource::Empty)
                    }
                },
                None => (Document::new(), HydrationSource::Empty),
            },
        };

        info!("Opened {} from {:?}", key, source);
        self.key = key;
        self.replace_document(document);
        Ok(source)
    }

    /// [`Editor::open`] with the share token taken out of `url`
    pub fn open_url(&mut self, key: TemplateKey, url: &mut Url) -> Result<HydrationSource> {
        let token = take_share_token(url);
        self.open(key, token.as_deref())
    }

    fn read_share_token(&self, token: &str) -> Result<Document> {
        let markup = decode_share(token)?;
        Ok(Document::from_markup(&markup)?)
    }

    /// Replace the whole tree with generated content
    ///
    /// Edits made since the content was requested are discarded. Markup that
    /// cannot be read is kept as plain text.
    pub fn replace_content(&mut self, content: &str) {
        let document = Document::from_markup(content).unwrap_or_else(|e| {
            debug!("Generated content is not markup ({}), keeping it as text", e);
            let mut document = Document::new();
            let root = document.root();
            let text = document.create_text(content);
            // A fresh text run under the root always attaches
            let _ = document.append_child(root, text);
            document
        });
        self.replace_document(document);
    }

    fn replace_document(&mut self, document: Document) {
        self.document = document;
        self.selection = None;
        if self.images.sync(&self.document, self.listeners.as_mut()) {
            self.events.emit(EditorEvent::ImageSelectionChanged(None));
        }
        self.events.emit(EditorEvent::ContentReplaced);
        self.recount();
    }

    /// Save the current tree under the current template key
    pub fn save(&mut self) -> Result<()> {
        let snapshot = self.get_html();
        self.persistence.save(&self.key, &snapshot)?;
        info!("Saved {} ({} bytes)", self.key, snapshot.len());
        self.events.notice(Notice::Saved);
        Ok(())
    }

    /// Link that opens the current tree
    pub fn share_url(&self, base: &Url) -> Url {
        share_url(base, &self.get_html())
    }

    /// Build the share link and hand it to the clipboard
    pub fn copy_share_link(&self, base: &Url, clipboard: &mut dyn Clipboard) -> Result<Url> {
        let url = self.share_url(base);
        clipboard.write_text(url.as_str())?;
        self.events.notice(Notice::ShareLinkCopied);
        Ok(url)
    }

    // Accessors

    /// The serialized tree
    pub fn get_html(&self) -> String {
        self.document.to_markup()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn template_key(&self) -> &TemplateKey {
        &self.key
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Track the selection reported by the host
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    pub fn word_count(&self) -> usize {
        self.words.count()
    }

    /// Color of the most recent color command
    pub fn current_color(&self) -> &Color {
        &self.current_color
    }

    pub fn store(&self) -> &dyn SnapshotStore {
        self.persistence.store().as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn SnapshotStore {
        self.persistence.store_mut().as_mut()
    }

    // Commands

    /// Apply a command to the tracked selection
    ///
    /// Returns false when there is no selection in the document.
    pub fn apply(&mut self, command: Command) -> Result<bool> {
        let Some(selection) =
            dispatcher::apply(&mut self.document, self.selection.as_ref(), &command)?
        else {
            return Ok(false);
        };
        self.selection = Some(selection);

        if let Command::Color(color) = command {
            self.current_color = color.clone();
            self.events.emit(EditorEvent::ColorChanged(color));
        }
        self.after_mutation();
        self.events.emit(EditorEvent::FocusRequested);
        Ok(true)
    }

    /// Parse markup and insert it at the selection
    pub fn insert_fragment(&mut self, markup: &str) -> Result<bool> {
        let fragment = Fragment::parse(markup)?;
        self.apply(Command::InsertFragment(fragment))
    }

    /// Insert pasted markup
    pub fn paste(&mut self, markup: &str) -> Result<bool> {
        let inserted = self.insert_fragment(markup)?;
        if inserted {
            self.events.emit(EditorEvent::Activity(Activity::Paste));
        }
        Ok(inserted)
    }

    /// Type text at the selection
    pub fn insert_text(&mut self, text: &str) -> Result<bool> {
        let Some(selection) =
            dispatcher::insert_text(&mut self.document, self.selection.as_ref(), text)?
        else {
            return Ok(false);
        };
        self.selection = Some(selection);
        for _ in text.chars() {
            self.events.emit(EditorEvent::Activity(Activity::Keystroke));
        }
        self.after_mutation();
        Ok(true)
    }

    /// Remove the selected content
    pub fn delete_selection(&mut self) -> Result<bool> {
        let Some(selection) =
            dispatcher::delete_selection(&mut self.document, self.selection.as_ref())?
        else {
            return Ok(false);
        };
        self.selection = Some(selection);
        self.after_mutation();
        Ok(true)
    }

    // Tables

    /// Insert an empty `rows` x `cols` table at the selection
    pub fn insert_table(&mut self, rows: usize, cols: usize) -> Result<bool> {
        let fragment = table::build_table(rows, cols, &self.config.table)?;
        let inserted = self.apply(Command::InsertFragment(fragment))?;
        if inserted {
            self.events.notice(Notice::TableCreated { rows, cols });
        }
        Ok(inserted)
    }

    pub fn add_row(&mut self) -> Result<TableShape> {
        let table = self.table_in_scope()?;
        let result = table::add_row(&mut self.document, table);
        let shape = self.checked(result)?;
        self.events.notice(Notice::RowAdded);
        self.after_mutation();
        Ok(shape)
    }

    pub fn add_column(&mut self) -> Result<TableShape> {
        let table = self.table_in_scope()?;
        let result = table::add_column(&mut self.document, table, &self.config.table);
        let shape = self.checked(result)?;
        self.events.notice(Notice::ColumnAdded);
        self.after_mutation();
        Ok(shape)
    }

    pub fn delete_table(&mut self) -> Result<()> {
        let table = self.table_in_scope()?;
        let slot = table::delete_table(&mut self.document, table)?;
        self.selection = Some(Selection::caret(slot));
        self.events.notice(Notice::TableDeleted);
        self.after_mutation();
        Ok(())
    }

    fn table_in_scope(&self) -> Result<NodeId> {
        table::table_in_scope(&self.document, self.selection.as_ref()).inspect_err(|_| {
            self.events.notice(Notice::NoTableInScope);
        })
    }

    fn checked<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(EditorError::IrregularTable) = &result {
            self.events.notice(Notice::IrregularTable);
        }
        result
    }

    // Toolbar fragments

    pub fn insert_image(&mut self, bytes: &[u8], mime: &str) -> Result<bool> {
        let fragment = fragments::uploaded_image(bytes, mime)?;
        let inserted = self.apply(Command::InsertFragment(fragment))?;
        if inserted {
            self.events.notice(Notice::ImageInserted);
        }
        Ok(inserted)
    }

    pub fn insert_citation(&mut self) -> Result<bool> {
        let inserted = self.apply(Command::InsertFragment(fragments::citation()))?;
        if inserted {
            self.events.notice(Notice::CitationInserted);
        }
        Ok(inserted)
    }

    /// Insert the next footnote marker, numbered after those already present
    pub fn insert_footnote(&mut self) -> Result<bool> {
        let number = self.footnote_count() + 1;
        let inserted = self.apply(Command::InsertFragment(fragments::footnote(number)))?;
        if inserted {
            self.events.notice(Notice::FootnoteInserted(number));
        }
        Ok(inserted)
    }

    fn footnote_count(&self) -> usize {
        self.document
            .descendants(self.document.root())
            .into_iter()
            .filter(|id| self.document.has_tag(*id, tags::SUP))
            .filter(|id| {
                let text = self.document.rendered_text_of(*id);
                text.starts_with('[') && text.ends_with(']')
            })
            .count()
    }

    // Images

    pub fn pointer_down(&mut self, target: PointerTarget) {
        if let Some(selected) =
            self.images
                .pointer_down(&self.document, target, self.listeners.as_mut())
        {
            self.events.emit(EditorEvent::ImageSelectionChanged(selected));
        }
    }

    pub fn selected_image(&self) -> Option<NodeId> {
        self.images.selected()
    }

    pub fn begin_resize(&mut self, start_x: f32, start_width: f32) -> Result<()> {
        self.images
            .begin_resize(&self.document, self.listeners.as_mut(), start_x, start_width)
    }

    pub fn pointer_move(&mut self, x: f32) -> bool {
        self.images.pointer_move(&mut self.document, x)
    }

    pub fn pointer_up(&mut self) -> bool {
        self.images.pointer_up(self.listeners.as_mut())
    }

    pub fn is_resizing(&self) -> bool {
        self.images.is_resizing()
    }

    /// Listeners currently registered in the listener registry
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn align_image(&mut self, alignment: ImageAlignment) -> Result<()> {
        self.images.align(&mut self.document, alignment)?;
        self.events.notice(Notice::ImageAligned(alignment));
        Ok(())
    }

    pub fn reset_image(&mut self) -> Result<()> {
        self.images.reset(&mut self.document)?;
        self.events.notice(Notice::ImageReset);
        Ok(())
    }

    // Private helpers

    fn after_mutation(&mut self) {
        if self.images.sync(&self.document, self.listeners.as_mut()) {
            self.events.emit(EditorEvent::ImageSelectionChanged(None));
        }
        self.recount();
    }

    fn recount(&mut self) {
        if let Some(count) = self.words.recompute(&self.document) {
            self.events.emit(EditorEvent::WordCountChanged(count));
        }
    }
}

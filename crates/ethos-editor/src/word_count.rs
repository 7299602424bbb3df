//! Word counting over the rendered text

use ethos_core::Document;

/// Number of whitespace-separated tokens in `text`
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Word count of everything a reader would see in `doc`
pub fn document_words(doc: &Document) -> usize {
    count_words(&doc.rendered_text())
}

/// Keeps the last computed count so callers can tell when it changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordCounter {
    count: usize,
}

impl WordCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Recount from the current tree, returning the new count if it changed
    pub fn recompute(&mut self, doc: &Document) -> Option<usize> {
        let count = document_words(doc);
        if count == self.count {
            return None;
        }
        self.count = count;
        Some(count)
    }
}

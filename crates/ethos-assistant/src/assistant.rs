//! The assistant: generator calls with user-facing failure handling

use ethos_core::Mode;
use ethos_editor::Editor;
use tracing::{debug, warn};

use crate::generator::Generator;
use crate::prompt::DraftRequest;

/// Reply shown when the generator cannot be reached
pub const FALLBACK_REPLY: &str =
    "I'm having trouble reaching my neural core right now. Please try again.";

/// Reply shown when the generator answers with nothing
pub const THINKING_REPLY: &str = "Thinking...";

/// Result of a draft request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftOutcome {
    /// Generated markup, ready to replace the document
    Content(String),
    /// The generator failed or returned nothing, with the reply to show instead
    Failed(String),
}

impl DraftOutcome {
    /// Replace the editor's tree with the draft
    ///
    /// The whole tree is replaced, so edits made while the draft was being
    /// generated are lost. A failed draft leaves the tree untouched. Returns
    /// whether the tree was replaced.
    pub fn apply_to(self, editor: &mut Editor) -> bool {
        match self {
            DraftOutcome::Content(content) => {
                editor.replace_content(&content);
                true
            }
            DraftOutcome::Failed(_) => false,
        }
    }
}

pub struct Assistant<G: Generator> {
    generator: G,
}

impl<G: Generator> Assistant<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Answer a chat message
    pub async fn ask(&self, message: &str, mode: Mode) -> String {
        match self.generator.generate(message, mode).await {
            Ok(reply) if reply.trim().is_empty() => THINKING_REPLY.to_string(),
            Ok(reply) => reply,
            Err(e) => {
                warn!("Generator failed: {}", e);
                FALLBACK_REPLY.to_string()
            }
        }
    }

    /// Generate a full document draft
    pub async fn draft(&self, request: &DraftRequest, mode: Mode) -> DraftOutcome {
        let prompt = request.prompt();
        debug!("Requesting {} draft ({} chars)", mode, prompt.len());
        match self.generator.generate(&prompt, mode).await {
            Ok(content) if content.trim().is_empty() => {
                warn!("Generator returned an empty draft");
                DraftOutcome::Failed(FALLBACK_REPLY.to_string())
            }
            Ok(content) => DraftOutcome::Content(content),
            Err(e) => {
                warn!("Draft generation failed: {}", e);
                DraftOutcome::Failed(FALLBACK_REPLY.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GeneratorError, Result};
    use crate::prompt::{ArticleDetails, CvDetails};
    use async_trait::async_trait;
    use ethos_core::{Position, Selection};
    use ethos_editor::EditorConfig;
    use ethos_store::MemoryStore;
    use std::sync::Mutex;

    /// Replies with a canned answer and records what it was asked
    struct Scripted {
        reply: Option<String>,
        asked: Mutex<Vec<(String, Mode)>>,
    }

    impl Scripted {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                asked: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                asked: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Generator for Scripted {
        async fn generate(&self, prompt: &str, mode: Mode) -> Result<String> {
            self.asked.lock().unwrap().push((prompt.to_string(), mode));
            self.reply
                .clone()
                .ok_or_else(|| GeneratorError::Unavailable("offline".to_string()))
        }
    }

    fn editor_with(markup: &str) -> Editor {
        let (mut editor, _stream) = Editor::new(EditorConfig::default(), Box::new(MemoryStore::new()));
        editor.replace_content(markup);
        editor
    }

    #[tokio::test]
    async fn test_ask_passes_mode() {
        let assistant = Assistant::new(Scripted::replying("Tighten the thesis."));
        let reply = assistant.ask("Review my intro", Mode::Academic).await;

        assert_eq!(reply, "Tighten the thesis.");
        let asked = assistant.generator().asked.lock().unwrap();
        assert_eq!(asked[0], ("Review my intro".to_string(), Mode::Academic));
    }

    #[tokio::test]
    async fn test_ask_failure_falls_back() {
        let assistant = Assistant::new(Scripted::failing());
        assert_eq!(assistant.ask("hello", Mode::None).await, FALLBACK_REPLY);

        let assistant = Assistant::new(Scripted::replying("  "));
        assert_eq!(assistant.ask("hello", Mode::None).await, THINKING_REPLY);
    }

    #[tokio::test]
    async fn test_failed_draft_leaves_tree() {
        let assistant = Assistant::new(Scripted::failing());
        let mut editor = editor_with("<p>my notes</p>");

        let outcome = assistant
            .draft(&DraftRequest::Cv(CvDetails::default()), Mode::Cv)
            .await;
        assert_eq!(outcome, DraftOutcome::Failed(FALLBACK_REPLY.to_string()));
        assert!(!outcome.apply_to(&mut editor));
        assert_eq!(editor.get_html(), "<p>my notes</p>");
    }

    #[tokio::test]
    async fn test_draft_replaces_interim_edits() {
        let assistant = Assistant::new(Scripted::replying("<h2>Draft</h2><p>Body text</p>"));
        let mut editor = editor_with("<p>start</p>");
        let request = DraftRequest::Article(ArticleDetails {
            title: "Draft".to_string(),
            context: "Testing".to_string(),
            tone: "formal".to_string(),
        });

        let pending = assistant.draft(&request, Mode::Academic);

        // Typed while the draft is in flight
        let doc = editor.document();
        let text = doc
            .descendants(doc.root())
            .into_iter()
            .find(|id| doc.is_text(*id))
            .unwrap();
        editor.set_selection(Some(Selection::caret(Position::new(text, 5))));
        editor.insert_text(" typed").unwrap();
        assert_eq!(editor.get_html(), "<p>start typed</p>");

        assert!(pending.await.apply_to(&mut editor));
        assert_eq!(editor.get_html(), "<h2>Draft</h2><p>Body text</p>");
        assert_eq!(editor.word_count(), 3);
        assert!(editor.selection().is_none());
    }
}

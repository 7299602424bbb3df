//! Draft prompts for the automation panel

use ethos_core::Mode;
use serde::{Deserialize, Serialize};

/// Details collected for a generated CV
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvDetails {
    pub name: String,
    pub title: String,
    pub skills: String,
    pub experience: String,
}

/// Details collected for a generated article draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDetails {
    pub title: String,
    pub context: String,
    pub tone: String,
}

impl Default for ArticleDetails {
    fn default() -> Self {
        Self {
            title: String::new(),
            context: String::new(),
            tone: "academic".to_string(),
        }
    }
}

/// A request for a full document draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DraftRequest {
    Cv(CvDetails),
    Article(ArticleDetails),
}

impl DraftRequest {
    /// The request a mode's automation panel collects
    ///
    /// CV mode drafts a CV, every other mode drafts an article.
    pub fn blank_for(mode: Mode) -> Self {
        match mode {
            Mode::Cv => DraftRequest::Cv(CvDetails::default()),
            _ => DraftRequest::Article(ArticleDetails::default()),
        }
    }

    pub fn prompt(&self) -> String {
        match self {
            DraftRequest::Cv(cv) => format!(
                "Create professional CV content from the details below. Use HTML with <div> \
                 and <h3> elements in a modern structure.\n\
                 Name: {}\n\
                 Title: {}\n\
                 Skills: {}\n\
                 Experience summary: {}\n\
                 Note: return only the content, without an <html> element.",
                cv.name, cv.title, cv.skills, cv.experience
            ),
            DraftRequest::Article(article) => format!(
                "Write an article draft in a {} tone from the details below. Use HTML \
                 headings (<h2>) and paragraphs (<p>).\n\
                 Title: {}\n\
                 Content/context: {}\n\
                 Note: leave [Source] markers where academic citations belong. Return only \
                 the content.",
                article.tone, article.title, article.context
            ),
        }
    }
}

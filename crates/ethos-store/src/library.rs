//! The user's library of custom templates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::store::SnapshotStore;

/// Key the whole library is stored under, as one JSON array
pub const LIBRARY_KEY: &str = "ethos_custom_templates";

/// A template the user saved from the template picker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomTemplate {
    pub id: Uuid,
    pub title: String,
    pub font: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Ordered list of custom templates, newest last
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateLibrary {
    templates: Vec<CustomTemplate>,
}

impl TemplateLibrary {
    /// Load the library, returning an empty one if nothing is stored yet
    pub fn load(store: &dyn SnapshotStore) -> Result<Self> {
        let templates = match store.get(LIBRARY_KEY)? {
            Some(json) => serde_json::from_str(&json)?,
            None => Vec::new(),
        };
        Ok(Self { templates })
    }

    pub fn save(&self, store: &mut dyn SnapshotStore) -> Result<()> {
        store.set(LIBRARY_KEY, &serde_json::to_string(&self.templates)?)
    }

    /// Add a template; a blank title becomes "Untitled template"
    pub fn add(
        &mut self,
        title: &str,
        font: impl Into<String>,
        description: impl Into<String>,
    ) -> &CustomTemplate {
        let title = match title.trim() {
            "" => "Untitled template".to_string(),
            trimmed => trimmed.to_string(),
        };
        info!("Added custom template '{}'", title);
        self.templates.push(CustomTemplate {
            id: Uuid::new_v4(),
            title,
            font: font.into(),
            description: description.into(),
            created_at: Utc::now(),
        });
        &self.templates[self.templates.len() - 1]
    }

    pub fn remove(&mut self, id: Uuid) -> Option<CustomTemplate> {
        let index = self.templates.iter().position(|t| t.id == id)?;
        Some(self.templates.remove(index))
    }

    pub fn get(&self, id: Uuid) -> Option<&CustomTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_library_persists_as_json() {
        let mut store = MemoryStore::new();
        let mut library = TemplateLibrary::load(&store).unwrap();
        assert!(library.is_empty());

        let id = library.add("  Lab report ", "Lora", "Weekly lab write-up").id;
        library.add("", "Inter", "");
        library.save(&mut store).unwrap();

        let raw = store.get(LIBRARY_KEY).unwrap().unwrap();
        assert!(raw.starts_with('['));

        let loaded = TemplateLibrary::load(&store).unwrap();
        assert_eq!(loaded, library);
        assert_eq!(loaded.get(id).unwrap().title, "Lab report");
        assert_eq!(
            loaded.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(),
            vec!["Lab report", "Untitled template"]
        );
    }

    #[test]
    fn test_remove_template() {
        let mut library = TemplateLibrary::default();
        let id = library.add("Essay", "Inter", "").id;
        assert!(library.remove(id).is_some());
        assert!(library.remove(id).is_none());
        assert!(library.is_empty());
    }
}

//! Editor configuration

use std::path::Path;

use ethos_store::DEFAULT_NAMESPACE;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;

/// Settings for an editor session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Styling applied to newly built tables
    pub table: TableStyle,
    /// Text color reported before any color command is applied
    pub default_color: String,
    /// Narrowest width, in px, a resize drag can produce
    pub min_image_width: f32,
    /// Prefix for persisted snapshot keys
    pub storage_namespace: String,
    /// Capacity of the editor event channel
    pub event_capacity: usize,
}

/// Table styling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableStyle {
    /// Border of the table and of every cell
    pub border: String,
    /// Padding inside every cell
    pub cell_padding: String,
    /// Outer margin of the table
    pub margin: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            table: TableStyle::default(),
            default_color: "#000000".to_string(),
            min_image_width: 16.0,
            storage_namespace: DEFAULT_NAMESPACE.to_string(),
            event_capacity: 256,
        }
    }
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            border: "1px solid #cbd5e1".to_string(),
            cell_padding: "12px".to_string(),
            margin: "15px 0".to_string(),
        }
    }
}

impl EditorConfig {
    /// Load configuration from a JSON file, falling back to defaults when
    /// the file does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No editor config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        info!("Saved editor config to: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = EditorConfig::load(dir.path().join("editor.json")).unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.storage_namespace, "ethos_content_");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("editor.json");
        std::fs::write(&path, r#"{ "min_image_width": 40, "table": { "cell_padding": "4px" } }"#)
            .unwrap();

        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.min_image_width, 40.0);
        assert_eq!(config.table.cell_padding, "4px");
        assert_eq!(config.table.border, "1px solid #cbd5e1");
        assert_eq!(config.default_color, "#000000");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("editor.json");
        let config = EditorConfig {
            event_capacity: 8,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(EditorConfig::load(&path).unwrap(), config);
    }
}

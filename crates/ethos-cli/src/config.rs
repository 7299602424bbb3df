//! Where the CLI keeps its data

use std::path::PathBuf;

use anyhow::{Context, Result};
use ethos_editor::EditorConfig;
use ethos_store::LocalStore;
use tracing::debug;

/// Environment variable overriding the data directory
pub const DATA_DIR_VAR: &str = "ETHOS_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
}

impl StoreConfig {
    /// `$ETHOS_DATA_DIR`, else the platform data directory
    pub fn from_env() -> Result<Self> {
        if let Some(dir) = std::env::var_os(DATA_DIR_VAR) {
            return Ok(Self::from_dir(dir));
        }
        let base = dirs::data_dir().context("No data directory on this platform")?;
        Ok(Self::from_dir(base.join("ethos")))
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: dir.into(),
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("store")
    }

    pub fn editor_config_path(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    pub fn open_store(&self) -> Result<LocalStore> {
        debug!("Using data directory {:?}", self.data_dir);
        let store = LocalStore::open_or_create(self.store_path(), "Ethos")
            .with_context(|| format!("Failed to open store in {}", self.data_dir.display()))?;
        Ok(store)
    }

    pub fn editor_config(&self) -> Result<EditorConfig> {
        Ok(EditorConfig::load(self.editor_config_path())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_under_data_dir() {
        let config = StoreConfig::from_dir("/tmp/ethos-data");
        assert_eq!(config.store_path(), PathBuf::from("/tmp/ethos-data/store"));
        assert_eq!(
            config.editor_config_path(),
            PathBuf::from("/tmp/ethos-data/config.json")
        );
    }

    #[test]
    fn test_open_store_creates_it() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::from_dir(dir.path());

        let store = config.open_store().unwrap();
        assert_eq!(store.manifest().name, "Ethos");
        assert!(config.store_path().join("manifest.json").exists());

        let reopened = config.open_store().unwrap();
        assert_eq!(reopened.manifest().created_at, store.manifest().created_at);
        assert_eq!(config.editor_config().unwrap(), EditorConfig::default());
    }
}

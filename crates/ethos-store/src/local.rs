//! Local file-based store implementation

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::store::SnapshotStore;

/// Metadata written next to the stored entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreManifest {
    /// Schema version for forward compatibility
    pub version: u32,

    /// Store name
    pub name: String,

    /// When the store was created
    pub created_at: DateTime<Utc>,

    /// When an entry was last written or removed
    pub modified_at: DateTime<Utc>,
}

impl StoreManifest {
    /// Current schema version
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            version: Self::CURRENT_VERSION,
            name: name.into(),
            created_at: now,
            modified_at: now,
        }
    }
}

/// A snapshot store backed by a directory
///
/// Directory structure:
/// ```text
/// ethos/
/// ├── manifest.json        # Store metadata
/// └── entries/
///     ├── {key}.snapshot   # One file per key, raw value
///     └── ...
/// ```
///
/// Keys made only of ASCII letters, digits, `_` and `-` are used as file
/// names directly; anything else is base64-encoded behind a `b64.` prefix.
#[derive(Debug)]
pub struct LocalStore {
    /// Path to the store directory
    pub path: PathBuf,

    manifest: StoreManifest,
}

impl LocalStore {
    const ENTRIES_DIR: &'static str = "entries";
    const MANIFEST_FILE: &'static str = "manifest.json";
    const ENTRY_EXT: &'static str = "snapshot";
    const ENCODED_PREFIX: &'static str = "b64.";

    /// Create a new local store at the given path
    pub fn create(path: impl AsRef<Path>, name: impl Into<String>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let name = name.into();

        if path.join(Self::MANIFEST_FILE).exists() {
            return Err(StoreError::StoreExists(path.display().to_string()));
        }

        fs::create_dir_all(path.join(Self::ENTRIES_DIR))?;

        let store = Self {
            path,
            manifest: StoreManifest::new(&name),
        };
        store.write_manifest()?;

        info!("Created local store '{}' at {:?}", name, store.path);
        Ok(store)
    }

    /// Open an existing local store
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let manifest_path = path.join(Self::MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(StoreError::InvalidPath(format!(
                "No manifest found at {}",
                manifest_path.display()
            )));
        }

        let manifest_json = fs::read_to_string(&manifest_path)?;
        let manifest: StoreManifest = serde_json::from_str(&manifest_json)?;

        info!("Opened local store '{}' from {:?}", manifest.name, path);
        Ok(Self { path, manifest })
    }

    /// Open the store at `path`, creating it first if it does not exist
    pub fn open_or_create(path: impl AsRef<Path>, name: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        if path.join(Self::MANIFEST_FILE).exists() {
            Self::open(path)
        } else {
            Self::create(path, name)
        }
    }

    pub fn manifest(&self) -> &StoreManifest {
        &self.manifest
    }

    // Private helpers

    fn entry_path(&self, key: &str) -> PathBuf {
        self.path
            .join(Self::ENTRIES_DIR)
            .join(format!("{}.{}", Self::file_stem(key), Self::ENTRY_EXT))
    }

    fn file_stem(key: &str) -> String {
        let plain = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if plain {
            key.to_string()
        } else {
            format!("{}{}", Self::ENCODED_PREFIX, URL_SAFE_NO_PAD.encode(key))
        }
    }

    fn key_from_stem(stem: &str) -> Option<String> {
        match stem.strip_prefix(Self::ENCODED_PREFIX) {
            Some(encoded) => URL_SAFE_NO_PAD
                .decode(encoded)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok()),
            None => Some(stem.to_string()),
        }
    }

    fn touch(&mut self) -> Result<()> {
        self.manifest.modified_at = Utc::now();
        self.write_manifest()
    }

    fn write_manifest(&self) -> Result<()> {
        let manifest_json = serde_json::to_string_pretty(&self.manifest)?;
        fs::write(self.path.join(Self::MANIFEST_FILE), manifest_json)?;
        Ok(())
    }
}

impl SnapshotStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let value = fs::read_to_string(&path)?;
        debug!("Loaded entry '{}' ({} bytes)", key, value.len());
        Ok(Some(value))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::write(self.entry_path(key), value)?;
        self.touch()?;
        debug!("Saved entry '{}' ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        self.touch()?;
        debug!("Removed entry '{}'", key);
        Ok(true)
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(self.path.join(Self::ENTRIES_DIR))? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == Self::ENTRY_EXT) {
                if let Some(key) = path
                    .file_stem()
                    .and_then(|stem| Self::key_from_stem(&stem.to_string_lossy()))
                {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_store() {
        let dir = tempdir().unwrap();
        let store_path = dir.path().join("ethos");

        let store = LocalStore::create(&store_path, "Test Store").unwrap();
        assert!(store_path.join("manifest.json").exists());
        assert!(store_path.join("entries").exists());
        assert_eq!(store.manifest().name, "Test Store");

        assert!(matches!(
            LocalStore::create(&store_path, "Again"),
            Err(StoreError::StoreExists(_))
        ));
    }

    #[test]
    fn test_open_missing_store() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            LocalStore::open(dir.path().join("nothing")),
            Err(StoreError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = tempdir().unwrap();
        let store_path = dir.path().join("ethos");

        let mut store = LocalStore::create(&store_path, "Test Store").unwrap();
        store.set("ethos_content_cv_modern", "<p>Çağrı</p>").unwrap();
        store.set("odd key/with:chars", "{}").unwrap();
        drop(store);

        let store = LocalStore::open_or_create(&store_path, "ignored").unwrap();
        assert_eq!(store.manifest().name, "Test Store");
        assert_eq!(
            store.get("ethos_content_cv_modern").unwrap().as_deref(),
            Some("<p>Çağrı</p>")
        );
        assert_eq!(store.get("odd key/with:chars").unwrap().as_deref(), Some("{}"));

        let mut keys = store.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["ethos_content_cv_modern", "odd key/with:chars"]);
    }

    #[test]
    fn test_remove_entry() {
        let dir = tempdir().unwrap();
        let mut store = LocalStore::create(dir.path().join("ethos"), "Test Store").unwrap();

        store.set("k", "v").unwrap();
        assert!(store.remove("k").unwrap());
        assert!(!store.remove("k").unwrap());
        assert_eq!(store.get("k").unwrap(), None);
    }
}

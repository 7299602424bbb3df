//! Saving and loading document snapshots by template key

use ethos_core::TemplateKey;
use tracing::debug;

use crate::error::Result;
use crate::store::SnapshotStore;

/// Namespace every snapshot key is stored under
pub const DEFAULT_NAMESPACE: &str = "ethos_content_";

/// Maps template keys onto a [`SnapshotStore`]
///
/// The stored key is `{namespace}{mode}_{variant-or-empty}`, so the CV in
/// the modern layout lands under `ethos_content_cv_modern`.
pub struct Persistence<S: SnapshotStore> {
    store: S,
    namespace: String,
}

impl<S: SnapshotStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self::with_namespace(store, DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(store: S, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// Full storage key for a template key
    pub fn storage_key(&self, key: &TemplateKey) -> String {
        format!("{}{}", self.namespace, key.storage_key())
    }

    /// Store a snapshot, overwriting whatever was saved for `key`
    pub fn save(&mut self, key: &TemplateKey, snapshot: &str) -> Result<()> {
        let storage_key = self.storage_key(key);
        self.store.set(&storage_key, snapshot)?;
        debug!("Saved snapshot for {} under '{}'", key, storage_key);
        Ok(())
    }

    /// The last snapshot saved for `key`, if any
    pub fn load(&self, key: &TemplateKey) -> Result<Option<String>> {
        self.store.get(&self.storage_key(key))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use ethos_core::{CvLayout, Mode};

    #[test]
    fn test_keys_are_namespaced() {
        let persistence = Persistence::new(MemoryStore::new());
        assert_eq!(
            persistence.storage_key(&TemplateKey::cv(CvLayout::Modern)),
            "ethos_content_cv_modern"
        );
        assert_eq!(
            persistence.storage_key(&TemplateKey::new(Mode::Academic)),
            "ethos_content_academic_"
        );
    }

    #[test]
    fn test_save_load_exact() {
        let mut persistence = Persistence::new(MemoryStore::new());
        let key = TemplateKey::new(Mode::Report);
        let snapshot = "<p style=\"color: #666\">Özet &amp; sonuç</p>";

        assert_eq!(persistence.load(&key).unwrap(), None);
        persistence.save(&key, snapshot).unwrap();
        assert_eq!(persistence.load(&key).unwrap().as_deref(), Some(snapshot));
    }

    #[test]
    fn test_variants_are_independent() {
        let mut persistence = Persistence::new(MemoryStore::new());
        persistence
            .save(&TemplateKey::cv(CvLayout::Modern), "<p>modern</p>")
            .unwrap();

        assert_eq!(persistence.load(&TemplateKey::cv(CvLayout::Classic)).unwrap(), None);
        assert_eq!(persistence.store().len(), 1);
    }
}

//! In-memory fragment store with built-in fragments.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, RwLock},
};

use tracing::debug;

use tessera_core::{
    application::{ApplicationError, ports::FragmentStore},
    domain::{DomainValidator as validator, Fragment},
    error::{TesseraError, TesseraResult},
};

use crate::{builtin_fragments, fragment_loader::FilesystemFragmentLoader};

/// Thread-safe in-memory fragment store.
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<RwLock<HashMap<String, Fragment>>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a store with built-in fragments loaded.
    pub fn with_builtin() -> TesseraResult<Self> {
        let store = Self::new();
        store.load_builtin()?;
        Ok(store)
    }

    /// Load built-in fragments.
    pub fn load_builtin(&self) -> TesseraResult<()> {
        for fragment in builtin_fragments::all_fragments()? {
            self.insert(fragment)?;
        }
        Ok(())
    }

    /// Load every fragment file below `dir`, replacing same-named entries.
    /// Returns how many fragments were loaded.
    pub fn load_dir(&self, dir: &Path) -> TesseraResult<usize> {
        let fragments = FilesystemFragmentLoader::new(dir).load_all()?;
        let count = fragments.len();
        for fragment in fragments {
            self.insert(fragment)?;
        }
        debug!(dir = %dir.display(), count, "fragments loaded into store");
        Ok(count)
    }

    /// Get the number of fragments.
    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.len()).unwrap_or(0)
    }

    /// Check if store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all fragments.
    pub fn clear(&self) -> TesseraResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;
        inner.clear();
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentStore for InMemoryStore {
    fn get(&self, name: &str) -> TesseraResult<Fragment> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;

        inner.get(name).cloned().ok_or_else(|| {
            ApplicationError::FragmentNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }

    fn list(&self) -> TesseraResult<Vec<Fragment>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;

        let mut fragments: Vec<Fragment> = inner.values().cloned().collect();
        fragments.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(fragments)
    }

    fn insert(&self, fragment: Fragment) -> TesseraResult<()> {
        // Validate before insertion
        validator::validate_fragment(&fragment).map_err(TesseraError::Domain)?;

        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;

        inner.insert(fragment.name().to_string(), fragment);
        Ok(())
    }

    fn remove(&self, name: &str) -> TesseraResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?;

        inner.remove(name).map(|_| ()).ok_or_else(|| {
            ApplicationError::FragmentNotFound {
                name: name.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frag(name: &str) -> Fragment {
        Fragment::from_json(name, json!({"root": true})).unwrap()
    }

    #[test]
    fn insert_get_and_remove() {
        let store = InMemoryStore::new();
        store.insert(frag("lint/custom")).unwrap();
        assert_eq!(store.get("lint/custom").unwrap().name(), "lint/custom");

        store.remove("lint/custom").unwrap();
        assert!(matches!(
            store.get("lint/custom"),
            Err(TesseraError::Application(ApplicationError::FragmentNotFound { .. }))
        ));
        assert!(store.remove("lint/custom").is_err());
    }

    #[test]
    fn list_is_sorted_by_name() {
        let store = InMemoryStore::new();
        for name in ["b", "c/x", "a"] {
            store.insert(frag(name)).unwrap();
        }
        let names: Vec<String> = store
            .list()
            .unwrap()
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        assert_eq!(names, ["a", "b", "c/x"]);
    }

    #[test]
    fn insert_rejects_invalid_names() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.insert(frag("../escape")),
            Err(TesseraError::Domain(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn builtin_fragments_are_available() {
        let store = InMemoryStore::with_builtin().unwrap();
        assert!(store.get("lint/quality").is_ok());
        assert!(store.get("lint/formatting").is_ok());
        assert_eq!(store.len(), builtin_fragments::all_fragments().unwrap().len());
    }

    #[test]
    fn clones_share_storage() {
        let store = InMemoryStore::new();
        let other = store.clone();
        store.insert(frag("shared")).unwrap();
        assert!(other.get("shared").is_ok());
        other.clear().unwrap();
        assert!(store.is_empty());
    }
}

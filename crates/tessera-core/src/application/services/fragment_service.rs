//! Fragment Service - fragment management operations.
//!
//! Handles fragment CRUD and resolution of ordered name lists into the
//! fragment lists assemblers consume.

use tracing::{debug, instrument};

use crate::{
    application::ports::FragmentStore,
    domain::{DomainValidator as validator, Fragment},
    error::TesseraResult,
};

/// Information about a fragment for display purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentInfo {
    pub name: String,
    pub keys: Vec<String>,
}

impl From<&Fragment> for FragmentInfo {
    fn from(fragment: &Fragment) -> Self {
        Self {
            name: fragment.name().to_string(),
            keys: fragment.document().root().keys().cloned().collect(),
        }
    }
}

/// Service for fragment operations.
pub struct FragmentService {
    store: Box<dyn FragmentStore>,
}

impl FragmentService {
    /// Create a new fragment service.
    pub fn new(store: Box<dyn FragmentStore>) -> Self {
        Self { store }
    }

    /// Get a fragment by name.
    pub fn get(&self, name: &str) -> TesseraResult<Fragment> {
        self.store.get(name)
    }

    /// Add or update a fragment.
    pub fn save(&self, fragment: Fragment) -> TesseraResult<()> {
        validator::validate_fragment(&fragment)?;
        self.store.insert(fragment)
    }

    /// Remove a fragment.
    pub fn remove(&self, name: &str) -> TesseraResult<()> {
        self.store.remove(name)
    }

    /// List all fragments.
    pub fn list(&self) -> TesseraResult<Vec<FragmentInfo>> {
        Ok(self.store.list()?.iter().map(FragmentInfo::from).collect())
    }

    /// Resolve names to fragments, keeping the caller's order.
    ///
    /// Fails on the first unknown name; a name may appear only once.
    #[instrument(skip(self), fields(count = names.len()))]
    pub fn resolve(&self, names: &[String]) -> TesseraResult<Vec<Fragment>> {
        let fragments = names
            .iter()
            .map(|name| self.store.get(name))
            .collect::<TesseraResult<Vec<_>>>()?;
        validator::validate_fragment_list(&fragments)?;
        debug!(resolved = fragments.len(), "fragments resolved");
        Ok(fragments)
    }
}

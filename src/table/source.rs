//! Table loaders.
//!
//! `lookup_table <path>` names a data source; turning that source into a
//! [`LookupTable`] is the job of a [`TableLoader`] supplied by the host.

use ahash::AHashMap;
use std::cell::Cell;

use super::LookupTable;
use crate::error::BuildError;

/// Builds a lookup table from the source named in the configuration.
pub trait TableLoader {
    /// Load and build the table named by `path`.
    fn load(&self, path: &str) -> Result<LookupTable, BuildError>;
}

impl<F> TableLoader for F
where
    F: Fn(&str) -> Result<LookupTable, BuildError>,
{
    fn load(&self, path: &str) -> Result<LookupTable, BuildError> {
        self(path)
    }
}

/// Loader serving named entry sets held in memory.
///
/// # Examples
/// ```
/// use k2bot::{MemoryLoader, TableLoader};
///
/// let mut loader = MemoryLoader::new();
/// loader.add("bots", [("Googlebot", "search-engine")]);
///
/// let table = loader.load("bots").unwrap();
/// assert_eq!(table.len(), 1);
/// assert!(loader.load("other").is_err());
/// ```
#[derive(Debug, Default)]
pub struct MemoryLoader {
    sources: AHashMap<String, Vec<(Vec<u8>, Vec<u8>)>>,
    loads: Cell<usize>,
}

impl MemoryLoader {
    /// Create a loader with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the entries served under `path`.
    pub fn add<I, K, V>(&mut self, path: impl Into<String>, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_vec(), v.as_ref().to_vec()))
            .collect();
        self.sources.insert(path.into(), entries);
        self
    }

    /// Get the number of tables built so far.
    pub fn loads(&self) -> usize {
        self.loads.get()
    }
}

impl TableLoader for MemoryLoader {
    fn load(&self, path: &str) -> Result<LookupTable, BuildError> {
        let entries = self
            .sources
            .get(path)
            .ok_or_else(|| BuildError::NotFound(path.to_string()))?;

        self.loads.set(self.loads.get() + 1);

        let table = LookupTable::from_entries(entries.iter().map(|(k, v)| (k, v)));
        log::debug!("Loaded table {:?}: {} entries", path, table.len());
        Ok(table)
    }
}

//! Visited-URL ledger
//!
//! The ledger is the set of item ids already processed by this or any earlier
//! run. It only ever grows: ids are added after a fetch attempt is committed
//! (success or permanent failure) and never removed.

use crate::storage::{read_json_soft, write_json_atomic, StorageResult};
use std::collections::HashSet;
use std::path::Path;

/// Set of item ids already processed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    ids: HashSet<String>,
}

impl Ledger {
    /// Creates an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the id was already processed
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Marks an id as processed
    ///
    /// Idempotent. Returns true if the id was not present before.
    pub fn add(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterates over the ids in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Loads a ledger from a JSON array of strings
    ///
    /// Never fails: a missing, unreadable or corrupt file yields an empty
    /// ledger, so a damaged ledger costs refetches but never aborts a run.
    pub fn load(path: &Path) -> Self {
        match read_json_soft::<Vec<String>>(path) {
            Some(ids) => {
                let ledger: Self = ids.into_iter().collect();
                tracing::info!(
                    "Loaded {} visited ids from {}",
                    ledger.len(),
                    path.display()
                );
                ledger
            }
            None => {
                tracing::info!("Starting with an empty ledger ({})", path.display());
                Self::new()
            }
        }
    }

    /// Persists the ledger as a JSON array of strings, replacing the file
    ///
    /// Ids are written sorted so consecutive saves diff cleanly.
    pub fn save(&self, path: &Path) -> StorageResult<()> {
        let mut ids: Vec<&str> = self.iter().collect();
        ids.sort_unstable();
        write_json_atomic(path, &ids)?;
        tracing::debug!("Saved {} visited ids to {}", ids.len(), path.display());
        Ok(())
    }
}

impl FromIterator<String> for Ledger {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl Extend<String> for Ledger {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.ids.extend(iter);
    }
}

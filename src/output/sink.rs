//! Result sink
//!
//! The result file is a pretty-printed JSON array of [`ExtractedRecord`]s,
//! replaced wholesale on every save.

use crate::extract::ExtractedRecord;
use crate::output::OutputResult;
use crate::storage::{read_json_soft, write_json_atomic};
use std::collections::HashSet;
use std::path::Path;

/// Keeps the first record per id, preserving input order
pub fn dedupe(records: Vec<ExtractedRecord>) -> Vec<ExtractedRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.id.clone()))
        .collect()
}

/// Writes the records to `path`, replacing any previous file
///
/// The write goes through a temporary file, so a failure leaves the previous
/// result file intact.
pub fn persist(records: &[ExtractedRecord], path: &Path) -> OutputResult<()> {
    write_json_atomic(path, records)?;
    tracing::info!("Saved {} records to {}", records.len(), path.display());
    Ok(())
}

/// Loads records written by an earlier run
///
/// A missing or unreadable file yields no records.
pub fn load_records(path: &Path) -> Vec<ExtractedRecord> {
    match read_json_soft::<Vec<ExtractedRecord>>(path) {
        Some(records) => {
            tracing::info!(
                "Loaded {} previous records from {}",
                records.len(),
                path.display()
            );
            records
        }
        None => Vec::new(),
    }
}

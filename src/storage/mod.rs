//! Storage module for persisting crawl state
//!
//! This module handles the on-disk state that makes reruns incremental:
//! - The visited-URL ledger (a JSON array of item ids)
//! - Atomic file replacement shared with the result sink

mod atomic;
mod ledger;

pub use atomic::{read_json_soft, write_atomic, write_json_atomic};
pub use ledger::Ledger;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

//! Output module for crawl results and reports
//!
//! This module handles:
//! - The result sink: de-duplicating and persisting extracted records
//! - Run and dataset statistics
//! - Markdown summary export

mod markdown;
mod sink;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use sink::{dedupe, load_records, persist};
pub use stats::{
    print_dataset_statistics, print_run_statistics, DatasetStatistics, RunStats, SourceTally,
};

use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur during output generation
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

//! Reel-Crawl: a resumable, polite movie catalogue crawler
//!
//! This crate enumerates item pages from paginated listings and tag-search
//! endpoints, fetches every item exactly once across runs (tracked by a persisted
//! visited ledger), extracts a structured record from each page, and accumulates
//! the records into a de-duplicated JSON result set.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod frontier;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Reel-Crawl operations
///
/// Only configuration and persistence problems surface here. Per-item transport
/// failures, decode failures and missing fields are recovered below the
/// orchestrator and never become a `ReelError`.
#[derive(Debug, Error)]
pub enum ReelError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Reel-Crawl operations
pub type Result<T> = std::result::Result<T, ReelError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport};
pub use extract::{ExtractedRecord, ExtractionPipeline};
pub use frontier::{Cursor, ItemReference, SourceDescriptor};
pub use state::ItemState;
pub use storage::Ledger;

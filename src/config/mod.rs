//! Configuration module for Reel-Crawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use reel_crawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("reel-crawl.toml")).unwrap();
//! println!("Batch size: {}", config.pacing.batch_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ClientConfig, Config, ListingConfig, OutputConfig, PacingConfig, SiteConfig, TagQueryConfig,
    DEFAULT_TAGS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

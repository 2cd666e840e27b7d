use crate::config::types::{
    ClientConfig, Config, ListingConfig, OutputConfig, PacingConfig, SiteConfig, TagQueryConfig,
};
use crate::frontier::SourceDescriptor;
use crate::ConfigError;
use std::path::Path;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_client_config(&config.client)?;
    validate_pacing_config(&config.pacing)?;
    validate_output_config(&config.output)?;
    validate_listing_config(&config.listing)?;
    validate_tag_query_config(&config.tag_query)?;
    validate_sources(&config.sources)?;
    Ok(())
}

/// Validates the origin site layout
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if !config.search_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "search_path must start with '/', got '{}'",
            config.search_path
        )));
    }

    if config.item_pattern.trim().is_empty() {
        return Err(ConfigError::Validation(
            "item_pattern cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the request identity
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_ms < 1000 {
        return Err(ConfigError::Validation(format!(
            "timeout_ms must be >= 1000ms, got {}ms",
            config.timeout_ms
        )));
    }

    Ok(())
}

/// Validates the delay ranges
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    validate_range(
        "fetch delay",
        config.min_fetch_delay_ms,
        config.max_fetch_delay_ms,
    )?;
    validate_range(
        "page delay",
        config.min_page_delay_ms,
        config.max_page_delay_ms,
    )?;

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be >= 1, got {}",
            config.batch_size
        )));
    }

    Ok(())
}

fn validate_range(name: &str, min: u64, max: u64) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::Validation(format!(
            "{} range is inverted: min {}ms > max {}ms",
            name, min, max
        )));
    }
    Ok(())
}

/// Validates output paths
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, path) in [
        ("ledger_path", &config.ledger_path),
        ("results_path", &config.results_path),
        ("summary_path", &config.summary_path),
    ] {
        if path.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }

        if Path::new(path).is_dir() {
            return Err(ConfigError::Validation(format!(
                "{} '{}' is a directory",
                name, path
            )));
        }
    }

    if config.ledger_path == config.results_path {
        return Err(ConfigError::Validation(format!(
            "ledger_path and results_path must differ, both are '{}'",
            config.ledger_path
        )));
    }

    Ok(())
}

fn validate_listing_config(config: &ListingConfig) -> Result<(), ConfigError> {
    validate_listing(&config.base_path, config.page_size, config.max_offset)
}

fn validate_tag_query_config(config: &TagQueryConfig) -> Result<(), ConfigError> {
    if config.page_size < 1 {
        return Err(ConfigError::Validation(format!(
            "tag page_size must be >= 1, got {}",
            config.page_size
        )));
    }

    if config.tags.iter().any(|t| t.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "tag list cannot contain empty tags".to_string(),
        ));
    }

    Ok(())
}

/// Validates the explicit `[[sources]]` list
fn validate_sources(sources: &[SourceDescriptor]) -> Result<(), ConfigError> {
    for source in sources {
        match source {
            SourceDescriptor::Listing {
                base_path,
                page_size,
                max_offset,
            } => validate_listing(base_path, *page_size, *max_offset)?,
            SourceDescriptor::TagQuery {
                tag_name,
                page_size,
                ..
            } => {
                if tag_name.trim().is_empty() {
                    return Err(ConfigError::Validation(
                        "tag-query source must name a tag".to_string(),
                    ));
                }
                if *page_size < 1 {
                    return Err(ConfigError::Validation(format!(
                        "tag-query source '{}' page_size must be >= 1",
                        tag_name
                    )));
                }
            }
        }
    }
    Ok(())
}

fn validate_listing(base_path: &str, page_size: u32, max_offset: u32) -> Result<(), ConfigError> {
    if !base_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "listing base_path must start with '/', got '{}'",
            base_path
        )));
    }

    if page_size < 1 {
        return Err(ConfigError::Validation(format!(
            "listing page_size must be >= 1, got {}",
            page_size
        )));
    }

    if max_offset < page_size {
        return Err(ConfigError::Validation(format!(
            "listing max_offset ({}) must be >= page_size ({})",
            max_offset, page_size
        )));
    }

    Ok(())
}

//! Crawler module for fetching and orchestration
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a fixed request identity
//! - Pacing policies and graceful shutdown
//! - The crawl coordinator and its driving loop
//! - Resolving the CLI crawl mode into source descriptors

mod coordinator;
mod fetcher;
pub mod pacing;
pub mod shutdown;

pub use coordinator::{Checkpoint, Coordinator, CrawlReport};
pub use fetcher::{build_http_client, fetch_url, FailureKind, FetchResult, Fetcher, HttpFetcher};
pub use pacing::{NoPacing, PacingPolicy, RandomPacing};
pub use shutdown::{listen_for_ctrl_c, shutdown_channel, Shutdown, ShutdownTrigger};

use crate::config::Config;
use crate::extract::ExtractionPipeline;
use crate::frontier::SourceDescriptor;
use crate::output::{load_records, persist};
use crate::storage::Ledger;
use crate::{ConfigError, ConfigResult, Result};
use std::path::Path;

/// Tag crawled by the single-tag mode when none is given
pub const DEFAULT_TAG: &str = "热门";

/// Which sources a run crawls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrawlMode {
    /// The configured listing
    #[default]
    Listing,
    /// A single tag query
    Tag,
    /// The listing followed by every configured tag
    AllTags,
    /// The `[[sources]]` list from the configuration
    Custom,
}

/// Run options coming from the command line
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    pub mode: CrawlMode,

    /// Tag for [`CrawlMode::Tag`]
    pub tag: Option<String>,

    /// Page ceiling applied to every selected source
    pub max_pages: Option<u32>,

    /// Number of configured tags used by [`CrawlMode::AllTags`]
    pub max_tags: Option<usize>,

    /// Ignore the ledger and results on disk
    pub fresh: bool,
}

/// Turns the crawl mode into the ordered list of sources to crawl
///
/// # Errors
///
/// * `ConfigError::Validation` - blank tag, custom mode without `[[sources]]`,
///   or a zero page ceiling
pub fn resolve_sources(
    config: &Config,
    options: &CrawlOptions,
) -> ConfigResult<Vec<SourceDescriptor>> {
    let listing = || SourceDescriptor::Listing {
        base_path: config.listing.base_path.clone(),
        page_size: config.listing.page_size,
        max_offset: config.listing.max_offset,
    };
    let tag = |name: &str| SourceDescriptor::TagQuery {
        tag_name: name.to_string(),
        page_size: config.tag_query.page_size,
        max_pages: Some(config.tag_query.max_pages).filter(|pages| *pages > 0),
    };

    let sources = match options.mode {
        CrawlMode::Listing => vec![listing()],
        CrawlMode::Tag => {
            let name = options.tag.as_deref().unwrap_or(DEFAULT_TAG).trim();
            if name.is_empty() {
                return Err(ConfigError::Validation("tag must not be empty".to_string()));
            }
            vec![tag(name)]
        }
        CrawlMode::AllTags => {
            let count = options.max_tags.unwrap_or(config.tag_query.tags.len());
            std::iter::once(listing())
                .chain(config.tag_query.tags.iter().take(count).map(|name| tag(name.as_str())))
                .collect()
        }
        CrawlMode::Custom => {
            if config.sources.is_empty() {
                return Err(ConfigError::Validation(
                    "custom mode needs at least one [[sources]] entry".to_string(),
                ));
            }
            config.sources.clone()
        }
    };

    match options.max_pages {
        Some(0) => Err(ConfigError::Validation(
            "max pages must be at least 1".to_string(),
        )),
        Some(pages) => Ok(sources
            .into_iter()
            .map(|source| source.with_max_pages(pages))
            .collect()),
        None => Ok(sources),
    }
}

/// Runs a complete crawl with the configured HTTP client and pacing
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Resolve the sources for the selected mode
/// 2. Build the HTTP client
/// 3. Load the ledger and previous results (unless fresh)
/// 4. Crawl every source
/// 5. Persist the ledger and the de-duplicated results
///
/// # Example
///
/// ```no_run
/// use reel_crawl::config::load_config;
/// use reel_crawl::crawler::{listen_for_ctrl_c, run_crawl, CrawlOptions};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let report = run_crawl(&config, &CrawlOptions::default(), listen_for_ctrl_c()).await?;
/// println!("{} records", report.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    options: &CrawlOptions,
    shutdown: Shutdown,
) -> Result<CrawlReport> {
    let sources = resolve_sources(config, options)?;
    let fetcher = HttpFetcher::new(&config.client)?;
    let pacing = RandomPacing::new(config.pacing.clone());

    crawl_and_persist(
        config,
        &sources,
        options.fresh,
        Box::new(fetcher),
        Box::new(pacing),
        shutdown,
    )
    .await
}

/// Crawls `sources` and persists ledger and results, interrupted or not
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Ledger and results were written
/// * `Err(ReelError)` - Configuration or persistence failure
pub async fn crawl_and_persist(
    config: &Config,
    sources: &[SourceDescriptor],
    fresh: bool,
    fetcher: Box<dyn Fetcher>,
    pacing: Box<dyn PacingPolicy>,
    shutdown: Shutdown,
) -> Result<CrawlReport> {
    let ledger_path = Path::new(&config.output.ledger_path);
    let results_path = Path::new(&config.output.results_path);

    let (ledger, previous) = if fresh {
        tracing::info!(
            "Fresh run: ignoring {} and {}",
            ledger_path.display(),
            results_path.display()
        );
        (Ledger::new(), Vec::new())
    } else {
        (Ledger::load(ledger_path), load_records(results_path))
    };

    let report = Coordinator::new(
        fetcher,
        pacing,
        ExtractionPipeline::standard()?,
        config.site.clone(),
    )
    .with_ledger(ledger)
    .with_records(previous)
    .with_shutdown(shutdown)
    .with_checkpoint(Checkpoint {
        ledger_path: ledger_path.to_path_buf(),
        results_path: results_path.to_path_buf(),
        every: config.output.checkpoint_every,
    })
    .run(sources)
    .await?;

    report.ledger.save(ledger_path)?;
    persist(&report.records, results_path)?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(mode: CrawlMode) -> CrawlOptions {
        CrawlOptions {
            mode,
            ..CrawlOptions::default()
        }
    }

    #[test]
    fn test_listing_mode() {
        let sources = resolve_sources(&Config::default(), &options(CrawlMode::Listing)).unwrap();
        assert_eq!(
            sources,
            vec![SourceDescriptor::Listing {
                base_path: "/top250".to_string(),
                page_size: 25,
                max_offset: 250,
            }]
        );
    }

    #[test]
    fn test_tag_mode_defaults_to_popular() {
        let sources = resolve_sources(&Config::default(), &options(CrawlMode::Tag)).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].to_string(), "tag '热门'");
    }

    #[test]
    fn test_tag_mode_with_name_and_page_limit() {
        let options = CrawlOptions {
            mode: CrawlMode::Tag,
            tag: Some("科幻".to_string()),
            max_pages: Some(3),
            ..CrawlOptions::default()
        };
        let sources = resolve_sources(&Config::default(), &options).unwrap();
        assert_eq!(
            sources,
            vec![SourceDescriptor::TagQuery {
                tag_name: "科幻".to_string(),
                page_size: 20,
                max_pages: Some(3),
            }]
        );
    }

    #[test]
    fn test_blank_tag_is_rejected() {
        for blank in ["", "   "] {
            let options = CrawlOptions {
                mode: CrawlMode::Tag,
                tag: Some(blank.to_string()),
                ..CrawlOptions::default()
            };
            let result = resolve_sources(&Config::default(), &options);
            assert!(matches!(result, Err(ConfigError::Validation(_))));
        }
    }

    #[test]
    fn test_all_tags_mode() {
        let config = Config::default();
        let sources = resolve_sources(&config, &options(CrawlMode::AllTags)).unwrap();
        assert_eq!(sources.len(), 1 + config.tag_query.tags.len());
        assert!(matches!(sources[0], SourceDescriptor::Listing { .. }));

        let limited = CrawlOptions {
            mode: CrawlMode::AllTags,
            max_tags: Some(2),
            ..CrawlOptions::default()
        };
        assert_eq!(resolve_sources(&config, &limited).unwrap().len(), 3);
    }

    #[test]
    fn test_custom_mode_requires_sources() {
        let result = resolve_sources(&Config::default(), &options(CrawlMode::Custom));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_zero_max_pages_is_rejected() {
        let options = CrawlOptions {
            max_pages: Some(0),
            ..CrawlOptions::default()
        };
        assert!(resolve_sources(&Config::default(), &options).is_err());
    }
}

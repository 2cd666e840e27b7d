//! Reel-Crawl main entry point
//!
//! This is the command-line interface for the Reel-Crawl movie crawler.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use reel_crawl::config::{load_config_with_hash, Config};
use reel_crawl::crawler::{listen_for_ctrl_c, resolve_sources, run_crawl, CrawlMode, CrawlOptions};
use reel_crawl::output::{
    generate_markdown_summary, load_records, print_dataset_statistics, print_run_statistics,
    DatasetStatistics,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Reel-Crawl: a resumable, polite movie catalogue crawler
///
/// Reel-Crawl enumerates movie pages from the top listing and tag searches,
/// fetches every page at most once across runs, and accumulates structured
/// records into a JSON result file.
#[derive(Parser, Debug)]
#[command(name = "reel-crawl")]
#[command(version = "1.0.0")]
#[command(about = "A resumable, polite movie catalogue crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Which sources to crawl
    #[arg(long, value_enum, default_value_t = Mode::Listing)]
    mode: Mode,

    /// Tag to crawl in `tag` mode
    #[arg(long, value_name = "NAME")]
    tag: Option<String>,

    /// Page ceiling for every crawled source
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Number of configured tags crawled in `all-tags` mode
    #[arg(long, value_name = "N")]
    max_tags: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start from an empty ledger and result set
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "export_summary"])]
    dry_run: bool,

    /// Show statistics of the existing result file and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary"])]
    stats: bool,

    /// Generate markdown summary from the existing result file and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_summary: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// The configured listing
    Listing,
    /// A single tag (see --tag)
    Tag,
    /// The listing followed by the configured tags
    AllTags,
    /// The [[sources]] entries of the config file
    Custom,
}

impl From<Mode> for CrawlMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Listing => CrawlMode::Listing,
            Mode::Tag => CrawlMode::Tag,
            Mode::AllTags => CrawlMode::AllTags,
            Mode::Custom => CrawlMode::Custom,
        }
    }
}

impl Cli {
    fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions {
            mode: self.mode.into(),
            tag: self.tag.clone(),
            max_pages: self.max_pages,
            max_tags: self.max_tags,
            fresh: self.fresh,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let options = cli.crawl_options();

    if cli.dry_run {
        handle_dry_run(&config, &options)?;
    } else if cli.stats {
        handle_stats(&config);
    } else if cli.export_summary {
        handle_export_summary(&config)?;
    } else {
        handle_crawl(&config, &options).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("reel_crawl=info,warn"),
            1 => EnvFilter::new("reel_crawl=debug,info"),
            2 => EnvFilter::new("reel_crawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, options: &CrawlOptions) -> anyhow::Result<()> {
    let sources = resolve_sources(config, options).context("Failed to resolve sources")?;

    println!("=== Reel-Crawl Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Search path: {}", config.site.search_path);
    println!("  Item pattern: {}", config.site.item_pattern);

    println!("\nClient:");
    println!("  User agent: {}", config.client.user_agent);
    println!("  Accept-Language: {}", config.client.accept_language);
    println!("  Timeout: {}ms", config.client.timeout_ms);

    println!("\nPacing:");
    println!(
        "  Fetch delay: {}-{}ms",
        config.pacing.min_fetch_delay_ms, config.pacing.max_fetch_delay_ms
    );
    println!(
        "  Page delay: {}-{}ms",
        config.pacing.min_page_delay_ms, config.pacing.max_page_delay_ms
    );
    println!(
        "  Batch cooldown: {}ms every {} fetches",
        config.pacing.batch_cooldown_ms, config.pacing.batch_size
    );
    println!("  Page cooldown: {}ms", config.pacing.page_cooldown_ms);
    println!("  Source cooldown: {}ms", config.pacing.source_cooldown_ms);
    println!(
        "  Source group cooldown: {}ms every {} sources",
        config.pacing.source_group_cooldown_ms, config.pacing.source_group_size
    );

    println!("\nOutput:");
    println!("  Ledger: {}", config.output.ledger_path);
    println!("  Results: {}", config.output.results_path);
    println!("  Summary: {}", config.output.summary_path);
    println!("  Checkpoint every: {} items", config.output.checkpoint_every);

    println!("\nSources ({}):", sources.len());
    for source in &sources {
        println!("  - {}", source);
    }

    println!("\n✓ Configuration is valid");
    if options.fresh {
        println!("✓ Would start from an empty ledger");
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics of the result file
fn handle_stats(config: &Config) {
    println!("Results: {}\n", config.output.results_path);

    let records = load_records(Path::new(&config.output.results_path));
    print_dataset_statistics(&DatasetStatistics::from_records(&records));
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &Config) -> anyhow::Result<()> {
    println!("=== Exporting Crawl Summary ===\n");
    println!("Results: {}", config.output.results_path);
    println!("Output: {}", config.output.summary_path);
    println!();

    let records = load_records(Path::new(&config.output.results_path));
    generate_markdown_summary(&records, Path::new(&config.output.summary_path))
        .context("Failed to write summary")?;

    println!("✓ Summary exported to: {}", config.output.summary_path);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, options: &CrawlOptions) -> anyhow::Result<()> {
    if options.fresh {
        tracing::info!("Starting fresh crawl (ignoring previous state)");
    } else {
        tracing::info!("Starting crawl (already visited pages are skipped)");
    }

    let report = run_crawl(config, options, listen_for_ctrl_c())
        .await
        .context("Crawl failed")?;

    println!();
    print_run_statistics(&report.stats);
    print_dataset_statistics(&DatasetStatistics::from_records(&report.records));

    if report.interrupted {
        tracing::info!("Progress saved; run again to continue where this run stopped");
    } else {
        tracing::info!("Crawl completed successfully");
    }

    Ok(())
}

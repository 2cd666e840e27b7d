//! Run and dataset statistics
//!
//! [`RunStats`] is collected by the coordinator while it crawls.
//! [`DatasetStatistics`] summarizes an accumulated record set.

use crate::extract::ExtractedRecord;
use crate::state::ItemState;
use std::collections::HashMap;
use std::time::Duration;

/// Entries kept in the year and genre distributions
const TOP_N: usize = 10;

/// Records listed in the preview
const PREVIEW_LEN: usize = 20;

/// Per-source counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTally {
    pub label: String,
    pub pages: u64,
    pub extracted: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl SourceTally {
    /// Item references processed from this source
    pub fn references(&self) -> u64 {
        self.extracted + self.skipped + self.failed
    }
}

/// Counters for a single crawl run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Item references per terminal state
    pub by_state: HashMap<ItemState, u64>,

    /// Enumeration pages requested, including the one that ended each source
    pub pages_requested: u64,

    /// Counters per source, in crawl order
    pub sources: Vec<SourceTally>,

    pub elapsed: Duration,
}

impl RunStats {
    /// Starts counting a new source
    pub fn begin_source(&mut self, label: impl Into<String>) {
        self.sources.push(SourceTally {
            label: label.into(),
            ..SourceTally::default()
        });
    }

    pub fn record_page(&mut self) {
        self.pages_requested += 1;
        if let Some(source) = self.sources.last_mut() {
            source.pages += 1;
        }
    }

    /// Counts an item reference that reached `state`
    pub fn record(&mut self, state: ItemState) {
        *self.by_state.entry(state).or_insert(0) += 1;

        if let Some(source) = self.sources.last_mut() {
            match state {
                ItemState::Extracted => source.extracted += 1,
                ItemState::Skipped => source.skipped += 1,
                ItemState::FetchFailed => source.failed += 1,
                ItemState::Pending | ItemState::Fetching => {}
            }
        }
    }

    pub fn count(&self, state: ItemState) -> u64 {
        self.by_state.get(&state).copied().unwrap_or(0)
    }

    /// Item references that reached a terminal state
    pub fn references(&self) -> u64 {
        ItemState::terminal_states()
            .iter()
            .map(|state| self.count(*state))
            .sum()
    }

    /// Fetch attempts, successful or not
    pub fn fetched(&self) -> u64 {
        self.count(ItemState::Extracted) + self.count(ItemState::FetchFailed)
    }
}

/// Prints run counters to stdout
pub fn print_run_statistics(stats: &RunStats) {
    println!("=== Crawl Run ===\n");

    println!("Overview:");
    println!("  Pages requested: {}", stats.pages_requested);
    println!("  Item references: {}", stats.references());
    println!("  Fetch attempts: {}", stats.fetched());
    println!("  Elapsed: {:.1}s", stats.elapsed.as_secs_f64());
    println!();

    println!("Items by State:");
    for state in ItemState::terminal_states() {
        println!("  {}: {}", state, stats.count(state));
    }
    println!();

    if !stats.sources.is_empty() {
        println!("Sources:");
        for source in &stats.sources {
            println!(
                "  {}: {} pages, {} extracted, {} skipped, {} failed",
                source.label, source.pages, source.extracted, source.skipped, source.failed
            );
        }
        println!();
    }
}

/// Summary of an accumulated record set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetStatistics {
    pub total: usize,

    /// Records carrying a numeric rating
    pub rated: usize,

    pub mean_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub min_rating: Option<f64>,

    /// Most frequent years, most common first
    pub top_years: Vec<(String, usize)>,

    /// Most frequent genres, most common first
    pub top_genres: Vec<(String, usize)>,

    /// `title (year) - rating` lines for the first records
    pub preview: Vec<String>,
}

impl DatasetStatistics {
    /// Computes statistics over `records`
    ///
    /// Records without a rating are left out of the rating figures rather than
    /// counted as zero.
    pub fn from_records(records: &[ExtractedRecord]) -> Self {
        let ratings: Vec<f64> = records
            .iter()
            .filter_map(|record| record.rating)
            .filter(|rating| rating.is_finite())
            .collect();

        let mean_rating = if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
        };

        let years = top_counts(records.iter().filter_map(|record| record.year.as_deref()));
        let genres = top_counts(
            records
                .iter()
                .flat_map(|record| record.genres.iter().map(String::as_str)),
        );

        Self {
            total: records.len(),
            rated: ratings.len(),
            mean_rating,
            max_rating: ratings.iter().copied().reduce(f64::max),
            min_rating: ratings.iter().copied().reduce(f64::min),
            top_years: years,
            top_genres: genres,
            preview: records
                .iter()
                .take(PREVIEW_LEN)
                .map(ExtractedRecord::headline)
                .collect(),
        }
    }
}

/// Counts values and keeps the most frequent, ties broken alphabetically
fn top_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut sorted: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(value, count)| (value.to_string(), count))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(TOP_N);
    sorted
}

/// Prints dataset statistics to stdout
pub fn print_dataset_statistics(stats: &DatasetStatistics) {
    println!("=== Dataset ===\n");

    println!("  Records: {}", stats.total);
    println!("  Rated: {}", stats.rated);
    if let (Some(mean), Some(max), Some(min)) =
        (stats.mean_rating, stats.max_rating, stats.min_rating)
    {
        println!("  Rating: mean {:.2}, max {:.1}, min {:.1}", mean, max, min);
    }
    println!();

    if !stats.top_years.is_empty() {
        println!("Top Years:");
        for (year, count) in &stats.top_years {
            println!("  {}: {}", year, count);
        }
        println!();
    }

    if !stats.top_genres.is_empty() {
        println!("Top Genres:");
        for (genre, count) in &stats.top_genres {
            println!("  {}: {}", genre, count);
        }
        println!();
    }

    if !stats.preview.is_empty() {
        println!("Preview:");
        for (i, line) in stats.preview.iter().enumerate() {
            println!("  {}. {}", i + 1, line);
        }
        println!();
    }
}

//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the driving loop that ties the crawl together:
//! - Walking each source's enumerator page by page
//! - Consulting the ledger before every fetch
//! - Fetching, extracting and accumulating records
//! - Applying pacing, batch cooldowns and inter-source cooldowns
//! - Periodic checkpoints and graceful interruption
//!
//! The coordinator owns the ledger and the record list for the duration of a
//! run and hands both back in the [`CrawlReport`].

use crate::config::SiteConfig;
use crate::crawler::pacing::PacingPolicy;
use crate::crawler::shutdown::Shutdown;
use crate::crawler::{FetchResult, Fetcher};
use crate::extract::{ExtractedRecord, ExtractionPipeline};
use crate::frontier::{enumerator_for, Cursor, Enumerator, ItemReference, SourceDescriptor};
use crate::output::{dedupe, persist, RunStats};
use crate::state::ItemState;
use crate::storage::Ledger;
use crate::Result;
use chrono::Utc;
use std::path::PathBuf;
use std::time::Instant;

/// Item references between two progress lines
const PROGRESS_EVERY: u64 = 10;

/// Where and how often intermediate state is written during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub ledger_path: PathBuf,
    pub results_path: PathBuf,

    /// Committed items between two checkpoints; 0 disables them
    pub every: u32,
}

/// Outcome of a crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Ledger including every id committed during the run
    pub ledger: Ledger,

    /// Previous and new records, de-duplicated by id
    pub records: Vec<ExtractedRecord>,

    pub stats: RunStats,

    /// True if the run stopped on a shutdown request
    pub interrupted: bool,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    fetcher: Box<dyn Fetcher>,
    pacing: Box<dyn PacingPolicy>,
    pipeline: ExtractionPipeline,
    site: SiteConfig,
    ledger: Ledger,
    records: Vec<ExtractedRecord>,
    stats: RunStats,
    shutdown: Shutdown,
    checkpoint: Option<Checkpoint>,
    since_checkpoint: u32,
    started: Instant,
}

impl Coordinator {
    /// Creates a coordinator with an empty ledger and no previous records
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Fetch capability used for enumeration pages and item pages
    /// * `pacing` - Delay rules applied around requests
    /// * `pipeline` - Field extraction for item pages
    /// * `site` - Site endpoints used to build enumerators
    pub fn new(
        fetcher: Box<dyn Fetcher>,
        pacing: Box<dyn PacingPolicy>,
        pipeline: ExtractionPipeline,
        site: SiteConfig,
    ) -> Self {
        Self {
            fetcher,
            pacing,
            pipeline,
            site,
            ledger: Ledger::new(),
            records: Vec::new(),
            stats: RunStats::default(),
            shutdown: Shutdown::never(),
            checkpoint: None,
            since_checkpoint: 0,
            started: Instant::now(),
        }
    }

    /// Starts from a previously persisted ledger
    pub fn with_ledger(mut self, ledger: Ledger) -> Self {
        self.ledger = ledger;
        self
    }

    /// Starts from records extracted by earlier runs; new records are appended
    pub fn with_records(mut self, records: Vec<ExtractedRecord>) -> Self {
        self.records = records;
        self
    }

    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn with_checkpoint(mut self, checkpoint: Checkpoint) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    /// Crawls every source in order
    ///
    /// All enumerators are built before the first request, so a malformed
    /// source fails the run without fetching anything.
    pub async fn run(self, sources: &[SourceDescriptor]) -> Result<CrawlReport> {
        let enumerators = sources
            .iter()
            .map(|source| Ok((source.to_string(), enumerator_for(source, &self.site)?)))
            .collect::<Result<Vec<_>>>()?;

        self.run_enumerators(enumerators).await
    }

    /// Crawls labelled enumerators in order
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Completed or interrupted run
    /// * `Err(ReelError)` - A checkpoint could not be persisted
    pub async fn run_enumerators(
        mut self,
        enumerators: Vec<(String, Box<dyn Enumerator>)>,
    ) -> Result<CrawlReport> {
        self.started = Instant::now();
        let total = enumerators.len();
        let mut interrupted = false;

        tracing::info!(
            "Starting crawl of {} sources ({} ids already visited)",
            total,
            self.ledger.len()
        );

        for (index, (label, enumerator)) in enumerators.into_iter().enumerate() {
            tracing::info!("Source {}/{}: {}", index + 1, total, label);
            self.stats.begin_source(label.clone());

            if !self.crawl_source(&label, enumerator.as_ref()).await? {
                interrupted = true;
                break;
            }

            if index + 1 < total {
                let mut cooldown = self.pacing.delay_after_source();
                let group = self.pacing.source_group_size();
                if group > 0 && (index + 1) % group == 0 {
                    tracing::info!("Finished a group of {} sources, taking a longer break", group);
                    cooldown += self.pacing.delay_after_source_group();
                }
                tracing::debug!("Cooling down for {:?} before the next source", cooldown);
                if !self.shutdown.sleep(cooldown).await {
                    interrupted = true;
                    break;
                }
            }
        }

        if interrupted {
            tracing::warn!("Crawl interrupted; keeping everything committed so far");
        }

        Ok(self.finish(interrupted))
    }

    /// Walks one source until it is exhausted
    ///
    /// Returns false if the run was interrupted.
    async fn crawl_source(&mut self, label: &str, enumerator: &dyn Enumerator) -> Result<bool> {
        let mut cursor = Cursor::start();
        let mut fetched_since_cooldown = 0;
        let batch_size = self.pacing.batch_size();

        loop {
            if !self.shutdown.sleep(self.pacing.delay_before_page()).await {
                return Ok(false);
            }

            self.stats.record_page();
            let page = enumerator.next_page(self.fetcher.as_ref(), cursor).await;
            if page.exhausted {
                tracing::info!("Source {} exhausted at {}", label, cursor);
                return Ok(true);
            }

            tracing::debug!("{} items from {} at {}", page.items.len(), label, cursor);

            for reference in &page.items {
                if self.shutdown.is_triggered() {
                    return Ok(false);
                }

                match self.process_item(reference).await? {
                    Some(ItemState::Extracted) => {
                        fetched_since_cooldown += 1;
                        if fetched_since_cooldown >= batch_size {
                            fetched_since_cooldown = 0;
                            let cooldown = self.pacing.delay_after_batch();
                            tracing::debug!(
                                "Fetched a batch of {}, cooling down for {:?}",
                                batch_size,
                                cooldown
                            );
                            if !self.shutdown.sleep(cooldown).await {
                                return Ok(false);
                            }
                        }
                    }
                    Some(_) => {}
                    None => return Ok(false),
                }
            }

            // An enumerator that does not move forward would loop forever
            if page.next_cursor <= cursor {
                tracing::warn!("Source {} did not advance past {}, stopping", label, cursor);
                return Ok(true);
            }
            cursor = page.next_cursor;

            if !self.shutdown.sleep(self.pacing.delay_after_page()).await {
                return Ok(false);
            }
        }
    }

    /// Takes one item reference to a terminal state
    ///
    /// Returns `None` if shutdown was requested before the fetch started.
    async fn process_item(&mut self, reference: &ItemReference) -> Result<Option<ItemState>> {
        let id = reference.id.as_str();
        let state = ItemState::Pending;

        if self.ledger.contains(id) {
            let state = transition(id, state, ItemState::Skipped);
            tracing::trace!("Skipping {} ({})", reference.display_title, id);
            self.stats.record(state);
            self.report_progress();
            return Ok(Some(state));
        }

        if !self.shutdown.sleep(self.pacing.delay_before_fetch()).await {
            return Ok(None);
        }

        let state = transition(id, state, ItemState::Fetching);
        let state = match self.fetcher.fetch(id).await {
            FetchResult::Success { body, .. } => {
                let record = self.pipeline.extract(&body, id, Utc::now());
                tracing::debug!("Extracted {}", record.headline());
                self.records.push(record);
                transition(id, state, ItemState::Extracted)
            }
            FetchResult::Failure { kind, detail } => {
                tracing::warn!("Failed to fetch {} ({}): {}", id, kind, detail);
                transition(id, state, ItemState::FetchFailed)
            }
        };

        // Failed ids are marked visited too, so a broken page is not retried every run
        self.ledger.add(id);
        self.stats.record(state);
        self.commit()?;
        self.report_progress();

        Ok(Some(state))
    }

    /// Counts a committed item and writes a checkpoint when one is due
    fn commit(&mut self) -> Result<()> {
        let Some(checkpoint) = &self.checkpoint else {
            return Ok(());
        };
        if checkpoint.every == 0 {
            return Ok(());
        }

        self.since_checkpoint += 1;
        if self.since_checkpoint < checkpoint.every {
            return Ok(());
        }
        self.since_checkpoint = 0;

        self.ledger.save(&checkpoint.ledger_path)?;
        persist(&dedupe(self.records.clone()), &checkpoint.results_path)?;
        tracing::info!(
            "Checkpoint: {} visited ids, {} records",
            self.ledger.len(),
            self.records.len()
        );
        Ok(())
    }

    fn report_progress(&self) {
        let seen = self.stats.references();
        if seen == 0 || seen % PROGRESS_EVERY != 0 {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            seen as f64 / elapsed
        } else {
            0.0
        };
        tracing::info!(
            "Progress: {} items seen, {} extracted, {} skipped, {} failed, {:.2} items/sec",
            seen,
            self.stats.count(ItemState::Extracted),
            self.stats.count(ItemState::Skipped),
            self.stats.count(ItemState::FetchFailed),
            rate
        );
    }

    fn finish(mut self, interrupted: bool) -> CrawlReport {
        self.stats.elapsed = self.started.elapsed();
        let records = dedupe(self.records);

        tracing::info!(
            "Crawl {}: {} extracted, {} skipped, {} failed in {:.1}s",
            if interrupted { "stopped" } else { "completed" },
            self.stats.count(ItemState::Extracted),
            self.stats.count(ItemState::Skipped),
            self.stats.count(ItemState::FetchFailed),
            self.stats.elapsed.as_secs_f64()
        );

        CrawlReport {
            ledger: self.ledger,
            records,
            stats: self.stats,
            interrupted,
        }
    }
}

fn transition(id: &str, from: ItemState, to: ItemState) -> ItemState {
    debug_assert!(from.can_transition_to(to), "{} -> {} for {}", from, to, id);
    tracing::trace!("{}: {} -> {}", id, from, to);
    to
}

//! Pacing policy
//!
//! All politeness waits of a crawl are decided here and performed by the
//! coordinator. Policies only compute durations, so tests can swap in
//! [`NoPacing`] without touching the crawl loop.

use crate::config::PacingConfig;
use rand::Rng;
use std::time::Duration;

/// Delay rules applied around requests
pub trait PacingPolicy: Send + Sync {
    /// Wait before requesting an enumeration page
    fn delay_before_page(&self) -> Duration;

    /// Cooldown after the items of an enumeration page were handled
    fn delay_after_page(&self) -> Duration;

    /// Wait before fetching an item that is not in the ledger
    fn delay_before_fetch(&self) -> Duration;

    /// Cooldown after every `batch_size()` successful fetches
    fn delay_after_batch(&self) -> Duration;

    /// Cooldown between two sources
    fn delay_after_source(&self) -> Duration;

    /// Extra cooldown after every `source_group_size()` sources
    fn delay_after_source_group(&self) -> Duration;

    /// Successful fetches that trigger a batch cooldown
    fn batch_size(&self) -> usize;

    /// Sources per group; 0 disables group cooldowns
    fn source_group_size(&self) -> usize;
}

/// Random delays drawn from the configured ranges
#[derive(Debug, Clone)]
pub struct RandomPacing {
    config: PacingConfig,
}

impl RandomPacing {
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }
}

/// Uniform draw from `[min_ms, max_ms]`; tolerates a reversed range
fn jitter(min_ms: u64, max_ms: u64) -> Duration {
    let (low, high) = if min_ms <= max_ms {
        (min_ms, max_ms)
    } else {
        (max_ms, min_ms)
    };
    Duration::from_millis(rand::thread_rng().gen_range(low..=high))
}

impl PacingPolicy for RandomPacing {
    fn delay_before_page(&self) -> Duration {
        jitter(self.config.min_page_delay_ms, self.config.max_page_delay_ms)
    }

    fn delay_after_page(&self) -> Duration {
        Duration::from_millis(self.config.page_cooldown_ms)
    }

    fn delay_before_fetch(&self) -> Duration {
        jitter(self.config.min_fetch_delay_ms, self.config.max_fetch_delay_ms)
    }

    fn delay_after_batch(&self) -> Duration {
        Duration::from_millis(self.config.batch_cooldown_ms)
    }

    fn delay_after_source(&self) -> Duration {
        Duration::from_millis(self.config.source_cooldown_ms)
    }

    fn delay_after_source_group(&self) -> Duration {
        Duration::from_millis(self.config.source_group_cooldown_ms)
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size.max(1) as usize
    }

    fn source_group_size(&self) -> usize {
        self.config.source_group_size as usize
    }
}

/// Zero delays; batch accounting still runs
#[derive(Debug, Clone, Copy)]
pub struct NoPacing {
    pub batch_size: usize,
}

impl Default for NoPacing {
    fn default() -> Self {
        Self { batch_size: 5 }
    }
}

impl PacingPolicy for NoPacing {
    fn delay_before_page(&self) -> Duration {
        Duration::ZERO
    }

    fn delay_after_page(&self) -> Duration {
        Duration::ZERO
    }

    fn delay_before_fetch(&self) -> Duration {
        Duration::ZERO
    }

    fn delay_after_batch(&self) -> Duration {
        Duration::ZERO
    }

    fn delay_after_source(&self) -> Duration {
        Duration::ZERO
    }

    fn delay_after_source_group(&self) -> Duration {
        Duration::ZERO
    }

    fn batch_size(&self) -> usize {
        self.batch_size.max(1)
    }

    fn source_group_size(&self) -> usize {
        0
    }
}

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::{
    application::services::recommendation_service::{RecBatch, RecommendationService},
    config::Config,
    error::AppError,
    session::manager::SessionManager,
    storage::profile_store::ProfileStore,
    utils::backoff::Backoff,
    utils::pacing::Pacer,
};

/// Consecutive batches where every entry failed to parse before the run
/// aborts. One bad item is noise; whole pages of them mean the wire
/// format moved underneath us.
const PARSE_STREAK_LIMIT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScrapeOutcome {
    /// Consecutive low-novelty batches reached the configured limit.
    FeedExhausted,
    /// The iteration budget ran out while the feed still had novelty.
    IterationLimit,
    /// A cooperative stop was requested.
    StopRequested,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
    pub iterations: usize,
    pub profiles_fetched: usize,
    pub new_profiles: usize,
    pub parse_failures: usize,
    pub outcome: ScrapeOutcome,
}

impl fmt::Display for ScrapeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", s)
    }
}

/// Walks the recommendation feed one page at a time, deduplicating into
/// the profile store until the feed stops yielding new people.
///
/// Iterations are strictly sequential. The pacing pause between pages is
/// the rate-limit defense, so pages are never fetched in parallel.
pub struct RecScraper<R: RecommendationService> {
    service: Arc<R>,
    session: Arc<SessionManager>,
    store: Arc<ProfileStore>,
    pacer: Arc<dyn Pacer>,
    config: Arc<Config>,
    stop: AtomicBool,
}

impl<R: RecommendationService> RecScraper<R> {
    pub fn new(
        service: Arc<R>,
        session: Arc<SessionManager>,
        store: Arc<ProfileStore>,
        pacer: Arc<dyn Pacer>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            service,
            session,
            store,
            pacer,
            config,
            stop: AtomicBool::new(false),
        }
    }

    /// Asks a running scrape to stop. Honored at the next iteration
    /// boundary; the in-flight page still completes.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub async fn run(&self) -> Result<ScrapeReport, AppError> {
        let scrape = &self.config.scrape;
        let backoff = Backoff::new(
            Duration::from_millis(scrape.retry_base_ms),
            scrape.retry_attempts,
        );

        let mut report = ScrapeReport {
            iterations: 0,
            profiles_fetched: 0,
            new_profiles: 0,
            parse_failures: 0,
            outcome: ScrapeOutcome::IterationLimit,
        };
        let mut stale_batches = 0usize;
        let mut unparseable_streak = 0u32;

        info!(
            "Starting scrape: {} iterations max, {} known profiles",
            scrape.max_iterations,
            self.store.len()
        );

        for iteration in 1..=scrape.max_iterations {
            if self.stop.load(Ordering::SeqCst) {
                info!("Stop requested, ending scrape");
                report.outcome = ScrapeOutcome::StopRequested;
                break;
            }

            let batch = self.fetch_with_retry(&backoff).await?;
            report.iterations = iteration;
            report.parse_failures += batch.parse_failures;

            if batch.profiles.is_empty() && batch.parse_failures > 0 {
                unparseable_streak += 1;
                warn!(
                    "Batch {} was entirely unparseable ({} in a row)",
                    iteration, unparseable_streak
                );
                if unparseable_streak >= PARSE_STREAK_LIMIT {
                    error!("Feed format appears to have changed, aborting");
                    return Err(AppError::Parse(format!(
                        "{} consecutive batches with no parseable entries",
                        unparseable_streak
                    )));
                }
            } else {
                unparseable_streak = 0;
            }

            report.profiles_fetched += batch.profiles.len();
            let mut novelty = 0usize;
            for profile in batch.profiles {
                if self.store.upsert(profile) {
                    novelty += 1;
                }
            }
            report.new_profiles += novelty;

            if novelty <= scrape.novelty_threshold {
                stale_batches += 1;
                debug!(
                    "Batch {}: novelty {} (stale {}/{})",
                    iteration, novelty, stale_batches, scrape.stale_batch_limit
                );
            } else {
                stale_batches = 0;
                debug!("Batch {}: novelty {}", iteration, novelty);
            }

            if stale_batches >= scrape.stale_batch_limit {
                info!(
                    "Feed exhausted after {} iterations ({} profiles known)",
                    iteration,
                    self.store.len()
                );
                report.outcome = ScrapeOutcome::FeedExhausted;
                break;
            }

            if iteration < scrape.max_iterations {
                self.pacer.pause().await;
            }
        }

        info!("Scrape finished: {}", report);
        Ok(report)
    }

    /// One page fetch with the retry policy folded in: a rejected
    /// credential gets one refresh-and-retry, transient failures get the
    /// backoff budget, anything else surfaces immediately.
    async fn fetch_with_retry(&self, backoff: &Backoff) -> Result<RecBatch, AppError> {
        let mut credential = self.session.credential().await?;
        let mut refreshed = false;
        let mut transient_attempts = 0u32;

        loop {
            match self.service.fetch_page(&credential).await {
                Ok(batch) => return Ok(batch),
                Err(AppError::Unauthorized) if !refreshed => {
                    refreshed = true;
                    debug!("Credential rejected mid-scrape, refreshing once");
                    credential = self.session.refresh_rejected(&credential).await?;
                }
                Err(e) if e.is_transient() => {
                    transient_attempts += 1;
                    if transient_attempts >= backoff.max_attempts() {
                        error!("Retry budget exhausted: {}", e);
                        return Err(e);
                    }
                    let delay = backoff.delay(transient_attempts - 1);
                    warn!("Transient fetch failure ({}), retrying in {:?}", e, delay);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

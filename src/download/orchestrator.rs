//! Download orchestrator: executes a work list against an [`ItemFetcher`].
//!
//! # Concurrency Model
//!
//! - Each unit runs in its own Tokio task
//! - A semaphore permit is acquired before each unit is dispatched, so
//!   `concurrency = 1` reproduces strictly sequential processing
//! - Outcomes are written into slots indexed by work list position, so the
//!   returned [`OutcomeList`] follows work list order regardless of completion order
//!
//! # Retry Behavior
//!
//! Every failed attempt, including a per-attempt timeout, counts against the
//! retry budget. Retries reuse the same destination. Once the budget is spent
//! the fetcher is asked to discard any partial content.
//!
//! # Cancellation
//!
//! Setting the interrupt flag stops dispatch of new units. In-flight units run
//! to completion; units never dispatched are recorded as failed with zero attempts.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use super::fetcher::ItemFetcher;
use super::outcome::{Outcome, OutcomeList};
use super::retry::{FailureType, RetryDecision, RetryPolicy};
use super::{FetchItemError, OrchestratorError, PreconditionError};
use crate::plan::{WorkList, WorkUnit};

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 16;

/// Default concurrency: sequential processing.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Default limit for a single download attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(1800);

/// Recorded for units the run never started.
pub const INTERRUPTED_MESSAGE: &str = "run interrupted before download started";

const PANICKED_MESSAGE: &str = "download task panicked";

const WRITE_PROBE_NAME: &str = ".workshop-dl-write-test";

/// Orchestrator settings passed explicitly into each run.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum units processed at once.
    pub concurrency: usize,
    /// Attempt budget and backoff between attempts of one unit.
    pub retry_policy: RetryPolicy,
    /// Limit applied to every single attempt.
    pub attempt_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            retry_policy: RetryPolicy::default(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

/// Hooks for progress reporting. Callbacks run on worker tasks.
pub trait RunObserver: Send + Sync {
    /// A unit was dispatched.
    fn on_unit_started(&self, _unit: &WorkUnit) {}

    /// A unit finished with `outcome`.
    fn on_outcome(&self, _outcome: &Outcome) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Drives a [`WorkList`] through an [`ItemFetcher`] with retry and bounded concurrency.
pub struct DownloadOrchestrator {
    fetcher: Arc<dyn ItemFetcher>,
    semaphore: Arc<Semaphore>,
    config: OrchestratorConfig,
}

impl std::fmt::Debug for DownloadOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadOrchestrator")
            .field("fetcher", &self.fetcher.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DownloadOrchestrator {
    /// Creates an orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::InvalidConcurrency`] if the concurrency is
    /// outside `1..=16`.
    #[instrument(level = "debug", skip(fetcher))]
    pub fn new(
        fetcher: Arc<dyn ItemFetcher>,
        config: OrchestratorConfig,
    ) -> Result<Self, OrchestratorError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&config.concurrency) {
            return Err(OrchestratorError::InvalidConcurrency {
                value: config.concurrency,
                min: MIN_CONCURRENCY,
                max: MAX_CONCURRENCY,
            });
        }

        debug!(
            fetcher = fetcher.name(),
            concurrency = config.concurrency,
            max_attempts = config.retry_policy.max_attempts(),
            "creating download orchestrator"
        );

        Ok(Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(config.concurrency)),
            config,
        })
    }

    /// Returns the run configuration.
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Runs every unit of `work_list` into `dest_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionError`] if `dest_dir` cannot be created or written.
    /// Per-item failures never error; they are reported in the [`OutcomeList`].
    pub async fn run(
        &self,
        work_list: &WorkList,
        dest_dir: &Path,
    ) -> Result<OutcomeList, PreconditionError> {
        self.run_with(
            work_list,
            dest_dir,
            Arc::new(AtomicBool::new(false)),
            Arc::new(NoopObserver),
        )
        .await
    }

    /// Like [`run`](Self::run), with an interrupt flag and progress observer.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionError`] if `dest_dir` cannot be created or written.
    #[instrument(skip(self, work_list, interrupted, observer), fields(units = work_list.len(), dest = %dest_dir.display()))]
    pub async fn run_with(
        &self,
        work_list: &WorkList,
        dest_dir: &Path,
        interrupted: Arc<AtomicBool>,
        observer: Arc<dyn RunObserver>,
    ) -> Result<OutcomeList, PreconditionError> {
        ensure_destination(dest_dir)?;

        info!("starting downloads");

        let mut slots: Vec<Option<Outcome>> = vec![None; work_list.len()];
        let mut handles = Vec::with_capacity(work_list.len());

        for (index, unit) in work_list.iter().enumerate() {
            if interrupted.load(Ordering::SeqCst) {
                info!(
                    remaining = work_list.len() - index,
                    "interrupt received; not dispatching remaining units"
                );
                break;
            }

            let Ok(permit) = Arc::clone(&self.semaphore).acquire_owned().await else {
                warn!("semaphore closed; stopping dispatch");
                break;
            };

            // The flag may have flipped while waiting for a permit.
            if interrupted.load(Ordering::SeqCst) {
                info!(
                    remaining = work_list.len() - index,
                    "interrupt received; not dispatching remaining units"
                );
                break;
            }

            let unit = unit.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let observer = Arc::clone(&observer);
            let dest_dir = dest_dir.to_path_buf();
            let policy = self.config.retry_policy.clone();
            let attempt_timeout = self.config.attempt_timeout;

            handles.push((
                index,
                tokio::spawn(async move {
                    let _permit = permit;
                    observer.on_unit_started(&unit);

                    let outcome = fetch_with_retry(
                        fetcher.as_ref(),
                        &unit,
                        &dest_dir,
                        &policy,
                        attempt_timeout,
                    )
                    .await;

                    if outcome.is_success() {
                        info!(item_id = %unit.id, attempts = outcome.attempts, "download completed");
                    } else {
                        warn!(
                            item_id = %unit.id,
                            attempts = outcome.attempts,
                            error = outcome.last_error.as_deref().unwrap_or_default(),
                            "download failed after all attempts"
                        );
                    }
                    observer.on_outcome(&outcome);
                    outcome
                }),
            ));
        }

        let dispatched = handles.len();
        debug!(task_count = dispatched, "waiting for downloads to complete");

        for (index, handle) in handles {
            match handle.await {
                Ok(outcome) => slots[index] = Some(outcome),
                Err(e) => warn!(error = %e, "download task panicked"),
            }
        }

        let outcomes: Vec<Outcome> = slots
            .into_iter()
            .zip(work_list.iter())
            .enumerate()
            .map(|(index, (slot, unit))| {
                slot.unwrap_or_else(|| {
                    let reason = if index < dispatched {
                        PANICKED_MESSAGE
                    } else {
                        INTERRUPTED_MESSAGE
                    };
                    let outcome = Outcome::failed(unit.id.clone(), unit.source.clone(), 0, reason);
                    observer.on_outcome(&outcome);
                    outcome
                })
            })
            .collect();

        let outcomes = OutcomeList::new(outcomes);
        info!(
            succeeded = outcomes.succeeded(),
            failed = outcomes.failed(),
            total = outcomes.len(),
            "downloads complete"
        );

        Ok(outcomes)
    }
}

/// Runs one unit's attempts until success or the retry budget is spent.
#[instrument(skip(fetcher, unit, dest_dir, policy), fields(item_id = %unit.id))]
async fn fetch_with_retry(
    fetcher: &dyn ItemFetcher,
    unit: &WorkUnit,
    dest_dir: &Path,
    policy: &RetryPolicy,
    attempt_timeout: Duration,
) -> Outcome {
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        debug!(attempt, "attempting download");

        let result = match tokio::time::timeout(
            attempt_timeout,
            fetcher.fetch_item(&unit.id, dest_dir),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(FetchItemError::Timeout {
                id: unit.id.clone(),
                limit: attempt_timeout,
            }),
        };

        let error = match result {
            Ok(()) => return Outcome::succeeded(unit.id.clone(), unit.source.clone(), attempt),
            Err(e) => e,
        };

        // Tool failures carry no permanence signal.
        match policy.should_retry(FailureType::Transient, attempt) {
            RetryDecision::Retry {
                delay,
                attempt: next_attempt,
            } => {
                info!(
                    attempt = next_attempt,
                    max_attempts = policy.max_attempts(),
                    delay_ms = delay.as_millis(),
                    error = %error,
                    "retrying download"
                );
                tokio::time::sleep(delay).await;
            }
            RetryDecision::DoNotRetry { reason } => {
                debug!(%reason, "not retrying download");
                fetcher.discard_partial(&unit.id, dest_dir).await;
                return Outcome::failed(
                    unit.id.clone(),
                    unit.source.clone(),
                    attempt,
                    error.to_string(),
                );
            }
        }
    }
}

/// Creates `dest_dir` if needed and checks it accepts writes.
fn ensure_destination(dest_dir: &Path) -> Result<(), PreconditionError> {
    if dest_dir.exists() && !dest_dir.is_dir() {
        return Err(PreconditionError::NotADirectory {
            path: dest_dir.to_path_buf(),
        });
    }

    std::fs::create_dir_all(dest_dir).map_err(|source| PreconditionError::CreateDir {
        path: dest_dir.to_path_buf(),
        source,
    })?;

    let probe: PathBuf = dest_dir.join(WRITE_PROBE_NAME);
    std::fs::write(&probe, b"").map_err(|source| PreconditionError::NotWritable {
        path: dest_dir.to_path_buf(),
        source,
    })?;
    if let Err(e) = std::fs::remove_file(&probe) {
        debug!(error = %e, path = %probe.display(), "could not remove write probe");
    }

    Ok(())
}

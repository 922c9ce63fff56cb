//! Download orchestration for planned Workshop items.
//!
//! The orchestrator drives an [`ItemFetcher`] over a [`WorkList`](crate::plan::WorkList),
//! retrying failed attempts and collecting one [`Outcome`] per unit.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use workshop_core::download::{DownloadOrchestrator, OrchestratorConfig, SteamCmd};
//! use workshop_core::plan::{WorkList, WorkUnit};
//! use workshop_core::parser::WorkshopId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let binary = SteamCmd::locate(None)?;
//! let fetcher = Arc::new(SteamCmd::new(binary, "108600"));
//! let orchestrator = DownloadOrchestrator::new(fetcher, OrchestratorConfig::default())?;
//!
//! let id = WorkshopId::parse("2169435993").ok_or("bad id")?;
//! let work_list: WorkList = [WorkUnit::direct(id)].into_iter().collect();
//! let outcomes = orchestrator.run(&work_list, Path::new("./mods")).await?;
//! println!("{} succeeded, {} failed", outcomes.succeeded(), outcomes.failed());
//! # Ok(())
//! # }
//! ```

mod error;
mod fetcher;
mod orchestrator;
mod outcome;
mod retry;
mod steamcmd;

pub use error::{FetchItemError, OrchestratorError, PreconditionError};
pub use fetcher::ItemFetcher;
pub use orchestrator::{
    DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_CONCURRENCY, DownloadOrchestrator, INTERRUPTED_MESSAGE,
    MAX_CONCURRENCY, MIN_CONCURRENCY, NoopObserver, OrchestratorConfig, RunObserver,
};
pub use outcome::{Outcome, OutcomeList, OutcomeStatus};
pub use retry::{DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy};
pub use steamcmd::{STAGING_DIR_NAME, STEAMCMD_DIR_ENV, SteamCmd};

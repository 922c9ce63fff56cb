//! Workshop Core Library
//!
//! Resolves Steam Workshop links (single items and collections) into an
//! ordered, deduplicated download plan and drives a per-item download tool
//! over it with retry and partial-failure handling.
//!
//! # Architecture
//!
//! - [`parser`] - raw text to typed item/collection references
//! - [`resolver`] - collection pages to ordered member ids
//! - [`plan`] - references and resolved collections to one work list
//! - [`download`] - work list execution, retry, `steamcmd` integration
//!
//! Data flows `parse_input` -> `DownloadPlanner::plan` -> `DownloadOrchestrator::run`.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod parser;
pub mod plan;
pub mod resolver;
mod user_agent;

// Re-export commonly used types
pub use download::{
    DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES, DownloadOrchestrator, FetchItemError, ItemFetcher,
    OrchestratorConfig, OrchestratorError, Outcome, OutcomeList, OutcomeStatus,
    PreconditionError, RetryPolicy, SteamCmd,
};
pub use parser::{ParseError, ParseResult, WorkshopId, WorkshopRef, parse_input};
pub use plan::{DownloadPlanner, PlanOutcome, SourceKind, WorkList, WorkUnit};
pub use resolver::{CollectionSource, ResolveError, ResolvedCollection, WorkshopResolver};

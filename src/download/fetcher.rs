//! The per-item download capability.

use std::path::Path;

use async_trait::async_trait;

use crate::parser::WorkshopId;

use super::FetchItemError;

/// Downloads one item's content under a destination root.
///
/// Implementations must write each item only to its own path below
/// `dest_dir` so distinct items can be fetched concurrently.
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    /// Returns a short name for logging.
    fn name(&self) -> &str;

    /// Fetches the item into `dest_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchItemError`] describing why this attempt failed.
    async fn fetch_item(&self, id: &WorkshopId, dest_dir: &Path) -> Result<(), FetchItemError>;

    /// Removes whatever a failed or abandoned attempt left for `id` under
    /// `dest_dir`. Called once the orchestrator gives up on the item.
    async fn discard_partial(&self, _id: &WorkshopId, _dest_dir: &Path) {}
}

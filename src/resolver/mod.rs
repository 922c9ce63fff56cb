//! Collection resolution: turning a collection id into its member items.
//!
//! # Architecture
//!
//! - [`PageFetcher`] - fetch capability (`url -> document`), HTTP by default
//! - [`PageExtractor`] - the page-shape rules, isolated so markup changes stay local
//! - [`WorkshopResolver`] - combines both; implements [`CollectionSource`]
//! - [`CollectionSource`] - what the planner depends on
//!
//! # Example
//!
//! ```no_run
//! use workshop_core::parser::{CollectionRef, WorkshopId};
//! use workshop_core::resolver::WorkshopResolver;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = WorkshopResolver::new()?;
//! let id = WorkshopId::parse("2169435993").ok_or("bad id")?;
//! let collection = resolver.resolve_collection(&CollectionRef::new(id)).await?;
//! println!("{} members", collection.members.len());
//! # Ok(())
//! # }
//! ```

mod error;
mod extract;
mod http_client;
mod workshop;

pub use error::ResolveError;
pub use extract::{PageExtractor, SteamCommunityExtractor};
pub use http_client::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_PAGE_TIMEOUT_SECS, HttpPageFetcher, PageFetcher,
};
pub use workshop::{DEFAULT_COMMUNITY_BASE_URL, WorkshopResolver};

use async_trait::async_trait;

use crate::parser::{CollectionRef, ItemRef, WorkshopId};

/// A collection expanded into its member items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCollection {
    /// Collection id.
    pub id: WorkshopId,
    /// Collection title, when the page shows one.
    pub title: Option<String>,
    /// Game app id, when the page exposes one.
    pub app_id: Option<String>,
    /// Members in page order, unique by id.
    pub members: Vec<ItemRef>,
}

/// Details read from a single item's page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPage {
    /// Item id.
    pub id: WorkshopId,
    /// Item title.
    pub title: Option<String>,
    /// Game app id.
    pub app_id: Option<String>,
}

/// Source of collection membership used by the planner.
///
/// Uses `async_trait` so the planner can take `&dyn CollectionSource`.
#[async_trait]
pub trait CollectionSource: Send + Sync {
    /// Resolves a collection to its ordered unique members.
    ///
    /// # Errors
    ///
    /// Fetch-class [`ResolveError`] or [`ResolveError::EmptyCollection`].
    async fn resolve(&self, collection: &CollectionRef)
    -> Result<ResolvedCollection, ResolveError>;

    /// Checks whether an item-style link actually points at a collection.
    ///
    /// Returns `Ok(None)` for a plain item. Sources without page access keep
    /// the default and treat every item link as an item.
    ///
    /// # Errors
    ///
    /// Fetch-class [`ResolveError`] when the page cannot be retrieved.
    async fn expand_item_link(
        &self,
        _item: &ItemRef,
    ) -> Result<Option<ResolvedCollection>, ResolveError> {
        Ok(None)
    }
}

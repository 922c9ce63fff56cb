//! Collection resolution and page inspection against the Workshop site.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::parser::{CollectionRef, ItemRef, WorkshopId};

use super::extract::{PageExtractor, SteamCommunityExtractor};
use super::http_client::{HttpPageFetcher, PageFetcher};
use super::{CollectionSource, ItemPage, ResolveError, ResolvedCollection};

/// Default Workshop host.
pub const DEFAULT_COMMUNITY_BASE_URL: &str = "https://steamcommunity.com";

/// Resolves collections into their member items by inspecting Workshop pages.
///
/// Holds no per-call state: resolving the same collection twice against an
/// unchanged page yields the same result.
pub struct WorkshopResolver {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Box<dyn PageExtractor>,
    base_url: String,
}

impl WorkshopResolver {
    /// Creates a resolver for `steamcommunity.com` over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Client`] when HTTP client construction fails.
    pub fn new() -> Result<Self, ResolveError> {
        Ok(Self::with_fetcher(
            Arc::new(HttpPageFetcher::new()?),
            DEFAULT_COMMUNITY_BASE_URL,
        ))
    }

    /// Creates a resolver with a custom fetcher and base URL (tests, mirrors).
    #[must_use]
    pub fn with_fetcher(fetcher: Arc<dyn PageFetcher>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            extractor: Box::new(SteamCommunityExtractor),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Replaces the page extraction rules.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Box<dyn PageExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Returns the page URL for a collection.
    #[must_use]
    pub fn collection_url(&self, id: &WorkshopId) -> String {
        format!("{}/workshop/filedetails/?id={id}", self.base_url)
    }

    /// Returns the page URL for a single item.
    #[must_use]
    pub fn item_url(&self, id: &WorkshopId) -> String {
        format!("{}/sharedfiles/filedetails/?id={id}", self.base_url)
    }

    /// Fetches a collection page and extracts its ordered, unique members.
    ///
    /// # Errors
    ///
    /// - Fetch-class [`ResolveError`] when the page cannot be retrieved
    /// - [`ResolveError::EmptyCollection`] when the page lists no members
    #[instrument(skip(self), fields(collection_id = %collection.id))]
    pub async fn resolve_collection(
        &self,
        collection: &CollectionRef,
    ) -> Result<ResolvedCollection, ResolveError> {
        let url = self.collection_url(&collection.id);
        let html = self.fetcher.fetch(&url).await?;

        let Some(resolved) = self.collection_from_page(&html, &collection.id) else {
            debug!(bytes = html.len(), "collection page listed no members");
            return Err(ResolveError::EmptyCollection {
                collection_id: collection.id.clone(),
            });
        };

        info!(
            members = resolved.members.len(),
            title = resolved.title.as_deref().unwrap_or(""),
            app_id = resolved.app_id.as_deref().unwrap_or(""),
            "Collection resolved"
        );

        Ok(resolved)
    }

    /// Fetches the page behind a `sharedfiles` link and expands it when the
    /// Workshop renders it as a collection.
    ///
    /// Returns `Ok(None)` for an ordinary item page, and for a collection
    /// page that lists no members.
    ///
    /// # Errors
    ///
    /// Fetch-class [`ResolveError`] when the page cannot be retrieved.
    #[instrument(skip(self), fields(item_id = %item.id))]
    pub async fn expand_item_link(
        &self,
        item: &ItemRef,
    ) -> Result<Option<ResolvedCollection>, ResolveError> {
        let html = self.fetcher.fetch(&self.item_url(&item.id)).await?;

        if !self.extractor.is_collection_page(&html) {
            debug!("item link is a single item");
            return Ok(None);
        }

        let resolved = self.collection_from_page(&html, &item.id);
        match &resolved {
            Some(collection) => info!(
                members = collection.members.len(),
                title = collection.title.as_deref().unwrap_or(""),
                "Item link is a collection"
            ),
            None => debug!("collection page behind item link listed no members"),
        }
        Ok(resolved)
    }

    fn collection_from_page(&self, html: &str, id: &WorkshopId) -> Option<ResolvedCollection> {
        let members: Vec<ItemRef> = self
            .extractor
            .member_ids(html, id)
            .into_iter()
            .map(ItemRef::new)
            .collect();

        (!members.is_empty()).then(|| ResolvedCollection {
            id: id.clone(),
            title: self.extractor.title(html),
            app_id: self.extractor.app_id(html),
            members,
        })
    }

    /// Fetches a single item's page for its title and app id.
    ///
    /// # Errors
    ///
    /// Fetch-class [`ResolveError`] when the page cannot be retrieved.
    #[instrument(skip(self), fields(item_id = %item.id))]
    pub async fn inspect_item(&self, item: &ItemRef) -> Result<ItemPage, ResolveError> {
        let html = self.fetcher.fetch(&self.item_url(&item.id)).await?;
        Ok(ItemPage {
            id: item.id.clone(),
            title: self.extractor.title(&html),
            app_id: self.extractor.app_id(&html),
        })
    }
}

impl std::fmt::Debug for WorkshopResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkshopResolver")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CollectionSource for WorkshopResolver {
    async fn resolve(&self, collection: &CollectionRef) -> Result<ResolvedCollection, ResolveError> {
        self.resolve_collection(collection).await
    }

    async fn expand_item_link(
        &self,
        item: &ItemRef,
    ) -> Result<Option<ResolvedCollection>, ResolveError> {
        WorkshopResolver::expand_item_link(self, item).await
    }
}

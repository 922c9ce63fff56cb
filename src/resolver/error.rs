//! Error types for collection resolution and page fetching.

use thiserror::Error;

use crate::parser::WorkshopId;

/// Errors that can occur while fetching or inspecting Workshop pages.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// Transport-level failure (DNS, connect, TLS, timeout, body read).
    #[error("network error fetching {url}: {reason}")]
    Fetch {
        /// The page URL.
        url: String,
        /// Underlying failure description.
        reason: String,
    },

    /// Server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The page URL.
        url: String,
        /// Status code returned.
        status: u16,
    },

    /// Page was retrieved but listed no member items.
    #[error(
        "collection {collection_id} has no resolvable member items\n  Suggestion: check that the collection is public and the link points to a collection, not an item"
    )]
    EmptyCollection {
        /// The collection that resolved to nothing.
        collection_id: WorkshopId,
    },

    /// HTTP client could not be constructed.
    #[error("HTTP client construction failed: {reason}")]
    Client {
        /// Builder failure description.
        reason: String,
    },
}

impl ResolveError {
    /// Creates a transport error.
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Returns true for page retrieval failures (the `FetchError` class).
    #[must_use]
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::HttpStatus { .. })
    }

    /// Returns true if a repeated request could plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Fetch { .. } => true,
            Self::HttpStatus { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            Self::EmptyCollection { .. } | Self::Client { .. } => false,
        }
    }
}

//! Types representing parsed Workshop identifiers and parse results.

use std::fmt;

use serde::{Serialize, Serializer};

/// Longest id accepted; Workshop ids are unsigned 64-bit integers.
const MAX_ID_DIGITS: usize = 20;

/// A validated Workshop numeric identifier.
///
/// Only constructible through [`WorkshopId::parse`], so every value in the
/// pipeline is known to be a well-formed id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkshopId(String);

impl WorkshopId {
    /// Parses a numeric id string.
    ///
    /// Accepts 1 to 20 ASCII digits without sign or leading zero.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_ID_DIGITS
            && raw.bytes().all(|b| b.is_ascii_digit())
            && !raw.starts_with('0');
        valid.then(|| Self(raw.to_string()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkshopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for WorkshopId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Reference to a single Workshop item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemRef {
    /// Item id.
    pub id: WorkshopId,
    /// Came from a `sharedfiles/filedetails` link rather than a bare id.
    ///
    /// Steam shows collections under that path too, so the planner checks
    /// the page behind such links.
    pub from_link: bool,
}

impl ItemRef {
    /// Creates an item reference.
    #[must_use]
    pub fn new(id: WorkshopId) -> Self {
        Self {
            id,
            from_link: false,
        }
    }

    /// Creates a reference for an item-style link.
    #[must_use]
    pub fn from_link(id: WorkshopId) -> Self {
        Self {
            id,
            from_link: true,
        }
    }
}

/// Reference to a Workshop collection whose members still need resolving.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionRef {
    /// Collection id.
    pub id: WorkshopId,
}

impl CollectionRef {
    /// Creates a collection reference.
    #[must_use]
    pub fn new(id: WorkshopId) -> Self {
        Self { id }
    }
}

/// Kind of reference detected in input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// A single downloadable item.
    Single,
    /// A collection of items.
    Collection,
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "item"),
            Self::Collection => write!(f, "collection"),
        }
    }
}

/// A parsed identifier: either an item or a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WorkshopRef {
    /// Single item link or bare numeric id.
    Item(ItemRef),
    /// Collection link.
    Collection(CollectionRef),
}

impl WorkshopRef {
    /// Creates an item reference.
    #[must_use]
    pub fn item(id: WorkshopId) -> Self {
        Self::Item(ItemRef::new(id))
    }

    /// Creates an item reference for a `sharedfiles` link.
    #[must_use]
    pub fn item_link(id: WorkshopId) -> Self {
        Self::Item(ItemRef::from_link(id))
    }

    /// Creates a collection reference.
    #[must_use]
    pub fn collection(id: WorkshopId) -> Self {
        Self::Collection(CollectionRef::new(id))
    }

    /// Returns the referenced id.
    #[must_use]
    pub fn id(&self) -> &WorkshopId {
        match self {
            Self::Item(item) => &item.id,
            Self::Collection(collection) => &collection.id,
        }
    }

    /// Returns the reference kind.
    #[must_use]
    pub fn kind(&self) -> RefKind {
        match self {
            Self::Item(_) => RefKind::Single,
            Self::Collection(_) => RefKind::Collection,
        }
    }
}

impl fmt::Display for WorkshopRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind(), self.id())
    }
}

/// Identifiers extracted from raw input.
#[derive(Debug, Default)]
pub struct ParseResult {
    /// Recognized references in input order (duplicates preserved)
    pub refs: Vec<WorkshopRef>,
    /// Tokens that matched no known shape (for logging)
    pub skipped: Vec<String>,
}

impl ParseResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a recognized reference.
    pub fn add_ref(&mut self, reference: WorkshopRef) {
        self.refs.push(reference);
    }

    /// Adds a skipped token.
    pub fn add_skipped(&mut self, token: impl Into<String>) {
        self.skipped.push(token.into());
    }

    /// Returns true if nothing was recognized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Returns count of recognized references.
    #[must_use]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Returns count of skipped tokens.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Returns an iterator over item references only.
    pub fn items(&self) -> impl Iterator<Item = &ItemRef> {
        self.refs.iter().filter_map(|r| match r {
            WorkshopRef::Item(item) => Some(item),
            WorkshopRef::Collection(_) => None,
        })
    }

    /// Returns an iterator over collection references only.
    pub fn collections(&self) -> impl Iterator<Item = &CollectionRef> {
        self.refs.iter().filter_map(|r| match r {
            WorkshopRef::Collection(collection) => Some(collection),
            WorkshopRef::Item(_) => None,
        })
    }
}

impl fmt::Display for ParseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} items, {} collections, {} skipped",
            self.items().count(),
            self.collections().count(),
            self.skipped_count()
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_workshop_id_accepts_digits() {
        let id = WorkshopId::parse("2169435993").unwrap();
        assert_eq!(id.as_str(), "2169435993");
        assert_eq!(id.to_string(), "2169435993");
    }

    #[test]
    fn test_workshop_id_rejects_non_digits() {
        assert!(WorkshopId::parse("").is_none());
        assert!(WorkshopId::parse("12a").is_none());
        assert!(WorkshopId::parse("-12").is_none());
        assert!(WorkshopId::parse("+12").is_none());
        assert!(WorkshopId::parse("1 2").is_none());
    }

    #[test]
    fn test_workshop_id_rejects_leading_zero_and_overlong() {
        assert!(WorkshopId::parse("0").is_none());
        assert!(WorkshopId::parse("0123").is_none());
        assert!(WorkshopId::parse(&"9".repeat(21)).is_none());
        assert!(WorkshopId::parse(&"9".repeat(20)).is_some());
    }

    #[test]
    fn test_workshop_ref_accessors() {
        let item = WorkshopRef::item(WorkshopId::parse("1").unwrap());
        let collection = WorkshopRef::collection(WorkshopId::parse("2").unwrap());
        assert_eq!(item.kind(), RefKind::Single);
        assert_eq!(collection.kind(), RefKind::Collection);
        assert_eq!(item.id().as_str(), "1");
        assert_eq!(collection.to_string(), "[collection] 2");
    }

    #[test]
    fn test_parse_result_filters() {
        let mut result = ParseResult::new();
        result.add_ref(WorkshopRef::item(WorkshopId::parse("10").unwrap()));
        result.add_ref(WorkshopRef::collection(WorkshopId::parse("20").unwrap()));
        result.add_skipped("garbage");
        assert_eq!(result.len(), 2);
        assert_eq!(result.items().count(), 1);
        assert_eq!(result.collections().count(), 1);
        assert_eq!(result.to_string(), "1 items, 1 collections, 1 skipped");
    }

    #[test]
    fn test_workshop_id_serializes_as_string() {
        let id = WorkshopId::parse("555").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"555\"");
    }
}

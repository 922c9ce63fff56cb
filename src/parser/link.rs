//! Workshop link and bare-id extraction from free-form text.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use super::input::{ParseResult, WorkshopId, WorkshopRef};

/// Matches Workshop `filedetails` links, with or without scheme.
///
/// Capture 1 is the path discriminator (`sharedfiles` = item, `workshop` =
/// collection); capture 2 is the raw query string.
#[allow(clippy::expect_used)]
static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:https?://)?(?:www\.)?steamcommunity\.com/(sharedfiles|workshop)/filedetails/?\?([^\s#<>"'()\[\]]*)"#,
    )
    .expect("link regex is valid") // Static pattern, safe to panic
});

/// Punctuation commonly wrapped around ids pasted from chat or markdown.
const WRAPPING_CHARS: &[char] = &[
    '.', ',', ';', ':', '!', '?', '(', ')', '[', ']', '{', '}', '<', '>', '"', '\'', '`',
];

/// Classification of one whitespace-delimited token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenMatch {
    /// One or more Workshop references found.
    Refs(Vec<WorkshopRef>),
    /// Token matched neither a link shape nor a bare id.
    Unrecognized,
}

/// Extracts every Workshop reference from `input`.
///
/// Input is split on whitespace (which covers line breaks); each token is
/// classified independently and unrecognized tokens are recorded as skipped.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
#[must_use]
pub fn extract_refs(input: &str) -> ParseResult {
    let mut result = ParseResult::new();

    for token in input.split_whitespace() {
        match classify_token(token) {
            TokenMatch::Refs(refs) => {
                for reference in refs {
                    trace!(reference = %reference, "recognized token");
                    result.add_ref(reference);
                }
            }
            TokenMatch::Unrecognized => {
                debug!(token = %token, "skipping unrecognized token");
                result.add_skipped(token);
            }
        }
    }

    result
}

/// Classifies a single token as link(s), bare id, or garbage.
///
/// The URL path segment decides the kind: `workshop/filedetails` is a
/// collection, `sharedfiles/filedetails` is an item. A bare numeric token is
/// always treated as an item.
#[must_use]
pub fn classify_token(token: &str) -> TokenMatch {
    let mut refs = Vec::new();
    let mut saw_link = false;

    for caps in LINK_PATTERN.captures_iter(token) {
        saw_link = true;
        let (Some(kind), Some(query)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let Some(id) = id_from_query(query.as_str()) else {
            debug!(link = %caps.get(0).map_or("", |m| m.as_str()), "link has no numeric id");
            continue;
        };
        if kind.as_str().eq_ignore_ascii_case("workshop") {
            refs.push(WorkshopRef::collection(id));
        } else {
            refs.push(WorkshopRef::item_link(id));
        }
    }

    if !saw_link && let Some(id) = WorkshopId::parse(token.trim_matches(WRAPPING_CHARS)) {
        refs.push(WorkshopRef::item(id));
    }

    if refs.is_empty() {
        TokenMatch::Unrecognized
    } else {
        TokenMatch::Refs(refs)
    }
}

/// Finds the `id` query parameter, tolerating HTML-escaped `&amp;` separators
/// and sentence punctuation glued to the end of the link.
fn id_from_query(query: &str) -> Option<WorkshopId> {
    url::form_urlencoded::parse(query.as_bytes()).find_map(|(key, value)| {
        (key.trim_start_matches("amp;") == "id")
            .then(|| WorkshopId::parse(value.trim().trim_end_matches(WRAPPING_CHARS)))
            .flatten()
    })
}

//! Page-shape rules for Workshop pages.
//!
//! Collection resolution depends on markup the Workshop controls. All of that
//! knowledge lives behind [`PageExtractor`]; if the site changes its markup,
//! swap the extractor and nothing else moves.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::parser::WorkshopId;

/// Compiles a regex at static init; panics on invalid pattern.
fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// `href` attributes pointing at an item's `filedetails` page.
static MEMBER_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"(?i)href\s*=\s*["'][^"']*sharedfiles/filedetails/?\?[^"']*?\bid=(\d+)"#,
    )
});

static APP_ID_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?i)data-appid\s*=\s*["'](\d+)["']"#));

static APP_LINK_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"/app/(\d+)"));

static TITLE_ELEMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"(?is)<(?:div|h1)\b[^>]*class\s*=\s*["'][^"']*\b(?:workshopItemTitle|collectionTitle)\b[^"']*["'][^>]*>\s*([^<]+?)\s*<"#,
    )
});

static OG_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"(?is)<meta\s+[^>]*property\s*=\s*["']og:title["'][^>]*content\s*=\s*["']([^"']+)["']"#,
    )
});

/// The member list container only collection pages render.
static COLLECTION_CHILDREN_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?i)class\s*=\s*["'][^"']*\bcollectionChildren\b"#)
});

/// Extraction rules applied to a fetched Workshop page.
pub trait PageExtractor: Send + Sync {
    /// Returns member item ids in page order, deduplicated, excluding the
    /// collection's own id.
    fn member_ids(&self, html: &str, collection_id: &WorkshopId) -> Vec<WorkshopId>;

    /// Returns the game's app id if the page exposes one.
    fn app_id(&self, html: &str) -> Option<String>;

    /// Returns the human-readable page title if present.
    fn title(&self, html: &str) -> Option<String>;

    /// Returns true when the page renders a collection rather than one item.
    ///
    /// Item pages also link to other items (required items, related
    /// uploads), so links alone do not make a collection.
    fn is_collection_page(&self, html: &str) -> bool;
}

/// Extractor for `steamcommunity.com` markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct SteamCommunityExtractor;

impl PageExtractor for SteamCommunityExtractor {
    fn member_ids(&self, html: &str, collection_id: &WorkshopId) -> Vec<WorkshopId> {
        let mut seen = HashSet::new();
        MEMBER_LINK_RE
            .captures_iter(html)
            .filter_map(|caps| caps.get(1))
            .filter_map(|m| WorkshopId::parse(m.as_str()))
            .filter(|id| id != collection_id)
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }

    fn app_id(&self, html: &str) -> Option<String> {
        first_capture(html, &APP_ID_ATTR_RE).or_else(|| first_capture(html, &APP_LINK_RE))
    }

    fn title(&self, html: &str) -> Option<String> {
        first_capture(html, &TITLE_ELEMENT_RE)
            .or_else(|| first_capture(html, &OG_TITLE_RE))
            .map(|raw| decode_entities(&raw))
            .filter(|title| !title.is_empty())
    }

    fn is_collection_page(&self, html: &str) -> bool {
        COLLECTION_CHILDREN_RE.is_match(html)
    }
}

fn first_capture(html: &str, regex: &Regex) -> Option<String> {
    regex
        .captures(html)
        .and_then(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
}

/// Decodes the handful of entities Steam emits in titles.
fn decode_entities(raw: &str) -> String {
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

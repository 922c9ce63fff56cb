//! Input parsing for Workshop links and bare item ids.
//!
//! Raw text may mix item links, collection links, bare numeric ids and
//! arbitrary garbage. Garbage is tolerated and reported as skipped; only an
//! input with no recognizable identifier at all is an error.
//!
//! # Example
//!
//! ```
//! use workshop_core::parser::{parse_input, RefKind};
//!
//! let result = parse_input("see https://steamcommunity.com/workshop/filedetails/?id=999").unwrap();
//! assert_eq!(result.len(), 1);
//! assert_eq!(result.refs[0].kind(), RefKind::Collection);
//! ```

mod error;
mod input;
mod link;

pub use error::ParseError;
pub use input::{CollectionRef, ItemRef, ParseResult, RefKind, WorkshopId, WorkshopRef};
pub use link::{TokenMatch, classify_token, extract_refs};

use tracing::{debug, info};

/// Parses raw text input into Workshop references.
///
/// # Behavior
///
/// - Tokens are split on whitespace and line breaks
/// - Collection links (`/workshop/filedetails/?id=N`) become [`WorkshopRef::Collection`]
/// - Item links (`/sharedfiles/filedetails/?id=N`) and bare ids become [`WorkshopRef::Item`]
/// - Unrecognized tokens are collected in [`ParseResult::skipped`]
///
/// # Errors
///
/// Returns [`ParseError::NoValidIdentifiers`] when the whole input yields no
/// reference, including empty input.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse_input(input: &str) -> Result<ParseResult, ParseError> {
    if input.trim().is_empty() {
        debug!("Empty input provided");
        return Err(ParseError::NoValidIdentifiers { skipped: 0 });
    }

    let result = extract_refs(input);

    if result.is_empty() {
        return Err(ParseError::NoValidIdentifiers {
            skipped: result.skipped_count(),
        });
    }

    info!(
        items = result.items().count(),
        collections = result.collections().count(),
        skipped = result.skipped_count(),
        "Parsing complete"
    );

    Ok(result)
}

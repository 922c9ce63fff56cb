//! Error types for input parsing operations.

use thiserror::Error;

/// Errors that can occur during input parsing.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// Input contained no Workshop link or numeric id at all
    #[error(
        "no Workshop item or collection found in input ({skipped} unrecognized tokens)\n  Suggestion: pass a steamcommunity.com/sharedfiles/filedetails/?id=... link, a collection link, or a bare numeric id"
    )]
    NoValidIdentifiers {
        /// How many tokens were inspected and rejected
        skipped: usize,
    },
}

//! Per-item download outcomes.

use serde::Serialize;

use crate::parser::WorkshopId;
use crate::plan::SourceKind;

/// Final status of one work unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeStatus {
    /// Content placed under the destination.
    Success,
    /// Attempts exhausted, or never started.
    Failed,
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// What happened to one work unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// Item id.
    pub id: WorkshopId,
    /// How the item entered the plan.
    pub source: SourceKind,
    /// Final status.
    pub status: OutcomeStatus,
    /// Attempts made; 0 when the unit never started.
    pub attempts: u32,
    /// Reason of the last failed attempt.
    pub last_error: Option<String>,
}

impl Outcome {
    /// Creates a successful outcome.
    #[must_use]
    pub fn succeeded(id: WorkshopId, source: SourceKind, attempts: u32) -> Self {
        Self {
            id,
            source,
            status: OutcomeStatus::Success,
            attempts,
            last_error: None,
        }
    }

    /// Creates a failed outcome.
    #[must_use]
    pub fn failed(
        id: WorkshopId,
        source: SourceKind,
        attempts: u32,
        error: impl Into<String>,
    ) -> Self {
        Self {
            id,
            source,
            status: OutcomeStatus::Failed,
            attempts,
            last_error: Some(error.into()),
        }
    }

    /// Returns true for [`OutcomeStatus::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Outcomes in work list order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OutcomeList {
    outcomes: Vec<Outcome>,
}

impl OutcomeList {
    /// Wraps outcomes that are already in work list order.
    #[must_use]
    pub fn new(outcomes: Vec<Outcome>) -> Self {
        Self { outcomes }
    }

    /// Iterates outcomes in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Outcome> {
        self.outcomes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of successful outcomes.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of failed outcomes.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Iterates the failed outcomes in order.
    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// True when every outcome succeeded (vacuously true when empty).
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(Outcome::is_success)
    }

    /// Looks up the outcome for `id`.
    #[must_use]
    pub fn get(&self, id: &WorkshopId) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| &o.id == id)
    }
}

impl<'a> IntoIterator for &'a OutcomeList {
    type Item = &'a Outcome;
    type IntoIter = std::slice::Iter<'a, Outcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}

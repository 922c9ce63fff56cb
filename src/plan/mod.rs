//! Download planning: merging direct items and resolved collections into one
//! ordered, deduplicated work list.
//!
//! Ordering follows input order, and within a collection the order returned by
//! the resolver. The first occurrence of an id wins; later sightings are
//! dropped. A collection that fails to resolve is recorded and planning
//! continues with the remaining references.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::parser::{WorkshopId, WorkshopRef};
use crate::resolver::{CollectionSource, ResolveError, ResolvedCollection};

/// How a unit entered the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    /// Requested directly as an item link or bare id.
    Direct,
    /// Member of a resolved collection.
    FromCollection {
        /// The collection that contributed this item.
        collection_id: WorkshopId,
    },
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::FromCollection { collection_id } => write!(f, "collection {collection_id}"),
        }
    }
}

/// One item scheduled for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkUnit {
    /// Item id.
    pub id: WorkshopId,
    /// How the item entered the plan.
    pub source: SourceKind,
}

impl WorkUnit {
    /// Creates a unit for a directly requested item.
    #[must_use]
    pub fn direct(id: WorkshopId) -> Self {
        Self {
            id,
            source: SourceKind::Direct,
        }
    }

    /// Creates a unit for a collection member.
    #[must_use]
    pub fn from_collection(id: WorkshopId, collection_id: WorkshopId) -> Self {
        Self {
            id,
            source: SourceKind::FromCollection { collection_id },
        }
    }
}

/// Ordered work units, unique by id.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct WorkList {
    units: Vec<WorkUnit>,
    #[serde(skip)]
    seen: HashSet<WorkshopId>,
}

impl WorkList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `unit` unless its id is already present. Returns true if added.
    pub fn push_unique(&mut self, unit: WorkUnit) -> bool {
        if !self.seen.insert(unit.id.clone()) {
            return false;
        }
        self.units.push(unit);
        true
    }

    /// Returns true if `id` is already planned.
    #[must_use]
    pub fn contains(&self, id: &WorkshopId) -> bool {
        self.seen.contains(id)
    }

    /// Returns the number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true if nothing is planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Iterates units in plan order.
    pub fn iter(&self) -> std::slice::Iter<'_, WorkUnit> {
        self.units.iter()
    }

    /// Returns the units as a slice.
    #[must_use]
    pub fn units(&self) -> &[WorkUnit] {
        &self.units
    }
}

impl FromIterator<WorkUnit> for WorkList {
    fn from_iter<T: IntoIterator<Item = WorkUnit>>(iter: T) -> Self {
        let mut list = Self::new();
        for unit in iter {
            list.push_unique(unit);
        }
        list
    }
}

impl<'a> IntoIterator for &'a WorkList {
    type Item = &'a WorkUnit;
    type IntoIter = std::slice::Iter<'a, WorkUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}

/// A collection that could not be expanded.
#[derive(Debug, Clone)]
pub struct PlanningFailure {
    /// Collection id.
    pub collection_id: WorkshopId,
    /// Why resolution failed.
    pub error: ResolveError,
}

/// Result of planning: the work list plus everything that did not make it in.
#[derive(Debug, Default)]
pub struct PlanOutcome {
    /// Units to download.
    pub work_list: WorkList,
    /// Collections that failed to resolve.
    pub failures: Vec<PlanningFailure>,
    /// Collections that resolved, in input order.
    pub collections: Vec<ResolvedCollection>,
    /// Requested ids dropped because they are excluded.
    pub excluded: Vec<WorkshopId>,
}

impl PlanOutcome {
    /// First app id found on a resolved collection page.
    #[must_use]
    pub fn detected_app_id(&self) -> Option<&str> {
        self.collections.iter().find_map(|c| c.app_id.as_deref())
    }
}

/// Builds a [`WorkList`] from parsed references.
#[derive(Debug, Clone, Default)]
pub struct DownloadPlanner {
    excluded: HashSet<WorkshopId>,
}

impl DownloadPlanner {
    /// Creates a planner with no exclusions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a planner that never schedules the given ids.
    #[must_use]
    pub fn with_exclusions(excluded: impl IntoIterator<Item = WorkshopId>) -> Self {
        Self {
            excluded: excluded.into_iter().collect(),
        }
    }

    /// Plans downloads for `refs`, resolving collections through `source`.
    ///
    /// Collections are resolved one at a time, in input order. Item links are
    /// checked with the source too, since the Workshop also serves collections
    /// under `sharedfiles` URLs.
    #[instrument(skip(self, refs, source), fields(refs = refs.len()))]
    pub async fn plan(&self, refs: &[WorkshopRef], source: &dyn CollectionSource) -> PlanOutcome {
        let mut outcome = PlanOutcome::default();

        for reference in refs {
            match reference {
                WorkshopRef::Item(item) if item.from_link => {
                    match source.expand_item_link(item).await {
                        Ok(Some(resolved)) => self.schedule_collection(&mut outcome, resolved),
                        Ok(None) => {
                            self.schedule(&mut outcome, WorkUnit::direct(item.id.clone()));
                        }
                        Err(error) => {
                            warn!(
                                item_id = %item.id,
                                error = %error,
                                "Could not inspect item page; downloading it as a single item"
                            );
                            self.schedule(&mut outcome, WorkUnit::direct(item.id.clone()));
                        }
                    }
                }
                WorkshopRef::Item(item) => {
                    self.schedule(&mut outcome, WorkUnit::direct(item.id.clone()));
                }
                WorkshopRef::Collection(collection) => match source.resolve(collection).await {
                    Ok(resolved) => self.schedule_collection(&mut outcome, resolved),
                    Err(error) => {
                        warn!(
                            collection_id = %collection.id,
                            error = %error,
                            "Collection could not be resolved; continuing with remaining input"
                        );
                        outcome.failures.push(PlanningFailure {
                            collection_id: collection.id.clone(),
                            error,
                        });
                    }
                },
            }
        }

        info!(
            units = outcome.work_list.len(),
            failures = outcome.failures.len(),
            excluded = outcome.excluded.len(),
            "Planning complete"
        );

        outcome
    }

    fn schedule_collection(&self, outcome: &mut PlanOutcome, resolved: ResolvedCollection) {
        debug!(
            collection_id = %resolved.id,
            members = resolved.members.len(),
            "scheduling collection members"
        );
        for member in &resolved.members {
            self.schedule(
                outcome,
                WorkUnit::from_collection(member.id.clone(), resolved.id.clone()),
            );
        }
        outcome.collections.push(resolved);
    }

    fn schedule(&self, outcome: &mut PlanOutcome, unit: WorkUnit) {
        if self.excluded.contains(&unit.id) {
            if !outcome.excluded.contains(&unit.id) {
                debug!(item_id = %unit.id, "skipping excluded item");
                outcome.excluded.push(unit.id);
            }
            return;
        }
        let id = unit.id.clone();
        if !outcome.work_list.push_unique(unit) {
            debug!(item_id = %id, "duplicate item already planned");
        }
    }
}

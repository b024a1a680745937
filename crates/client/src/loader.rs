//! Initial load of the roster and the unit's catalog.

use std::collections::{HashMap, HashSet};

use ikd_core::catalog::{Activity, CatalogTree, ContentRule};
use ikd_core::roles::Role;
use ikd_core::roster::Lecturer;
use ikd_core::types::DbId;
use ikd_core::units::UnitKerja;

use crate::api::ApiError;
use crate::backend::IkdBackend;

/// Upper bound on parent lookup rounds. Catalog trees are a handful of
/// levels deep; the bound stops a malformed chain from looping.
pub const MAX_PARENT_DEPTH: usize = 8;

pub struct LoadedPage {
    pub roster: Vec<Lecturer>,
    pub catalog: CatalogTree,
    /// Entries fetched from outside the page to resolve parents.
    pub parent_lookup_size: usize,
}

/// Fetch lecturers and the catalog page concurrently, then close the
/// parent chain and build the tree.
pub async fn load_roster_and_catalog(
    backend: &dyn IkdBackend,
    unit: UnitKerja,
    rule: ContentRule,
) -> Result<LoadedPage, ApiError> {
    let (roster, page) =
        futures::try_join!(backend.list_users(&Role::Dosen), backend.list_catalog(unit))?;

    let lookup = fetch_parent_closure(backend, &page).await?;
    let parent_lookup_size = lookup.len();
    tracing::info!(
        unit = %unit,
        lecturers = roster.len(),
        activities = page.len(),
        parent_lookup_size,
        "Roster and catalog loaded",
    );

    Ok(LoadedPage {
        roster,
        catalog: CatalogTree::build(page, lookup, rule),
        parent_lookup_size,
    })
}

/// Batch-fetch every `parent_id` reachable from `page` that is not on the
/// page itself.
///
/// Each round requests only ids never requested before. Ids the backend
/// does not know are simply absent from the result.
pub async fn fetch_parent_closure(
    backend: &dyn IkdBackend,
    page: &[Activity],
) -> Result<Vec<Activity>, ApiError> {
    let known: HashSet<DbId> = page.iter().map(|a| a.id).collect();
    let mut requested: HashSet<DbId> = HashSet::new();
    let mut fetched: HashMap<DbId, Activity> = HashMap::new();

    let mut frontier = missing_parents(page.iter(), &known, &requested);
    let mut depth = 0;
    while !frontier.is_empty() {
        if depth == MAX_PARENT_DEPTH {
            tracing::warn!(
                pending = frontier.len(),
                "Parent chain deeper than {MAX_PARENT_DEPTH} levels, stopping lookup",
            );
            break;
        }
        depth += 1;

        requested.extend(frontier.iter().copied());
        let batch = backend.lookup_catalog(&frontier).await?;
        let new_ids: Vec<DbId> = batch.iter().map(|a| a.id).collect();
        for activity in batch {
            fetched.entry(activity.id).or_insert(activity);
        }

        let reachable = new_ids.iter().filter_map(|id| fetched.get(id));
        let seen: HashSet<DbId> = known.iter().chain(fetched.keys()).copied().collect();
        frontier = missing_parents(reachable, &seen, &requested);
    }

    let mut lookup: Vec<Activity> = fetched.into_values().collect();
    lookup.sort_by_key(|a| a.id);
    Ok(lookup)
}

fn missing_parents<'a>(
    activities: impl Iterator<Item = &'a Activity>,
    known: &HashSet<DbId>,
    requested: &HashSet<DbId>,
) -> Vec<DbId> {
    let mut ids: Vec<DbId> = activities
        .filter_map(|a| a.parent_id)
        .filter(|id| !known.contains(id) && !requested.contains(id))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

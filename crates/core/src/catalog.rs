//! Activity catalog (*pedoman*) and the parent-indicator resolver.
//!
//! A [`CatalogTree`] is built once per catalog load from the unit's page
//! plus any parent entries fetched from other pages. Each node gets at most
//! one parent edge:
//!
//! 1. its explicit `parent_id`, when that entry is known, otherwise
//! 2. the entry of the same unit whose numbering token is the node's
//!    parent token (`5.1.a -> 5.1`).
//!
//! Resolving a parent indicator is then a plain walk along those edges.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::numbering::NumberingToken;
use crate::types::DbId;
use crate::units::UnitKerja;

/// A scorable activity with a weight and hierarchical numbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: DbId,
    /// Display label with the numbering token up front, e.g. `"1.1.a ..."`.
    #[serde(rename = "kegiatan")]
    pub label: String,
    #[serde(rename = "indeks_poin", default)]
    pub weight: f64,
    #[serde(rename = "prosedur", default)]
    pub procedure: Option<String>,
    #[serde(rename = "bukti_penugasan", default)]
    pub evidence_description: Option<String>,
    /// Free-text name of the unit that carries the activity out.
    #[serde(rename = "pelaksana", default)]
    pub owning_unit: Option<String>,
    #[serde(default)]
    pub parent_id: Option<DbId>,
    #[serde(default)]
    pub level: i32,
    pub unit_kerja: UnitKerja,
}

/// How a weight counts towards "has content".
///
/// Two rules were in use for the same predicate; both are kept and the
/// caller picks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentRule {
    /// `indeks_poin > 0`.
    #[default]
    PositiveWeight,
    /// Any non-zero weight, negative included.
    NonZeroWeight,
}

impl ContentRule {
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(ContentRule::PositiveWeight),
            "nonzero" => Ok(ContentRule::NonZeroWeight),
            other => Err(CoreError::Validation(format!(
                "Unknown content rule '{other}'. Must be one of: positive, nonzero"
            ))),
        }
    }

    fn weight_counts(self, weight: f64) -> bool {
        match self {
            ContentRule::PositiveWeight => weight > 0.0,
            ContentRule::NonZeroWeight => weight != 0.0 && !weight.is_nan(),
        }
    }
}

fn non_blank(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

impl Activity {
    /// Weighted, or carrying any of owning unit / evidence description /
    /// procedure.
    pub fn has_content(&self, rule: ContentRule) -> bool {
        rule.weight_counts(self.weight)
            || non_blank(&self.owning_unit)
            || non_blank(&self.evidence_description)
            || non_blank(&self.procedure)
    }

    pub fn numbering(&self) -> Option<NumberingToken> {
        NumberingToken::parse(&self.label)
    }
}

/// Result of [`CatalogTree::parent_indicator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentIndicator {
    Activity { id: DbId, label: String },
    /// No qualifying ancestor. Rendered as `"-"`.
    None,
}

impl ParentIndicator {
    pub fn label(&self) -> Option<&str> {
        match self {
            ParentIndicator::Activity { label, .. } => Some(label),
            ParentIndicator::None => None,
        }
    }
}

impl fmt::Display for ParentIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentIndicator::Activity { label, .. } => f.write_str(label),
            ParentIndicator::None => f.write_str("-"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogTree {
    nodes: HashMap<DbId, Activity>,
    parents: HashMap<DbId, DbId>,
    /// Ids of the unit page, in backend order.
    page: Vec<DbId>,
    rule: ContentRule,
}

impl CatalogTree {
    /// Build the tree from a unit page plus the parent lookup map.
    ///
    /// Lookup entries never replace page entries with the same id. When two
    /// entries of one unit share a numbering token, the first one seen is
    /// the fallback target.
    pub fn build(
        page: Vec<Activity>,
        lookup: impl IntoIterator<Item = Activity>,
        rule: ContentRule,
    ) -> Self {
        let mut nodes = HashMap::with_capacity(page.len());
        let mut order = Vec::with_capacity(page.len());
        for activity in page {
            if nodes.contains_key(&activity.id) {
                continue;
            }
            order.push(activity.id);
            nodes.insert(activity.id, activity);
        }
        for activity in lookup {
            nodes.entry(activity.id).or_insert(activity);
        }

        // Page entries are indexed before lookup entries so they win ties.
        let mut by_token: HashMap<(UnitKerja, NumberingToken), DbId> = HashMap::new();
        let page_ids: HashSet<DbId> = order.iter().copied().collect();
        let mut lookup_ids: Vec<DbId> = nodes
            .keys()
            .filter(|id| !page_ids.contains(*id))
            .copied()
            .collect();
        lookup_ids.sort_unstable();
        let indexed: Vec<DbId> = order.iter().copied().chain(lookup_ids).collect();
        for id in &indexed {
            let activity = &nodes[id];
            if let Some(token) = activity.numbering() {
                by_token.entry((activity.unit_kerja, token)).or_insert(*id);
            }
        }

        let mut parents = HashMap::new();
        for id in &indexed {
            let activity = &nodes[id];
            let explicit = activity
                .parent_id
                .filter(|pid| *pid != activity.id && nodes.contains_key(pid));
            let edge = explicit.or_else(|| {
                let parent_token = activity.numbering()?.parent()?;
                by_token
                    .get(&(activity.unit_kerja, parent_token))
                    .copied()
                    .filter(|pid| *pid != activity.id)
            });
            if let Some(pid) = edge {
                parents.insert(*id, pid);
            }
        }

        Self {
            nodes,
            parents,
            page: order,
            rule,
        }
    }

    pub fn rule(&self) -> ContentRule {
        self.rule
    }

    pub fn get(&self, id: DbId) -> Option<&Activity> {
        self.nodes.get(&id)
    }

    /// Activities of the unit page in backend order.
    pub fn page(&self) -> impl Iterator<Item = &Activity> {
        self.page.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn page_len(&self) -> usize {
        self.page.len()
    }

    pub fn parent_of(&self, id: DbId) -> Option<&Activity> {
        self.parents.get(&id).and_then(|pid| self.nodes.get(pid))
    }

    /// Proper ancestors nearest first. Stops on a cycle.
    pub fn ancestors(&self, id: DbId) -> Vec<&Activity> {
        let mut seen = HashSet::from([id]);
        let mut out = Vec::new();
        let mut current = id;
        while let Some(pid) = self.parents.get(&current).copied() {
            if !seen.insert(pid) {
                break;
            }
            match self.nodes.get(&pid) {
                Some(parent) => out.push(parent),
                None => break,
            }
            current = pid;
        }
        out
    }

    /// Outermost ancestor, or the activity itself when it has none.
    pub fn root_of(&self, id: DbId) -> Option<&Activity> {
        self.ancestors(id)
            .last()
            .copied()
            .or_else(|| self.nodes.get(&id))
    }

    /// The structurally related activity named in the info popup.
    ///
    /// * content + top-level token: `None`.
    /// * content: nearest ancestor without content.
    /// * no content: nearest ancestor with content.
    pub fn parent_indicator(&self, id: DbId) -> Result<ParentIndicator, CoreError> {
        let activity = self.nodes.get(&id).ok_or(CoreError::NotFound {
            entity: "Activity",
            id,
        })?;
        let has_content = activity.has_content(self.rule);

        if has_content && activity.numbering().is_some_and(|t| t.is_top_level()) {
            return Ok(ParentIndicator::None);
        }

        Ok(self
            .ancestors(id)
            .into_iter()
            .find(|a| a.has_content(self.rule) != has_content)
            .map(|a| ParentIndicator::Activity {
                id: a.id,
                label: a.label.clone(),
            })
            .unwrap_or(ParentIndicator::None))
    }
}

//! In-memory report aggregate handed to the exporters.
//!
//! Contribution of one evidence record = activity weight × score. Only
//! records with a strictly positive score contribute and only those are
//! counted as activities.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::catalog::CatalogTree;
use crate::evidence::Evidence;
use crate::roster::Lecturer;
use crate::types::{DbId, Timestamp};
use crate::units::UnitKerja;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitSummary {
    pub unit: UnitKerja,
    pub total: f64,
    pub activity_count: usize,
}

/// Subtotal under one top-level catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySubtotal {
    pub category_id: DbId,
    pub label: String,
    pub total: f64,
    pub activity_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LecturerSummary {
    pub lecturer_id: DbId,
    pub name: String,
    pub nidn: Option<String>,
    pub per_unit: BTreeMap<UnitKerja, f64>,
    pub activity_count: usize,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportAggregate {
    pub generated_at: Timestamp,
    pub units: Vec<UnitSummary>,
    pub categories: Vec<CategorySubtotal>,
    pub lecturers: Vec<LecturerSummary>,
    pub grand_total: f64,
    /// Scored evidence whose activity is missing from the catalog.
    pub unmatched_evidence: usize,
}

impl ReportAggregate {
    /// Aggregate `evidence` against `catalog` for the lecturers in `roster`.
    ///
    /// Every roster lecturer gets a row, scored or not. Scored evidence of
    /// lecturers outside the roster still counts towards unit, category and
    /// grand totals and gets a trailing row of its own.
    pub fn build(catalog: &CatalogTree, roster: &[Lecturer], evidence: &[Evidence]) -> Self {
        let mut units: BTreeMap<UnitKerja, UnitSummary> = BTreeMap::new();
        for activity in catalog.page() {
            units.entry(activity.unit_kerja).or_insert(UnitSummary {
                unit: activity.unit_kerja,
                total: 0.0,
                activity_count: 0,
            });
        }

        let mut categories: Vec<CategorySubtotal> = Vec::new();
        let mut category_index: HashMap<DbId, usize> = HashMap::new();

        let mut lecturers: Vec<LecturerSummary> = roster
            .iter()
            .map(|l| LecturerSummary {
                lecturer_id: l.id,
                name: l.name.clone(),
                nidn: l.nidn.clone(),
                per_unit: BTreeMap::new(),
                activity_count: 0,
                total: 0.0,
            })
            .collect();
        let mut lecturer_index: HashMap<DbId, usize> = lecturers
            .iter()
            .enumerate()
            .map(|(i, l)| (l.lecturer_id, i))
            .collect();

        let mut grand_total = 0.0;
        let mut unmatched_evidence = 0;

        for record in evidence {
            let Some(score) = record.positive_score() else {
                continue;
            };
            let Some(activity) = catalog.get(record.activity_id) else {
                unmatched_evidence += 1;
                continue;
            };
            let contribution = activity.weight * score;
            grand_total += contribution;

            let unit = units.entry(record.unit_kerja).or_insert(UnitSummary {
                unit: record.unit_kerja,
                total: 0.0,
                activity_count: 0,
            });
            unit.total += contribution;
            unit.activity_count += 1;

            let root = catalog.root_of(activity.id).unwrap_or(activity);
            let idx = *category_index.entry(root.id).or_insert_with(|| {
                categories.push(CategorySubtotal {
                    category_id: root.id,
                    label: root.label.clone(),
                    total: 0.0,
                    activity_count: 0,
                });
                categories.len() - 1
            });
            categories[idx].total += contribution;
            categories[idx].activity_count += 1;

            let idx = *lecturer_index
                .entry(record.lecturer_id)
                .or_insert_with(|| {
                    lecturers.push(LecturerSummary {
                        lecturer_id: record.lecturer_id,
                        name: format!("Dosen #{}", record.lecturer_id),
                        nidn: None,
                        per_unit: BTreeMap::new(),
                        activity_count: 0,
                        total: 0.0,
                    });
                    lecturers.len() - 1
                });
            let row = &mut lecturers[idx];
            *row.per_unit.entry(record.unit_kerja).or_insert(0.0) += contribution;
            row.activity_count += 1;
            row.total += contribution;
        }

        // Category order follows the catalog page, then first appearance.
        let page_pos: HashMap<DbId, usize> = catalog
            .page()
            .enumerate()
            .map(|(i, a)| (a.id, i))
            .collect();
        categories.sort_by_key(|c| page_pos.get(&c.category_id).copied().unwrap_or(usize::MAX));

        Self {
            generated_at: chrono::Utc::now(),
            units: units.into_values().collect(),
            categories,
            lecturers,
            grand_total,
            unmatched_evidence,
        }
    }

    /// Units as report columns, in report order.
    pub fn unit_columns(&self) -> Vec<UnitKerja> {
        self.units.iter().map(|u| u.unit).collect()
    }

    pub fn total_activity_count(&self) -> usize {
        self.units.iter().map(|u| u.activity_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Activity, ContentRule};

    fn activity(id: DbId, label: &str, weight: f64, parent: Option<DbId>) -> Activity {
        Activity {
            id,
            label: label.to_string(),
            weight,
            procedure: None,
            evidence_description: None,
            owning_unit: None,
            parent_id: parent,
            level: 0,
            unit_kerja: UnitKerja::Akademik,
        }
    }

    fn evidence(id: DbId, lecturer: DbId, activity: DbId, score: Option<f64>) -> Evidence {
        Evidence {
            id,
            lecturer_id: lecturer,
            activity_id: activity,
            unit_kerja: UnitKerja::Akademik,
            file_name: format!("{id}.pdf"),
            file_url: None,
            score,
            uploaded_at: None,
        }
    }

    #[test]
    fn categories_follow_roots() {
        let tree = CatalogTree::build(
            vec![
                activity(1, "1 Pendidikan", 0.0, None),
                activity(2, "1.1 Mengajar", 2.0, Some(1)),
                activity(3, "2 Penelitian", 0.0, None),
                activity(4, "2.1 Publikasi", 4.0, Some(3)),
            ],
            Vec::new(),
            ContentRule::default(),
        );
        let report = ReportAggregate::build(
            &tree,
            &[],
            &[
                evidence(10, 1, 4, Some(1.0)),
                evidence(11, 1, 2, Some(1.5)),
                evidence(12, 2, 2, Some(1.0)),
            ],
        );
        assert_eq!(report.categories.len(), 2);
        assert_eq!(report.categories[0].label, "1 Pendidikan");
        assert_eq!(report.categories[0].total, 5.0);
        assert_eq!(report.categories[0].activity_count, 2);
        assert_eq!(report.categories[1].total, 4.0);
        assert_eq!(report.grand_total, 9.0);
        // Both lecturers are outside the (empty) roster.
        assert_eq!(report.lecturers.len(), 2);
        assert_eq!(report.lecturers[0].name, "Dosen #1");
    }

    #[test]
    fn unknown_activity_is_reported_not_summed() {
        let tree = CatalogTree::build(
            vec![activity(1, "1", 1.0, None)],
            Vec::new(),
            ContentRule::default(),
        );
        let report = ReportAggregate::build(&tree, &[], &[evidence(1, 1, 99, Some(3.0))]);
        assert_eq!(report.grand_total, 0.0);
        assert_eq!(report.unmatched_evidence, 1);
    }
}

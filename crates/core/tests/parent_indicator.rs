//! Integration tests for the catalog parent-indicator resolver.
//!
//! Catalog pages here carry no `parent_id`, so every edge comes from the
//! numbering fallback unless a test sets one explicitly.

use ikd_core::catalog::{Activity, CatalogTree, ContentRule, ParentIndicator};
use ikd_core::types::DbId;
use ikd_core::units::UnitKerja;

fn activity(id: DbId, label: &str, weight: f64) -> Activity {
    Activity {
        id,
        label: label.to_string(),
        weight,
        procedure: None,
        evidence_description: None,
        owning_unit: None,
        parent_id: None,
        level: 0,
        unit_kerja: UnitKerja::Akademik,
    }
}

fn tree(page: Vec<Activity>) -> CatalogTree {
    CatalogTree::build(page, Vec::new(), ContentRule::default())
}

// ---------------------------------------------------------------------------
// Test: content child resolves to the nearest empty ancestor
// ---------------------------------------------------------------------------

#[test]
fn lettered_child_with_content_names_its_empty_parent() {
    let t = tree(vec![
        activity(1, "5 Pengabdian", 3.0),
        activity(2, "5.1 Penyuluhan", 0.0),
        activity(3, "5.1.a Penyuluhan tingkat lokal", 1.5),
    ]);

    assert_eq!(
        t.parent_indicator(3).unwrap(),
        ParentIndicator::Activity {
            id: 2,
            label: "5.1 Penyuluhan".to_string()
        }
    );
}

// ---------------------------------------------------------------------------
// Test: empty entry resolves to the nearest ancestor with content
// ---------------------------------------------------------------------------

#[test]
fn empty_entry_names_ancestor_with_content() {
    let t = tree(vec![
        activity(1, "5 Pengabdian", 3.0),
        activity(2, "5.1 Penyuluhan", 0.0),
        activity(3, "5.1.a Penyuluhan tingkat lokal", 1.5),
    ]);

    assert_eq!(t.parent_indicator(2).unwrap().label(), Some("5 Pengabdian"));
}

#[test]
fn empty_entry_without_content_ancestor_is_none() {
    let t = tree(vec![
        activity(1, "5 Pengabdian", 0.0),
        activity(2, "5.1 Penyuluhan", 0.0),
        activity(3, "5.1.a Penyuluhan tingkat lokal", 1.5),
    ]);

    assert_eq!(t.parent_indicator(2).unwrap(), ParentIndicator::None);
}

// ---------------------------------------------------------------------------
// Test: top-level activity with content short-circuits
// ---------------------------------------------------------------------------

#[test]
fn top_level_with_content_is_none_regardless_of_ancestors() {
    let mut seven = activity(7, "7 Penunjang", 2.0);
    // Even an explicit parent without content is ignored.
    seven.parent_id = Some(1);
    let t = tree(vec![activity(1, "1 Umum", 0.0), seven]);

    assert_eq!(t.parent_indicator(7).unwrap(), ParentIndicator::None);
}

#[test]
fn top_level_without_content_walks_nothing() {
    let t = tree(vec![activity(1, "1 Pendidikan", 0.0)]);
    assert_eq!(t.parent_indicator(1).unwrap(), ParentIndicator::None);
}

// ---------------------------------------------------------------------------
// Test: content via text fields, not only weight
// ---------------------------------------------------------------------------

#[test]
fn text_fields_count_as_content() {
    let mut mid = activity(2, "3.2 Seminar", 0.0);
    mid.evidence_description = Some("Sertifikat".into());
    let t = tree(vec![activity(1, "3 Penelitian", 0.0), mid, activity(3, "3.2.b Nasional", 0.0)]);

    // 3.2.b has no content, its parent 3.2 does.
    assert_eq!(t.parent_indicator(3).unwrap().label(), Some("3.2 Seminar"));
    // 3.2 has content; 3 has none.
    assert_eq!(t.parent_indicator(2).unwrap().label(), Some("3 Penelitian"));
}

// ---------------------------------------------------------------------------
// Test: skipping over ancestors that share the child's content state
// ---------------------------------------------------------------------------

#[test]
fn walk_skips_same_state_ancestors() {
    let t = tree(vec![
        activity(1, "4 Lain", 0.0),
        activity(2, "4.1 Kegiatan", 1.0),
        activity(3, "4.1.c Rinci", 2.0),
    ]);

    // 4.1.c and 4.1 both have content, so the walk continues to 4.
    assert_eq!(t.parent_indicator(3).unwrap().label(), Some("4 Lain"));
}

// ---------------------------------------------------------------------------
// Test: content rule selection
// ---------------------------------------------------------------------------

#[test]
fn content_rule_changes_resolution() {
    let page = vec![
        activity(1, "6 Tambahan", -1.0),
        activity(2, "6.1 Rinci", 0.0),
    ];

    let strict = CatalogTree::build(page.clone(), Vec::new(), ContentRule::PositiveWeight);
    assert_eq!(strict.parent_indicator(2).unwrap(), ParentIndicator::None);

    let loose = CatalogTree::build(page, Vec::new(), ContentRule::NonZeroWeight);
    assert_eq!(loose.parent_indicator(2).unwrap().label(), Some("6 Tambahan"));
}

//! Score edits racing the evidence poll.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;

use common::{backend, drain, evidence, open};
use ikd_client::{ClientError, PageEvent};
use ikd_core::error::CoreError;
use ikd_core::evidence::EvidenceKey;

// ---------------------------------------------------------------------------
// Test: a poll never overwrites the draft of a cell being edited
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn poll_leaves_active_draft_alone() {
    let fake = backend();
    fake.seed_evidence(evidence(1, 11, Some(1.0)));
    fake.seed_evidence(evidence(2, 11, Some(1.0)));
    let page = open(&fake).await;
    let busy = EvidenceKey::new(1, 11);
    let idle = EvidenceKey::new(2, 11);

    page.edit_score(busy, "3").unwrap();
    assert!(page.is_editing(&busy));

    // Someone else changes both scores on the server.
    fake.seed_evidence(evidence(1, 11, Some(2.0)));
    fake.seed_evidence(evidence(2, 11, Some(2.0)));
    page.poll_now().await.unwrap();

    assert_eq!(page.draft(&busy), "3");
    assert_eq!(page.draft(&idle), "2");

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!page.is_editing(&busy));
    assert_eq!(page.draft(&busy), "3");

    page.shutdown().await;
}

// ---------------------------------------------------------------------------
// Test: a committed value survives the next poll
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn committed_value_is_stable_across_polls() {
    let fake = backend();
    fake.seed_evidence(evidence(4, 12, None));
    let page = open(&fake).await;
    let key = EvidenceKey::new(4, 12);
    let mut rx = page.subscribe();

    page.edit_score(key, "2,5").unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(page.draft(&key), "2.5");
    assert!(drain(&mut rx)
        .contains(&PageEvent::ScoreCommitted { key, score: Some(2.5) }));

    page.poll_now().await.unwrap();
    assert_eq!(page.draft(&key), "2.5");
    assert_eq!(page.evidence(&key).unwrap().score, Some(2.5));
    assert_eq!(fake.score_update_count(), 1);

    page.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn clearing_a_score_normalizes_to_zero() {
    let fake = backend();
    fake.seed_evidence(evidence(4, 12, Some(3.0)));
    let page = open(&fake).await;
    let key = EvidenceKey::new(4, 12);

    page.edit_score(key, "").unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(page.draft(&key), "0");
    assert_eq!(fake.evidence()[0].score, None);

    page.shutdown().await;
}

// ---------------------------------------------------------------------------
// Test: failed commits revert the cell and alert
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn failed_commit_reverts_and_alerts() {
    let fake = backend();
    fake.seed_evidence(evidence(1, 11, Some(1.0)));
    let page = open(&fake).await;
    let key = EvidenceKey::new(1, 11);
    let mut rx = page.subscribe();
    fake.fail_next_score_updates(1);

    page.edit_score(key, "4").unwrap();
    assert_eq!(page.draft(&key), "4");
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(page.draft(&key), "1");
    assert!(drain(&mut rx)
        .iter()
        .any(|e| matches!(e, PageEvent::Alert { .. })));

    page.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn non_numeric_input_never_reaches_the_backend() {
    let fake = backend();
    fake.seed_evidence(evidence(1, 11, Some(1.0)));
    let page = open(&fake).await;
    let key = EvidenceKey::new(1, 11);

    page.edit_score(key, "abc").unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(fake.score_update_count(), 0);
    assert_eq!(page.draft(&key), "1");

    page.shutdown().await;
}

// ---------------------------------------------------------------------------
// Test: an edit whose evidence vanished is never sent
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn pending_edit_is_dropped_when_evidence_vanishes() {
    let fake = backend();
    fake.seed_evidence(evidence(1, 11, Some(1.0)));
    let page = open(&fake).await;
    let key = EvidenceKey::new(1, 11);
    let mut rx = page.subscribe();

    page.edit_score(key, "5").unwrap();
    fake.set_snapshot_override(Some(vec![]));
    page.poll_now().await.unwrap();
    assert!(page.evidence(&key).is_none());

    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(fake.score_update_count(), 0);
    assert_eq!(fake.evidence()[0].score, Some(1.0));
    assert!(!drain(&mut rx)
        .iter()
        .any(|e| matches!(e, PageEvent::Alert { .. } | PageEvent::ScoreCommitted { .. })));

    page.shutdown().await;
}

// ---------------------------------------------------------------------------
// Test: cells without evidence are read-only
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn editing_requires_evidence() {
    let fake = backend();
    let page = open(&fake).await;
    let key = EvidenceKey::new(3, 11);

    assert_matches!(
        page.edit_score(key, "2"),
        Err(ClientError::Core(CoreError::NoEvidence { .. }))
    );
    assert_eq!(page.draft(&key), "0");

    let row = page.row(3);
    assert_eq!(row.len(), 3);
    assert!(row.iter().all(|cell| !cell.editable && cell.draft == "0"));

    page.shutdown().await;
}

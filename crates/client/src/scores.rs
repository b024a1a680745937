//! Debounced score editing.
//!
//! Typing into a score cell only updates its draft. The draft is sent once
//! the cell has been quiet for the debounce delay; a newer keystroke
//! supersedes the pending send. Failures revert the cell and raise an
//! alert.

use std::sync::Arc;
use std::time::Duration;

use ikd_core::error::CoreError;
use ikd_core::evidence::{EvidenceKey, ScoreUpdate};
use ikd_core::score::parse_score_draft;
use ikd_core::units::UnitKerja;

use crate::backend::IkdBackend;
use crate::board::EvidenceBoard;
use crate::debounce::{Debouncer, Ticket};
use crate::events::{PageEvent, PageEvents};

/// Quiet period before a draft is sent.
pub const DEFAULT_SCORE_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct ScoreEditor {
    backend: Arc<dyn IkdBackend>,
    unit: UnitKerja,
    board: Arc<EvidenceBoard>,
    events: Arc<PageEvents>,
    debouncer: Debouncer<EvidenceKey>,
    delay: Duration,
}

impl ScoreEditor {
    pub fn new(
        backend: Arc<dyn IkdBackend>,
        unit: UnitKerja,
        board: Arc<EvidenceBoard>,
        events: Arc<PageEvents>,
        delay: Duration,
    ) -> Self {
        Self {
            backend,
            unit,
            board,
            events,
            debouncer: Debouncer::new(),
            delay,
        }
    }

    /// Record a keystroke for `key` and (re)arm its send timer.
    ///
    /// Cells without evidence are read-only.
    pub fn edit(&self, key: EvidenceKey, text: impl Into<String>) -> Result<(), CoreError> {
        if !self.board.contains(&key) {
            return Err(CoreError::NoEvidence {
                lecturer_id: key.lecturer_id,
                activity_id: key.activity_id,
            });
        }
        self.board.set_draft(key, text);

        let editor = self.clone();
        self.debouncer
            .schedule(key, self.delay, move |ticket| async move {
                editor.commit(ticket).await;
            });
        Ok(())
    }

    /// Whether `key` has a pending or in-flight edit. Polls leave the draft
    /// of such keys alone.
    pub fn is_editing(&self, key: &EvidenceKey) -> bool {
        self.debouncer.is_active(key)
    }

    pub fn pending(&self) -> usize {
        self.debouncer.active_count()
    }

    /// Drop a pending edit, e.g. because the evidence was deleted.
    pub fn cancel(&self, key: &EvidenceKey) {
        if self.debouncer.cancel(key) {
            tracing::debug!(key = %key, "Pending score edit cancelled");
        }
    }

    /// Cancel all pending edits. Sends already on the wire complete but
    /// later edits never fire.
    pub fn shutdown(&self) {
        self.debouncer.cancel_all();
    }

    async fn commit(&self, ticket: Ticket<EvidenceKey>) {
        let key = *ticket.key();
        let Some(draft) = self.board.pending_draft(&key) else {
            // Evidence vanished while the edit was pending.
            self.board.discard_draft(&key);
            tracing::debug!(key = %key, "Evidence gone, score edit dropped");
            return;
        };

        let score = match parse_score_draft(&draft) {
            Ok(score) => score,
            Err(e) => {
                tracing::warn!(key = %key, draft = %draft, error = %e, "Rejected score draft");
                if ticket.is_current() {
                    self.board.revert_draft(&key);
                }
                self.events.alert(e.to_string());
                return;
            }
        };

        let update = ScoreUpdate::new(key, self.unit, score);
        match self.backend.update_score(&update).await {
            Ok(confirmed) => {
                let score = confirmed.score;
                if self.board.confirm(confirmed, ticket.is_current()) {
                    tracing::debug!(key = %key, ?score, "Score saved");
                    self.events.publish(PageEvent::ScoreCommitted { key, score });
                }
            }
            Err(e) if e.is_unauthorized() => {
                tracing::warn!(key = %key, "Session expired while saving score");
                self.events.publish(PageEvent::LoggedOut);
            }
            Err(e) if !self.board.contains(&key) => {
                tracing::debug!(key = %key, error = %e, "Score send failed after evidence was removed");
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to save score");
                if ticket.is_current() {
                    self.board.revert_draft(&key);
                }
                self.events.alert(e.alert_message());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeBackend;
    use assert_matches::assert_matches;
    use ikd_core::evidence::Evidence;
    use std::collections::HashMap;

    fn setup(fake: Arc<FakeBackend>) -> (ScoreEditor, Arc<EvidenceBoard>, Arc<PageEvents>) {
        let board = Arc::new(EvidenceBoard::new());
        let events = Arc::new(PageEvents::default());
        let editor = ScoreEditor::new(
            fake,
            UnitKerja::Akademik,
            Arc::clone(&board),
            Arc::clone(&events),
            DEFAULT_SCORE_DEBOUNCE,
        );
        (editor, board, events)
    }

    fn seed(fake: &FakeBackend, board: &EvidenceBoard) -> EvidenceKey {
        let record = fake.seed_evidence(Evidence {
            id: 0,
            lecturer_id: 1,
            activity_id: 10,
            unit_kerja: UnitKerja::Akademik,
            file_name: "sk.pdf".into(),
            file_url: None,
            score: None,
            uploaded_at: None,
        });
        board.insert(record.clone());
        record.key()
    }

    #[tokio::test(start_paused = true)]
    async fn burst_sends_one_update() {
        let fake = Arc::new(FakeBackend::new());
        let (editor, board, _events) = setup(Arc::clone(&fake));
        let key = seed(&fake, &board);

        for text in ["1", "1,", "1,5"] {
            editor.edit(key, text).unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(fake.score_update_count(), 1);
        assert_eq!(board.draft(&key), "1.5");
        assert_eq!(fake.evidence()[0].score, Some(1.5));
        assert!(!editor.is_editing(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn edit_without_evidence_is_rejected() {
        let fake = Arc::new(FakeBackend::new());
        let (editor, _board, _events) = setup(fake);
        assert_matches!(
            editor.edit(EvidenceKey::new(9, 9), "3"),
            Err(CoreError::NoEvidence { lecturer_id: 9, activity_id: 9 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_draft_reverts_and_alerts() {
        let fake = Arc::new(FakeBackend::new());
        let (editor, board, events) = setup(Arc::clone(&fake));
        let key = seed(&fake, &board);
        let mut rx = events.subscribe();

        editor.edit(key, "-2").unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(fake.score_update_count(), 0);
        assert_eq!(board.draft(&key), "0");
        assert_matches!(rx.try_recv(), Ok(PageEvent::Alert { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn backend_failure_reverts_and_alerts() {
        let fake = Arc::new(FakeBackend::new());
        let (editor, board, events) = setup(Arc::clone(&fake));
        let key = seed(&fake, &board);
        let mut rx = events.subscribe();
        fake.fail_next_score_updates(1);

        editor.edit(key, "4").unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(board.draft(&key), "0");
        assert_matches!(rx.try_recv(), Ok(PageEvent::Alert { message }) if message.contains("skor gagal"));
    }

    #[tokio::test(start_paused = true)]
    async fn edit_is_dropped_when_evidence_vanishes() {
        let fake = Arc::new(FakeBackend::new());
        let (editor, board, events) = setup(Arc::clone(&fake));
        let key = seed(&fake, &board);
        let mut rx = events.subscribe();

        editor.edit(key, "5").unwrap();
        board.apply_snapshot(HashMap::new(), |k| editor.is_editing(k));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(fake.score_update_count(), 0);
        assert_eq!(fake.evidence()[0].score, None);
        assert_eq!(board.pending_draft(&key), None);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_drops_pending_edits() {
        let fake = Arc::new(FakeBackend::new());
        let (editor, board, _events) = setup(Arc::clone(&fake));
        let key = seed(&fake, &board);

        editor.edit(key, "2").unwrap();
        editor.shutdown();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fake.score_update_count(), 0);
    }
}

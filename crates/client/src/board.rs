//! The evidence map for one unit page plus the per-cell score drafts.
//!
//! The map is replaced wholesale by each poll. Drafts are what the score
//! cells display; they follow the map for idle cells and are left alone
//! for cells with an edit in flight.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ikd_core::evidence::{Evidence, EvidenceKey};
use ikd_core::score::{format_score, EMPTY_SCORE};

#[derive(Default)]
struct BoardState {
    evidence: HashMap<EvidenceKey, Evidence>,
    drafts: HashMap<EvidenceKey, String>,
}

#[derive(Default)]
pub struct EvidenceBoard {
    state: RwLock<BoardState>,
}

impl EvidenceBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BoardState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BoardState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn evidence(&self, key: &EvidenceKey) -> Option<Evidence> {
        self.read().evidence.get(key).cloned()
    }

    pub fn contains(&self, key: &EvidenceKey) -> bool {
        self.read().evidence.contains_key(key)
    }

    /// All records, ordered by key.
    pub fn evidence_snapshot(&self) -> Vec<Evidence> {
        let state = self.read();
        let mut records: Vec<Evidence> = state.evidence.values().cloned().collect();
        records.sort_by_key(Evidence::key);
        records
    }

    pub fn len(&self) -> usize {
        self.read().evidence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().evidence.is_empty()
    }

    /// Text shown in the score cell for `key`. A cell without evidence
    /// always shows `"0"`.
    pub fn draft(&self, key: &EvidenceKey) -> String {
        let state = self.read();
        match state.evidence.get(key) {
            None => EMPTY_SCORE.to_string(),
            Some(record) => state
                .drafts
                .get(key)
                .cloned()
                .unwrap_or_else(|| format_score(record.score)),
        }
    }

    /// Draft to send for `key`, or `None` once the key has no evidence.
    /// Unlike [`draft`](Self::draft) this never falls back to `"0"`.
    pub fn pending_draft(&self, key: &EvidenceKey) -> Option<String> {
        let state = self.read();
        let record = state.evidence.get(key)?;
        Some(
            state
                .drafts
                .get(key)
                .cloned()
                .unwrap_or_else(|| format_score(record.score)),
        )
    }

    /// Forget the draft of `key`.
    pub fn discard_draft(&self, key: &EvidenceKey) {
        self.write().drafts.remove(key);
    }

    pub fn set_draft(&self, key: EvidenceKey, text: impl Into<String>) {
        self.write().drafts.insert(key, text.into());
    }

    /// Replace the evidence map with a fresh snapshot.
    ///
    /// Drafts of idle keys are reset to the snapshot's score, and dropped
    /// when the key vanished. Drafts of active keys are not touched.
    pub fn apply_snapshot(
        &self,
        fresh: HashMap<EvidenceKey, Evidence>,
        is_active: impl Fn(&EvidenceKey) -> bool,
    ) {
        let mut state = self.write();
        state
            .drafts
            .retain(|key, _| fresh.contains_key(key) || is_active(key));
        for (key, record) in &fresh {
            if !is_active(key) {
                state.drafts.insert(*key, format_score(record.score));
            }
        }
        state.evidence = fresh;
    }

    /// Store a record confirmed by the backend.
    ///
    /// Ignored when the key left the map in the meantime, so a late score
    /// confirmation cannot resurrect deleted evidence. With
    /// `normalize_draft` the cell text is rewritten to the confirmed value.
    pub fn confirm(&self, record: Evidence, normalize_draft: bool) -> bool {
        let key = record.key();
        let mut state = self.write();
        if !state.evidence.contains_key(&key) {
            return false;
        }
        if normalize_draft {
            state.drafts.insert(key, format_score(record.score));
        }
        state.evidence.insert(key, record);
        true
    }

    /// Put the cell text back to the last confirmed score.
    pub fn revert_draft(&self, key: &EvidenceKey) {
        let mut state = self.write();
        let confirmed = state.evidence.get(key).map(|r| format_score(r.score));
        match confirmed {
            Some(text) => {
                state.drafts.insert(*key, text);
            }
            None => {
                state.drafts.remove(key);
            }
        }
    }

    /// Insert or replace a record, e.g. after an upload.
    pub fn insert(&self, record: Evidence) {
        let key = record.key();
        let mut state = self.write();
        state.drafts.insert(key, format_score(record.score));
        state.evidence.insert(key, record);
    }

    pub fn remove(&self, key: &EvidenceKey) -> Option<Evidence> {
        let mut state = self.write();
        state.drafts.remove(key);
        state.evidence.remove(key)
    }
}

//! In-memory [`IkdBackend`] for tests and offline runs.
//!
//! Mirrors the backend contract that matters to page logic: evidence is
//! upserted by `(lecturer, activity, unit)`, deleted-key markers are a set,
//! and list calls return whole snapshots. Failures can be injected per call
//! family.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use ikd_core::catalog::Activity;
use ikd_core::evidence::{DeletedKey, Evidence, EvidenceKey, ScoreUpdate};
use ikd_core::roles::Role;
use ikd_core::roster::Lecturer;
use ikd_core::types::DbId;
use ikd_core::units::UnitKerja;
use ikd_core::upload::UploadFile;

use crate::api::ApiError;
use crate::backend::IkdBackend;

#[derive(Default)]
struct FakeState {
    lecturers: Vec<Lecturer>,
    catalog: Vec<Activity>,
    evidence: Vec<Evidence>,
    files: HashMap<DbId, Vec<u8>>,
    deleted: HashSet<DeletedKey>,
    next_id: DbId,
    /// Served instead of the live evidence list while set.
    snapshot_override: Option<Vec<Evidence>>,
    fail_evidence_fetches: u32,
    fail_score_updates: u32,
    fail_uploads: u32,
    fail_unmarks: u32,
    /// Latency added to every score update.
    score_delay: Option<Duration>,
    unauthorized: bool,
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
    pub evidence_fetches: AtomicU64,
    pub score_updates: AtomicU64,
    pub catalog_lookups: AtomicU64,
}

fn server_error(message: &str) -> ApiError {
    ApiError::Api {
        status: 500,
        message: message.to_string(),
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn guard(&self) -> Result<MutexGuard<'_, FakeState>, ApiError> {
        let state = self.state();
        if state.unauthorized {
            return Err(ApiError::Unauthorized);
        }
        Ok(state)
    }

    pub fn with_lecturers(self, lecturers: Vec<Lecturer>) -> Self {
        self.state().lecturers = lecturers;
        self
    }

    /// Catalog entries for every unit; `list_catalog` filters by unit.
    pub fn with_catalog(self, catalog: Vec<Activity>) -> Self {
        self.state().catalog = catalog;
        self
    }

    /// Insert an evidence record as if uploaded earlier. Its id is
    /// reassigned.
    pub fn seed_evidence(&self, mut evidence: Evidence) -> Evidence {
        let mut state = self.state();
        state.next_id += 1;
        evidence.id = state.next_id;
        let key = (evidence.lecturer_id, evidence.activity_id, evidence.unit_kerja);
        state
            .evidence
            .retain(|e| (e.lecturer_id, e.activity_id, e.unit_kerja) != key);
        state.evidence.push(evidence.clone());
        evidence
    }

    pub fn seed_deleted_key(&self, marker: DeletedKey) {
        self.state().deleted.insert(marker);
    }

    /// Serve `snapshot` from `list_evidence` until cleared with `None`.
    pub fn set_snapshot_override(&self, snapshot: Option<Vec<Evidence>>) {
        self.state().snapshot_override = snapshot;
    }

    pub fn fail_next_evidence_fetches(&self, n: u32) {
        self.state().fail_evidence_fetches = n;
    }

    pub fn fail_next_score_updates(&self, n: u32) {
        self.state().fail_score_updates = n;
    }

    pub fn fail_next_uploads(&self, n: u32) {
        self.state().fail_uploads = n;
    }

    pub fn fail_next_unmarks(&self, n: u32) {
        self.state().fail_unmarks = n;
    }

    /// Keep score updates on the wire for `delay` before they are applied.
    pub fn delay_score_updates(&self, delay: Duration) {
        self.state().score_delay = Some(delay);
    }

    /// Every following call answers 401.
    pub fn expire_session(&self) {
        self.state().unauthorized = true;
    }

    pub fn evidence(&self) -> Vec<Evidence> {
        self.state().evidence.clone()
    }

    pub fn deleted_keys(&self) -> HashSet<DeletedKey> {
        self.state().deleted.clone()
    }

    pub fn evidence_fetch_count(&self) -> u64 {
        self.evidence_fetches.load(Ordering::SeqCst)
    }

    pub fn score_update_count(&self) -> u64 {
        self.score_updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IkdBackend for FakeBackend {
    async fn list_users(&self, role: &Role) -> Result<Vec<Lecturer>, ApiError> {
        let state = self.guard()?;
        match role {
            Role::Dosen => Ok(state.lecturers.clone()),
            _ => Ok(Vec::new()),
        }
    }

    async fn get_user(&self, id: DbId) -> Result<Lecturer, ApiError> {
        let state = self.guard()?;
        state
            .lecturers
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| ApiError::Api {
                status: 404,
                message: format!("User {id} tidak ditemukan"),
            })
    }

    async fn list_catalog(&self, unit: UnitKerja) -> Result<Vec<Activity>, ApiError> {
        let state = self.guard()?;
        Ok(state
            .catalog
            .iter()
            .filter(|a| a.unit_kerja == unit)
            .cloned()
            .collect())
    }

    async fn lookup_catalog(&self, ids: &[DbId]) -> Result<Vec<Activity>, ApiError> {
        self.catalog_lookups.fetch_add(1, Ordering::SeqCst);
        let state = self.guard()?;
        Ok(state
            .catalog
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn list_evidence(&self, unit: UnitKerja) -> Result<Vec<Evidence>, ApiError> {
        self.evidence_fetches.fetch_add(1, Ordering::SeqCst);
        let mut state = self.guard()?;
        if state.fail_evidence_fetches > 0 {
            state.fail_evidence_fetches -= 1;
            return Err(server_error("evidence snapshot unavailable"));
        }
        let source = state
            .snapshot_override
            .as_ref()
            .unwrap_or(&state.evidence);
        Ok(source
            .iter()
            .filter(|e| e.unit_kerja == unit)
            .cloned()
            .collect())
    }

    async fn upload_evidence(
        &self,
        key: EvidenceKey,
        unit: UnitKerja,
        file: &UploadFile,
    ) -> Result<Evidence, ApiError> {
        let mut state = self.guard()?;
        if state.fail_uploads > 0 {
            state.fail_uploads -= 1;
            return Err(server_error("upload gagal"));
        }

        let existing = state.evidence.iter_mut().find(|e| {
            e.lecturer_id == key.lecturer_id && e.activity_id == key.activity_id && e.unit_kerja == unit
        });
        let record = match existing {
            Some(record) => {
                record.file_name = file.file_name.clone();
                record.uploaded_at = Some(chrono::Utc::now());
                record.clone()
            }
            None => {
                state.next_id += 1;
                let record = Evidence {
                    id: state.next_id,
                    lecturer_id: key.lecturer_id,
                    activity_id: key.activity_id,
                    unit_kerja: unit,
                    file_name: file.file_name.clone(),
                    file_url: Some(format!("/bukti-fisik/{}/download", state.next_id)),
                    score: None,
                    uploaded_at: Some(chrono::Utc::now()),
                };
                state.evidence.push(record.clone());
                record
            }
        };
        state.files.insert(record.id, file.bytes.clone());
        Ok(record)
    }

    async fn delete_evidence(&self, id: DbId) -> Result<(), ApiError> {
        let mut state = self.guard()?;
        let before = state.evidence.len();
        state.evidence.retain(|e| e.id != id);
        if state.evidence.len() == before {
            return Err(ApiError::Api {
                status: 404,
                message: "Bukti fisik tidak ditemukan".to_string(),
            });
        }
        state.files.remove(&id);
        Ok(())
    }

    async fn download_evidence(&self, id: DbId) -> Result<Vec<u8>, ApiError> {
        let state = self.guard()?;
        state.files.get(&id).cloned().ok_or_else(|| ApiError::Api {
            status: 404,
            message: "File tidak ditemukan".to_string(),
        })
    }

    async fn update_score(&self, update: &ScoreUpdate) -> Result<Evidence, ApiError> {
        self.score_updates.fetch_add(1, Ordering::SeqCst);
        let delay = self.state().score_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.guard()?;
        if state.fail_score_updates > 0 {
            state.fail_score_updates -= 1;
            return Err(server_error("skor gagal disimpan"));
        }
        let record = state
            .evidence
            .iter_mut()
            .find(|e| {
                e.lecturer_id == update.dosen_id
                    && e.activity_id == update.pedoman_id
                    && e.unit_kerja == update.unit_kerja
            })
            .ok_or_else(|| ApiError::Api {
                status: 404,
                message: "Bukti fisik belum diunggah".to_string(),
            })?;
        record.score = update.skor;
        Ok(record.clone())
    }

    async fn list_deleted_keys(&self, unit: UnitKerja) -> Result<Vec<DeletedKey>, ApiError> {
        let state = self.guard()?;
        Ok(state
            .deleted
            .iter()
            .filter(|m| m.unit_kerja == unit)
            .copied()
            .collect())
    }

    async fn mark_deleted(&self, marker: &DeletedKey) -> Result<(), ApiError> {
        self.guard()?.deleted.insert(*marker);
        Ok(())
    }

    async fn unmark_deleted(&self, marker: &DeletedKey) -> Result<(), ApiError> {
        let mut state = self.guard()?;
        if state.fail_unmarks > 0 {
            state.fail_unmarks -= 1;
            return Err(server_error("penanda hapus gagal dibersihkan"));
        }
        state.deleted.remove(marker);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(lecturer: DbId, activity: DbId) -> Evidence {
        Evidence {
            id: 0,
            lecturer_id: lecturer,
            activity_id: activity,
            unit_kerja: UnitKerja::Akademik,
            file_name: "a.pdf".into(),
            file_url: None,
            score: None,
            uploaded_at: None,
        }
    }

    #[tokio::test]
    async fn upload_upserts_by_key() {
        let fake = FakeBackend::new();
        let key = EvidenceKey::new(1, 2);
        let first = fake
            .upload_evidence(key, UnitKerja::Akademik, &UploadFile::new("a.pdf", vec![1]))
            .await
            .unwrap();
        let second = fake
            .upload_evidence(key, UnitKerja::Akademik, &UploadFile::new("b.pdf", vec![2]))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(fake.evidence().len(), 1);
        assert_eq!(fake.download_evidence(first.id).await.unwrap(), vec![2]);

        // Same pair in another unit is a separate record.
        fake.upload_evidence(key, UnitKerja::Sdm, &UploadFile::new("c.pdf", vec![3]))
            .await
            .unwrap();
        assert_eq!(fake.evidence().len(), 2);
    }

    #[tokio::test]
    async fn score_update_requires_evidence() {
        let fake = FakeBackend::new();
        let update = ScoreUpdate::new(EvidenceKey::new(1, 1), UnitKerja::Akademik, Some(2.0));
        assert!(fake.update_score(&update).await.is_err());

        fake.seed_evidence(evidence(1, 1));
        let confirmed = fake.update_score(&update).await.unwrap();
        assert_eq!(confirmed.score, Some(2.0));
        assert_eq!(fake.score_update_count(), 2);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let fake = FakeBackend::new();
        fake.fail_next_evidence_fetches(1);
        assert!(fake.list_evidence(UnitKerja::Akademik).await.is_err());
        assert!(fake.list_evidence(UnitKerja::Akademik).await.is_ok());
        assert_eq!(fake.evidence_fetch_count(), 2);
    }

    #[tokio::test]
    async fn expired_session_answers_unauthorized() {
        let fake = FakeBackend::new();
        fake.expire_session();
        let err = fake.list_catalog(UnitKerja::Akademik).await.unwrap_err();
        assert!(err.is_unauthorized());
    }
}

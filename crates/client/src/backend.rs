//! The seam between page logic and the remote backend.
//!
//! [`IkdApi`](crate::api::IkdApi) implements it over HTTP;
//! [`FakeBackend`](crate::fake::FakeBackend) implements it in memory.

use async_trait::async_trait;

use ikd_core::catalog::Activity;
use ikd_core::evidence::{DeletedKey, Evidence, EvidenceKey, ScoreUpdate};
use ikd_core::roles::Role;
use ikd_core::roster::Lecturer;
use ikd_core::types::DbId;
use ikd_core::units::UnitKerja;
use ikd_core::upload::UploadFile;

use crate::api::ApiError;

#[async_trait]
pub trait IkdBackend: Send + Sync {
    /// Users holding `role`.
    async fn list_users(&self, role: &Role) -> Result<Vec<Lecturer>, ApiError>;

    /// A single user's profile.
    async fn get_user(&self, id: DbId) -> Result<Lecturer, ApiError>;

    /// Catalog page owned by `unit`.
    async fn list_catalog(&self, unit: UnitKerja) -> Result<Vec<Activity>, ApiError>;

    /// Batch lookup of catalog entries by id, any unit. Unknown ids are
    /// omitted from the result.
    async fn lookup_catalog(&self, ids: &[DbId]) -> Result<Vec<Activity>, ApiError>;

    /// Full evidence snapshot for `unit`.
    async fn list_evidence(&self, unit: UnitKerja) -> Result<Vec<Evidence>, ApiError>;

    /// Upload (or replace) the evidence file for `key` in `unit`.
    async fn upload_evidence(
        &self,
        key: EvidenceKey,
        unit: UnitKerja,
        file: &UploadFile,
    ) -> Result<Evidence, ApiError>;

    async fn delete_evidence(&self, id: DbId) -> Result<(), ApiError>;

    /// Raw file bytes of an evidence record.
    async fn download_evidence(&self, id: DbId) -> Result<Vec<u8>, ApiError>;

    /// Upsert the score of an existing evidence record; returns the
    /// confirmed record.
    async fn update_score(&self, update: &ScoreUpdate) -> Result<Evidence, ApiError>;

    async fn list_deleted_keys(&self, unit: UnitKerja) -> Result<Vec<DeletedKey>, ApiError>;

    async fn mark_deleted(&self, marker: &DeletedKey) -> Result<(), ApiError>;

    async fn unmark_deleted(&self, marker: &DeletedKey) -> Result<(), ApiError>;
}

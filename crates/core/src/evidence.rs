//! Evidence (*bukti fisik*) records and the keys that address them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};
use crate::units::UnitKerja;

/// Composite key for one score cell within a unit page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EvidenceKey {
    pub lecturer_id: DbId,
    pub activity_id: DbId,
}

impl EvidenceKey {
    pub fn new(lecturer_id: DbId, activity_id: DbId) -> Self {
        Self {
            lecturer_id,
            activity_id,
        }
    }
}

impl fmt::Display for EvidenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.lecturer_id, self.activity_id)
    }
}

/// An uploaded file plus its score for one lecturer against one activity.
///
/// The backend upserts by `(dosen_id, pedoman_id, unit_kerja)`, so at most
/// one record exists per key and unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: DbId,
    #[serde(rename = "dosen_id")]
    pub lecturer_id: DbId,
    #[serde(rename = "pedoman_id")]
    pub activity_id: DbId,
    pub unit_kerja: UnitKerja,
    pub file_name: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(rename = "skor", default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub uploaded_at: Option<Timestamp>,
}

impl Evidence {
    pub fn key(&self) -> EvidenceKey {
        EvidenceKey::new(self.lecturer_id, self.activity_id)
    }

    /// Score if strictly positive. Zero and missing scores count for nothing.
    pub fn positive_score(&self) -> Option<f64> {
        self.score.filter(|s| *s > 0.0)
    }
}

/// Persisted marker recording that evidence for a key was explicitly
/// deleted, so a stale snapshot cannot bring it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeletedKey {
    pub dosen_id: DbId,
    pub pedoman_id: DbId,
    pub unit_kerja: UnitKerja,
}

impl DeletedKey {
    pub fn new(key: EvidenceKey, unit_kerja: UnitKerja) -> Self {
        Self {
            dosen_id: key.lecturer_id,
            pedoman_id: key.activity_id,
            unit_kerja,
        }
    }

    pub fn key(&self) -> EvidenceKey {
        EvidenceKey::new(self.dosen_id, self.pedoman_id)
    }
}

/// Body of the score upsert call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreUpdate {
    pub dosen_id: DbId,
    pub pedoman_id: DbId,
    pub unit_kerja: UnitKerja,
    pub skor: Option<f64>,
}

impl ScoreUpdate {
    pub fn new(key: EvidenceKey, unit_kerja: UnitKerja, score: Option<f64>) -> Self {
        Self {
            dosen_id: key.lecturer_id,
            pedoman_id: key.activity_id,
            unit_kerja,
            skor: score,
        }
    }

    pub fn key(&self) -> EvidenceKey {
        EvidenceKey::new(self.dosen_id, self.pedoman_id)
    }
}

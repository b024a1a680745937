//! Shared fixtures for the client integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use tokio::sync::broadcast;

use ikd_client::fake::FakeBackend;
use ikd_client::{PageConfig, PageEvent, UnitPage};
use ikd_core::catalog::Activity;
use ikd_core::evidence::Evidence;
use ikd_core::roster::Lecturer;
use ikd_core::types::DbId;
use ikd_core::units::UnitKerja;

pub const UNIT: UnitKerja = UnitKerja::Akademik;

pub fn lecturer(id: DbId) -> Lecturer {
    Lecturer {
        id,
        name: format!("Dosen {id}"),
        nidn: Some(format!("00{id:04}")),
        email: None,
        phone: None,
        study_program: Some("Informatika".into()),
    }
}

pub fn activity(id: DbId, label: &str, weight: f64) -> Activity {
    Activity {
        id,
        label: label.to_string(),
        weight,
        procedure: None,
        evidence_description: None,
        owning_unit: None,
        parent_id: None,
        level: 0,
        unit_kerja: UNIT,
    }
}

pub fn evidence(lecturer_id: DbId, activity_id: DbId, score: Option<f64>) -> Evidence {
    Evidence {
        id: 0,
        lecturer_id,
        activity_id,
        unit_kerja: UNIT,
        file_name: "bukti.pdf".into(),
        file_url: None,
        score,
        uploaded_at: None,
    }
}

/// Twelve lecturers and a three-entry catalog:
/// `1 Pendidikan` (empty), `1.a Mengajar`, `1.b Membimbing`.
pub fn backend() -> Arc<FakeBackend> {
    Arc::new(
        FakeBackend::new()
            .with_lecturers((1..=12).map(lecturer).collect())
            .with_catalog(vec![
                activity(10, "1 Pendidikan", 0.0),
                activity(11, "1.a Mengajar", 2.0),
                activity(12, "1.b Membimbing", 1.0),
            ]),
    )
}

pub async fn open(fake: &Arc<FakeBackend>) -> Arc<UnitPage> {
    UnitPage::open(fake.clone(), PageConfig::new(UNIT))
        .await
        .expect("page opens")
}

/// Everything published so far.
pub fn drain(rx: &mut broadcast::Receiver<PageEvent>) -> Vec<PageEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

//! Exporter output checks on realistic aggregates.

use chrono::TimeZone;

use ikd_core::catalog::{Activity, CatalogTree, ContentRule};
use ikd_core::evidence::Evidence;
use ikd_core::report::ReportAggregate;
use ikd_core::roster::Lecturer;
use ikd_core::types::DbId;
use ikd_core::units::UnitKerja;
use ikd_export::{pdf, write_exports, xlsx};

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

fn aggregate(lecturers: i64) -> ReportAggregate {
    let catalog = CatalogTree::build(
        vec![
            activity(1, "1 Pendidikan dan Pengajaran", 0.0),
            activity(2, "1.a Mengajar mata kuliah", 2.0),
            activity(3, "1.b Membimbing tugas akhir", 1.0),
        ],
        Vec::new(),
        ContentRule::default(),
    );
    let roster: Vec<Lecturer> = (1..=lecturers)
        .map(|id| Lecturer {
            id,
            name: format!("Dosen {id}"),
            nidn: Some(format!("{id:010}")),
            email: None,
            phone: None,
            study_program: None,
        })
        .collect();
    let evidence: Vec<Evidence> = (1..=lecturers)
        .map(|id| Evidence {
            id,
            lecturer_id: id,
            activity_id: 2 + id % 2,
            unit_kerja: UnitKerja::Akademik,
            file_name: "bukti.pdf".into(),
            file_url: None,
            score: Some(1.5),
            uploaded_at: None,
        })
        .collect();

    let mut report = ReportAggregate::build(&catalog, &roster, &evidence);
    report.generated_at = chrono::Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 0).unwrap();
    report
}

#[test]
fn xlsx_is_a_zip_container() {
    let bytes = xlsx::export_xlsx(&aggregate(3)).unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn pdf_has_header_and_breaks_pages() {
    let (small, pages) = pdf::render(&aggregate(3)).unwrap();
    assert!(small.starts_with(b"%PDF"));
    assert_eq!(pages, 1);

    // Far more rows than fit on one landscape page.
    let (_, pages) = pdf::render(&aggregate(120)).unwrap();
    assert!(pages >= 4, "expected page breaks, got {pages} page(s)");
}

#[test]
fn empty_report_still_renders() {
    let empty = ReportAggregate::build(&CatalogTree::default(), &[], &[]);
    assert!(xlsx::export_xlsx(&empty).is_ok());
    assert!(pdf::export_pdf(&empty).is_ok());
}

#[test]
fn write_exports_uses_timestamped_names() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("rekap");
    let (xlsx_path, pdf_path) = write_exports(&target, &aggregate(2)).unwrap();

    assert_eq!(xlsx_path, target.join("rekap-ikd-20240517-083000.xlsx"));
    assert_eq!(pdf_path, target.join("rekap-ikd-20240517-083000.pdf"));
    assert!(std::fs::metadata(&xlsx_path).unwrap().len() > 0);
    assert!(std::fs::metadata(&pdf_path).unwrap().len() > 0);
}

//! Spreadsheet and PDF renditions of a [`ReportAggregate`].
//!
//! Both exporters render the same three sections: totals per lecturer
//! (with one column per unit), totals per unit and subtotals per top-level
//! catalog category.

use std::path::{Path, PathBuf};

use ikd_core::report::ReportAggregate;

pub mod pdf;
pub mod xlsx;

/// Report title, shared by the PDF heading and the output file names.
pub const REPORT_TITLE: &str = "Rekap Indikator Kinerja Dosen";

const FILE_STEM: &str = "rekap-ikd";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to build spreadsheet: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Failed to build PDF: {0}")]
    Pdf(String),

    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Render a number the way the report tables show it: at most two
/// decimals, trailing zeros dropped.
pub fn format_amount(value: f64) -> String {
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Write `rekap-ikd-<timestamp>.xlsx` and `.pdf` into `dir`.
///
/// The timestamp comes from the aggregate, so both files of one export
/// share it. Returns `(xlsx_path, pdf_path)`.
pub fn write_exports(dir: &Path, aggregate: &ReportAggregate) -> ExportResult<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)?;
    let stamp = aggregate.generated_at.format("%Y%m%d-%H%M%S");

    let xlsx_path = dir.join(format!("{FILE_STEM}-{stamp}.xlsx"));
    std::fs::write(&xlsx_path, xlsx::export_xlsx(aggregate)?)?;

    let pdf_path = dir.join(format!("{FILE_STEM}-{stamp}.pdf"));
    std::fs::write(&pdf_path, pdf::export_pdf(aggregate)?)?;

    tracing::info!(
        xlsx = %xlsx_path.display(),
        pdf = %pdf_path.display(),
        lecturers = aggregate.lecturers.len(),
        grand_total = aggregate.grand_total,
        "Report exported",
    );
    Ok((xlsx_path, pdf_path))
}

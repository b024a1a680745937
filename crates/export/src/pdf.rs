//! Landscape A4 PDF export.
//!
//! Uses the built-in Helvetica faces, so no font files are embedded.
//! Tables are laid out on fixed column offsets and continue on a new page
//! when the bottom margin is reached.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use ikd_core::report::ReportAggregate;

use crate::{format_amount, ExportError, ExportResult, REPORT_TITLE};

const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 15.0;
const LINE_HEIGHT: f32 = 6.0;
const TITLE_SIZE: f32 = 14.0;
const HEADING_SIZE: f32 = 11.0;
const BODY_SIZE: f32 = 9.0;
/// Longest cell text before truncation, in characters.
const MAX_CELL_CHARS: usize = 48;

/// One column of a text table: heading and left offset in mm.
struct Column {
    title: String,
    x: f32,
}

struct Writer {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    pages: usize,
}

fn pdf_error(err: printpdf::Error) -> ExportError {
    ExportError::Pdf(err.to_string())
}

impl Writer {
    fn new(title: &str) -> ExportResult<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
            pages: 1,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
        self.pages += 1;
    }

    /// Start a new page unless `lines` more lines fit above the margin.
    fn ensure_room(&mut self, lines: usize) {
        if self.y - LINE_HEIGHT * (lines as f32) < MARGIN {
            self.new_page();
        }
    }

    fn text(&self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(truncate(text), size, Mm(x), Mm(self.y), font);
    }

    fn line(&mut self, text: &str, size: f32, bold: bool) {
        self.ensure_room(1);
        self.text(text, size, MARGIN, bold);
        self.y -= LINE_HEIGHT;
    }

    fn header_row(&mut self, columns: &[Column]) {
        for column in columns {
            self.text(&column.title, BODY_SIZE, column.x, true);
        }
        self.y -= LINE_HEIGHT;
    }

    /// Write a table, repeating the header after each page break.
    fn table(&mut self, heading: &str, columns: &[Column], rows: &[(Vec<String>, bool)]) {
        self.ensure_room(3);
        self.line(heading, HEADING_SIZE, true);
        self.header_row(columns);

        for (cells, bold) in rows {
            if self.y - LINE_HEIGHT < MARGIN {
                self.new_page();
                self.header_row(columns);
            }
            for (column, cell) in columns.iter().zip(cells) {
                self.text(cell, BODY_SIZE, column.x, *bold);
            }
            self.y -= LINE_HEIGHT;
        }
        self.y -= LINE_HEIGHT;
    }

    fn finish(self) -> ExportResult<(Vec<u8>, usize)> {
        let pages = self.pages;
        let bytes = self.doc.save_to_bytes().map_err(pdf_error)?;
        Ok((bytes, pages))
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_CHARS {
        return text.to_string();
    }
    let mut short: String = text.chars().take(MAX_CELL_CHARS - 3).collect();
    short.push_str("...");
    short
}

/// Evenly spread `titles` after the fixed leading columns.
fn columns(leading: &[(&str, f32)], titles: &[String]) -> Vec<Column> {
    let mut out: Vec<Column> = leading
        .iter()
        .map(|(title, x)| Column {
            title: (*title).to_string(),
            x: *x,
        })
        .collect();
    let start = leading.last().map(|(_, x)| x + 70.0).unwrap_or(MARGIN);
    let width = (PAGE_WIDTH - MARGIN - start) / titles.len().max(1) as f32;
    out.extend(titles.iter().enumerate().map(|(i, title)| Column {
        title: title.clone(),
        x: start + width * i as f32,
    }));
    out
}

/// Render the report. Returns the PDF bytes.
pub fn export_pdf(aggregate: &ReportAggregate) -> ExportResult<Vec<u8>> {
    render(aggregate).map(|(bytes, _)| bytes)
}

/// Render the report and also report how many pages it took.
pub fn render(aggregate: &ReportAggregate) -> ExportResult<(Vec<u8>, usize)> {
    let mut writer = Writer::new(REPORT_TITLE)?;
    writer.line(REPORT_TITLE, TITLE_SIZE, true);
    writer.line(
        &format!("Dibuat: {}", aggregate.generated_at.format("%d-%m-%Y %H:%M UTC")),
        BODY_SIZE,
        false,
    );
    writer.y -= LINE_HEIGHT;

    // Per lecturer
    let units = aggregate.unit_columns();
    let mut titles: Vec<String> = units.iter().map(|u| u.label().to_string()).collect();
    titles.push("Kegiatan".into());
    titles.push("Total".into());
    let lecturer_cols = columns(&[("No", MARGIN), ("Nama Dosen", MARGIN + 10.0)], &titles);

    let mut rows: Vec<(Vec<String>, bool)> = aggregate
        .lecturers
        .iter()
        .enumerate()
        .map(|(i, lecturer)| {
            let mut cells = vec![(i + 1).to_string(), lecturer.name.clone()];
            cells.extend(
                units
                    .iter()
                    .map(|u| format_amount(lecturer.per_unit.get(u).copied().unwrap_or(0.0))),
            );
            cells.push(lecturer.activity_count.to_string());
            cells.push(format_amount(lecturer.total));
            (cells, false)
        })
        .collect();
    let mut footer = vec![String::new(), "Total".to_string()];
    footer.extend(aggregate.units.iter().map(|u| format_amount(u.total)));
    footer.push(aggregate.total_activity_count().to_string());
    footer.push(format_amount(aggregate.grand_total));
    rows.push((footer, true));
    writer.table("Rekap Dosen", &lecturer_cols, &rows);

    // Per unit
    let unit_cols = columns(
        &[("Unit Kerja", MARGIN)],
        &["Jumlah Kegiatan".to_string(), "Total".to_string()],
    );
    let mut rows: Vec<(Vec<String>, bool)> = aggregate
        .units
        .iter()
        .map(|u| {
            (
                vec![
                    u.unit.label().to_string(),
                    u.activity_count.to_string(),
                    format_amount(u.total),
                ],
                false,
            )
        })
        .collect();
    rows.push((
        vec![
            "Total".to_string(),
            aggregate.total_activity_count().to_string(),
            format_amount(aggregate.grand_total),
        ],
        true,
    ));
    writer.table("Rekap Unit", &unit_cols, &rows);

    // Per category
    let category_cols = columns(
        &[("No", MARGIN), ("Kategori", MARGIN + 10.0)],
        &["Jumlah Kegiatan".to_string(), "Total".to_string()],
    );
    let mut rows: Vec<(Vec<String>, bool)> = aggregate
        .categories
        .iter()
        .enumerate()
        .map(|(i, c)| {
            (
                vec![
                    (i + 1).to_string(),
                    c.label.clone(),
                    c.activity_count.to_string(),
                    format_amount(c.total),
                ],
                false,
            )
        })
        .collect();
    rows.push((
        vec![
            String::new(),
            "Total".to_string(),
            aggregate.total_activity_count().to_string(),
            format_amount(aggregate.grand_total),
        ],
        true,
    ));
    writer.table("Rekap Kategori", &category_cols, &rows);

    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_cells_are_truncated() {
        let long = "a".repeat(100);
        let short = truncate(&long);
        assert_eq!(short.chars().count(), MAX_CELL_CHARS);
        assert!(short.ends_with("..."));
        assert_eq!(truncate("Dosen 1"), "Dosen 1");
    }

    #[test]
    fn trailing_columns_fit_the_page() {
        let titles: Vec<String> = (0..9).map(|i| format!("Kolom {i}")).collect();
        let cols = columns(&[("No", MARGIN), ("Nama", MARGIN + 10.0)], &titles);
        assert_eq!(cols.len(), 11);
        assert!(cols.iter().all(|c| c.x < PAGE_WIDTH - MARGIN));
        assert!(cols.windows(2).all(|w| w[0].x < w[1].x));
    }
}

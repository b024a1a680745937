//! Excel workbook export.

use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, Worksheet};

use ikd_core::report::ReportAggregate;

use crate::ExportResult;

pub const SHEET_LECTURERS: &str = "Rekap Dosen";
pub const SHEET_UNITS: &str = "Rekap Unit";
pub const SHEET_CATEGORIES: &str = "Rekap Kategori";

struct Styles {
    header: Format,
    amount: Format,
    total_label: Format,
    total_amount: Format,
}

impl Styles {
    fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_background_color(Color::RGB(0xD9E1F2)),
            amount: Format::new().set_num_format("0.00"),
            total_label: Format::new().set_bold(),
            total_amount: Format::new().set_bold().set_num_format("0.00"),
        }
    }
}

/// Build the three-sheet workbook in memory.
pub fn export_xlsx(aggregate: &ReportAggregate) -> ExportResult<Vec<u8>> {
    let styles = Styles::new();
    let mut workbook = Workbook::new();

    lecturer_sheet(workbook.add_worksheet(), aggregate, &styles)?;
    unit_sheet(workbook.add_worksheet(), aggregate, &styles)?;
    category_sheet(workbook.add_worksheet(), aggregate, &styles)?;

    Ok(workbook.save_to_buffer()?)
}

fn write_header(sheet: &mut Worksheet, headers: &[String], styles: &Styles) -> ExportResult<()> {
    for (col, title) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, title, &styles.header)?;
    }
    Ok(())
}

fn lecturer_sheet(sheet: &mut Worksheet, aggregate: &ReportAggregate, styles: &Styles) -> ExportResult<()> {
    sheet.set_name(SHEET_LECTURERS)?;
    let units = aggregate.unit_columns();

    let mut headers: Vec<String> = vec!["No".into(), "Nama Dosen".into(), "NIDN".into()];
    headers.extend(units.iter().map(|u| u.label().to_string()));
    headers.push("Jumlah Kegiatan".into());
    headers.push("Total".into());
    write_header(sheet, &headers, styles)?;

    let count_col = (3 + units.len()) as u16;
    let total_col = count_col + 1;

    for (i, lecturer) in aggregate.lecturers.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_number(row, 0, (i + 1) as f64)?;
        sheet.write_string(row, 1, &lecturer.name)?;
        sheet.write_string(row, 2, lecturer.nidn.as_deref().unwrap_or("-"))?;
        for (j, unit) in units.iter().enumerate() {
            let value = lecturer.per_unit.get(unit).copied().unwrap_or(0.0);
            sheet.write_number_with_format(row, (3 + j) as u16, value, &styles.amount)?;
        }
        sheet.write_number(row, count_col, lecturer.activity_count as f64)?;
        sheet.write_number_with_format(row, total_col, lecturer.total, &styles.amount)?;
    }

    let footer = (aggregate.lecturers.len() + 1) as u32;
    sheet.write_string_with_format(footer, 1, "Total", &styles.total_label)?;
    for (j, summary) in aggregate.units.iter().enumerate() {
        sheet.write_number_with_format(footer, (3 + j) as u16, summary.total, &styles.total_amount)?;
    }
    sheet.write_number_with_format(
        footer,
        count_col,
        aggregate.total_activity_count() as f64,
        &styles.total_label,
    )?;
    sheet.write_number_with_format(footer, total_col, aggregate.grand_total, &styles.total_amount)?;

    sheet.set_column_width(1, 32)?;
    sheet.set_column_width(2, 16)?;
    Ok(())
}

fn unit_sheet(sheet: &mut Worksheet, aggregate: &ReportAggregate, styles: &Styles) -> ExportResult<()> {
    sheet.set_name(SHEET_UNITS)?;
    let headers = ["Unit Kerja", "Jumlah Kegiatan", "Total"].map(String::from);
    write_header(sheet, &headers, styles)?;

    for (i, summary) in aggregate.units.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, summary.unit.label())?;
        sheet.write_number(row, 1, summary.activity_count as f64)?;
        sheet.write_number_with_format(row, 2, summary.total, &styles.amount)?;
    }

    let footer = (aggregate.units.len() + 1) as u32;
    sheet.write_string_with_format(footer, 0, "Total", &styles.total_label)?;
    sheet.write_number_with_format(footer, 1, aggregate.total_activity_count() as f64, &styles.total_label)?;
    sheet.write_number_with_format(footer, 2, aggregate.grand_total, &styles.total_amount)?;

    sheet.set_column_width(0, 24)?;
    Ok(())
}

fn category_sheet(sheet: &mut Worksheet, aggregate: &ReportAggregate, styles: &Styles) -> ExportResult<()> {
    sheet.set_name(SHEET_CATEGORIES)?;
    let headers = ["No", "Kategori", "Jumlah Kegiatan", "Total"].map(String::from);
    write_header(sheet, &headers, styles)?;

    for (i, category) in aggregate.categories.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_number(row, 0, (i + 1) as f64)?;
        sheet.write_string(row, 1, &category.label)?;
        sheet.write_number(row, 2, category.activity_count as f64)?;
        sheet.write_number_with_format(row, 3, category.total, &styles.amount)?;
    }

    let footer = (aggregate.categories.len() + 1) as u32;
    sheet.write_string_with_format(footer, 1, "Total", &styles.total_label)?;
    sheet.write_number_with_format(footer, 3, aggregate.grand_total, &styles.total_amount)?;

    sheet.set_column_width(1, 48)?;
    Ok(())
}

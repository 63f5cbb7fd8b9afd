use chrono::NaiveDateTime;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use thiserror::Error;

use super::filter::FilterCriteria;
use super::model::{CellValue, FacilityTable};
use crate::config::AppConfig;

/// MIME type of the exported workbook.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Upper bound for a column width, in character units.
pub const MAX_COLUMN_WIDTH: usize = 50;

const HEADER_FILL: u32 = 0xD7E4BC;
const VARIABLE_NAME_CHARS: usize = 20;
/// An empty cell is sized as if it read `nan`.
const MISSING_CELL_CHARS: usize = 3;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("XLSX error: {0}")]
    Xlsx(#[from] XlsxError),
}

// ---------------------------------------------------------------------------
// Report layout
// ---------------------------------------------------------------------------

/// Which columns go into the export, and how the artifact is named.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    /// Identity and tier columns, in output order. The selected variable
    /// follows them.
    pub base_columns: Vec<String>,
    pub optional_columns: Vec<String>,
    pub sheet_name: String,
    pub file_prefix: String,
}

impl ReportLayout {
    pub fn from_config(config: &AppConfig) -> Self {
        let c = &config.columns;
        Self {
            base_columns: vec![
                c.name.clone(),
                c.country.clone(),
                c.city.clone(),
                c.address.clone(),
                c.tier.clone(),
            ],
            optional_columns: config.optional_columns.clone(),
            sheet_name: config.sheet_name.clone(),
            file_prefix: config.file_prefix.clone(),
        }
    }
}

/// The generated download. Lives in memory only.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
    pub columns: Vec<String>,
    pub row_count: usize,
}

// ---------------------------------------------------------------------------
// Projection and sizing
// ---------------------------------------------------------------------------

/// Columns to export: base columns, the variable, then optional columns.
/// Absent columns are skipped; a column is never listed twice.
pub fn project_columns(table: &FacilityTable, variable: &str, layout: &ReportLayout) -> Vec<String> {
    let wanted = layout
        .base_columns
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(variable))
        .chain(layout.optional_columns.iter().map(String::as_str));

    let mut columns: Vec<String> = Vec::new();
    for col in wanted {
        if table.has_column(col) && !columns.iter().any(|c| c == col) {
            columns.push(col.to_string());
        }
    }
    columns
}

/// Width per column: longest rendered cell or header, plus 2, capped at 50.
/// Empty cells count as three characters.
pub fn column_widths(table: &FacilityTable, columns: &[String]) -> Vec<usize> {
    columns
        .iter()
        .map(|col| {
            let longest_cell = table
                .rows
                .iter()
                .map(|row| match row.get(col) {
                    CellValue::Missing => MISSING_CELL_CHARS,
                    value => value.display_len(),
                })
                .max()
                .unwrap_or(0);
            let width = longest_cell.max(col.chars().count()) + 2;
            width.min(MAX_COLUMN_WIDTH)
        })
        .collect()
}

/// `<prefix>_<tier>_<variable[..20]>_<value>_<yyyyMMdd_HHmm>.xlsx`
///
/// Spaces in the tier become underscores; the variable is cut to 20 characters.
pub fn artifact_file_name(prefix: &str, criteria: &FilterCriteria, timestamp: NaiveDateTime) -> String {
    let tier = criteria.tier.to_string().replace(' ', "_");
    let variable: String = criteria.variable.chars().take(VARIABLE_NAME_CHARS).collect();
    format!(
        "{prefix}_{tier}_{variable}_{}_{}.xlsx",
        criteria.value,
        timestamp.format("%Y%m%d_%H%M")
    )
}

// ---------------------------------------------------------------------------
// Workbook serialisation
// ---------------------------------------------------------------------------

/// Serialise a filtered result. Returns `None` when there is nothing to export.
pub fn export(
    result: &FacilityTable,
    criteria: &FilterCriteria,
    layout: &ReportLayout,
    timestamp: NaiveDateTime,
) -> Result<Option<ExportArtifact>, ExportError> {
    if result.is_empty() {
        return Ok(None);
    }

    let columns = project_columns(result, &criteria.variable, layout);
    let bytes = render_workbook(result, &columns, &layout.sheet_name)?;

    Ok(Some(ExportArtifact {
        file_name: artifact_file_name(&layout.file_prefix, criteria, timestamp),
        mime_type: XLSX_MIME,
        bytes,
        row_count: result.len(),
        columns,
    }))
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_text_wrap()
        .set_align(FormatAlign::Top)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_border(FormatBorder::Thin)
}

fn render_workbook(
    table: &FacilityTable,
    columns: &[String],
    sheet_name: &str,
) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header = header_format();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name)?;

        for (c, name) in columns.iter().enumerate() {
            sheet.write_string_with_format(0, c as u16, name, &header)?;
        }

        for (r, row) in table.rows.iter().enumerate() {
            let r = r as u32 + 1;
            for (c, col) in columns.iter().enumerate() {
                write_cell(sheet, r, c as u16, row.get(col))?;
            }
        }

        for (c, width) in column_widths(table, columns).into_iter().enumerate() {
            sheet.set_column_width(c as u16, width as f64)?;
        }
    }

    workbook.save_to_buffer()
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, value: &CellValue) -> Result<(), XlsxError> {
    match value {
        CellValue::Text(s) | CellValue::Date(s) => {
            sheet.write_string(row, col, s)?;
        }
        CellValue::Integer(i) => {
            sheet.write_number(row, col, *i as f64)?;
        }
        CellValue::Float(f) => {
            sheet.write_number(row, col, *f)?;
        }
        CellValue::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        CellValue::Missing => {}
    }
    Ok(())
}

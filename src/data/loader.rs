use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use calamine::{Data, Range, Reader, Sheets};
use thiserror::Error;

use super::model::{CellValue, Facility, FacilityTable};

/// Extensions accepted by the workbook reader.
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("not a readable workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("workbook contains no sheet")]
    NoSheet,
    #[error("sheet has no header row")]
    EmptySheet,
    #[error("required column '{0}' is missing")]
    MissingTierColumn(String),
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a survey table from a workbook file (`.xlsx` / `.xlsm` / `.xlsb` /
/// `.xls` / `.ods`). First sheet only; its first row is the header.
///
/// The table must contain `tier_column`.
pub fn load_file(path: &Path, tier_column: &str) -> Result<FacilityTable, LoadError> {
    std::fs::metadata(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if !WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
        return Err(LoadError::UnsupportedExtension(ext));
    }

    let table = load_workbook(calamine::open_workbook_auto(path)?)?;
    require_column(table, tier_column)
}

/// Load a workbook held in memory (any format calamine detects).
pub fn load_workbook_bytes(bytes: Vec<u8>, tier_column: &str) -> Result<FacilityTable, LoadError> {
    let sheets = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))?;
    require_column(load_workbook(sheets)?, tier_column)
}

fn require_column(table: FacilityTable, column: &str) -> Result<FacilityTable, LoadError> {
    if table.has_column(column) {
        Ok(table)
    } else {
        Err(LoadError::MissingTierColumn(column.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Table assembly
// ---------------------------------------------------------------------------

/// Turn raw header cells into unique column names.
///
/// Blank headers become `Unnamed: <index>`; a repeated name gets `.1`, `.2`, …
fn normalise_headers(raw: &[CellValue]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(raw.len());

    for (i, cell) in raw.iter().enumerate() {
        let base = match cell {
            CellValue::Missing => format!("Unnamed: {i}"),
            other => other.to_string(),
        };
        let mut name = base.clone();
        while seen.contains(&name) {
            let n = counts.entry(base.clone()).or_insert(0);
            *n += 1;
            name = format!("{base}.{n}");
        }
        seen.insert(name.clone());
        names.push(name);
    }
    names
}

/// Zip data rows with headers. Fully empty rows are dropped.
fn assemble(headers: &[CellValue], rows: Vec<Vec<CellValue>>) -> FacilityTable {
    let columns = normalise_headers(headers);

    let facilities = rows
        .into_iter()
        .filter(|cells| cells.iter().any(|c| !c.is_missing()))
        .map(|cells| {
            let cells: BTreeMap<String, CellValue> = columns
                .iter()
                .cloned()
                .zip(cells)
                .filter(|(_, v)| !v.is_missing())
                .collect();
            Facility { cells }
        })
        .collect();

    FacilityTable::new(columns, facilities)
}

// ---------------------------------------------------------------------------
// Workbook loader
// ---------------------------------------------------------------------------

fn load_workbook<RS: Read + Seek>(mut sheets: Sheets<RS>) -> Result<FacilityTable, LoadError> {
    let range = sheets.worksheet_range_at(0).ok_or(LoadError::NoSheet)??;
    table_from_range(&range)
}

fn table_from_range(range: &Range<Data>) -> Result<FacilityTable, LoadError> {
    let mut rows = range.rows();
    let header: Vec<CellValue> = rows
        .next()
        .ok_or(LoadError::EmptySheet)?
        .iter()
        .map(cell_to_value)
        .collect();

    let data: Vec<Vec<CellValue>> = rows
        .map(|r| r.iter().map(cell_to_value).collect())
        .collect();

    log::debug!(
        "Sheet range {:?}..{:?}, {} data rows",
        range.start(),
        range.end(),
        data.len()
    );

    Ok(assemble(&header, data))
}

fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::number(*f),
        Data::String(s) if s.is_empty() => CellValue::Missing,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => CellValue::Date(ndt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => CellValue::number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => CellValue::Date(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Missing,
    }
}

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the survey table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value as read from a spreadsheet.
/// Distinct values are kept in `BTreeSet`s downstream so `CellValue` must be `Ord`.
///
/// Whole-number floats are stored as `Integer` by the loader, so numeric
/// equality is plain structural equality.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text.
    Date(String),
    Missing,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    /// Numbers compare by value whatever their storage; an `Integer` sorts
    /// before an equal `Float`.
    fn cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        fn rank(v: &CellValue) -> u8 {
            match v {
                Missing => 0,
                Bool(_) => 1,
                Integer(_) | Float(_) => 2,
                Text(_) => 3,
                Date(_) => 4,
            }
        }
        let (ra, rb) = (rank(self), rank(other));
        if ra != rb {
            return ra.cmp(&rb);
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b).then(Ordering::Less),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)).then(Ordering::Greater),
            (Text(a), Text(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Renders the value as it appears in the workbook; `Missing` renders empty.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Missing => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl CellValue {
    /// Build a numeric value, folding whole floats into `Integer`.
    pub fn number(v: f64) -> Self {
        if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
            CellValue::Integer(v as i64)
        } else if v.is_nan() {
            CellValue::Missing
        } else {
            CellValue::Float(v)
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Filter equality: same type and same value. `Missing` never matches,
    /// not even another `Missing`.
    pub fn matches(&self, other: &CellValue) -> bool {
        !self.is_missing() && !other.is_missing() && self == other
    }

    /// Length of the rendered value in characters.
    pub fn display_len(&self) -> usize {
        self.to_string().chars().count()
    }
}

// ---------------------------------------------------------------------------
// Facility – one row of the survey table
// ---------------------------------------------------------------------------

/// A single surveyed laboratory (one data row of the source sheet).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Facility {
    /// column_name → value. Columns without a value are absent.
    pub cells: BTreeMap<String, CellValue>,
}

static MISSING: CellValue = CellValue::Missing;

impl Facility {
    /// Value of `column`, `Missing` if the row has none.
    pub fn get(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&MISSING)
    }
}

// ---------------------------------------------------------------------------
// FacilityTable – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table with pre-computed distinct values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacilityTable {
    /// Column names in source sheet order. Unique.
    pub columns: Vec<String>,
    /// All rows, in source order.
    pub rows: Vec<Facility>,
    /// For each column the sorted set of distinct non-missing values.
    pub unique_values: BTreeMap<String, BTreeSet<CellValue>>,
}

impl FacilityTable {
    /// Build the table and its distinct-value index.
    ///
    /// `Missing` cells are not stored in rows and never enter `unique_values`.
    pub fn new(columns: Vec<String>, rows: Vec<Facility>) -> Self {
        let mut unique_values: BTreeMap<String, BTreeSet<CellValue>> = columns
            .iter()
            .map(|c| (c.clone(), BTreeSet::new()))
            .collect();

        let rows: Vec<Facility> = rows
            .into_iter()
            .map(|mut row| {
                row.cells.retain(|_, v| !v.is_missing());
                row
            })
            .collect();

        for row in &rows {
            for (col, val) in &row.cells {
                if let Some(set) = unique_values.get_mut(col) {
                    set.insert(val.clone());
                }
            }
        }

        FacilityTable {
            columns,
            rows,
            unique_values,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Sorted distinct non-missing values of `column` (empty if absent).
    pub fn distinct_values(&self, column: &str) -> Vec<CellValue> {
        self.unique_values
            .get(column)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Column names sorted alphabetically.
    pub fn sorted_columns(&self) -> Vec<String> {
        let mut cols = self.columns.clone();
        cols.sort();
        cols
    }

    /// A new table with the same columns holding the rows at `indices`.
    pub fn subset(&self, indices: &[usize]) -> FacilityTable {
        let rows = indices
            .iter()
            .filter_map(|&i| self.rows.get(i).cloned())
            .collect();
        FacilityTable::new(self.columns.clone(), rows)
    }
}

//! Core table types for raw sheet grids and the merged swing table

use crate::error::RowError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Text layouts accepted when a date column arrives as a string
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// A single cell as read from a workbook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Text value
    Text(String),
    /// Numeric value (spreadsheets store integers as floats too)
    Number(f64),
    /// Boolean value
    Bool(bool),
    /// Date or date-time value
    Date(NaiveDateTime),
    /// Spreadsheet error value such as `#DIV/0!`
    Error(String),
    /// Empty/null cell
    Empty,
}

impl CellValue {
    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Borrow the text of a text cell
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the cell as a date-time, parsing text when needed
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Date(dt) => Some(*dt),
            CellValue::Text(s) => parse_datetime_text(s),
            _ => None,
        }
    }

    /// Convert to a display string
    pub fn to_string_value(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Date(dt) => write!(f, "{}", dt.format("%Y-%m-%d")),
            CellValue::Error(e) => write!(f, "{}", e),
            CellValue::Empty => write!(f, ""),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::Date(dt)
    }
}

fn parse_datetime_text(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Cell grid of one sheet, as produced by the workbook reader
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGrid {
    rows: Vec<Vec<CellValue>>,
}

impl RawGrid {
    /// Create a grid from rows of cells
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    /// Build a grid from string literals; empty strings become empty cells
    pub fn from_text<'a, R: AsRef<[&'a str]>>(rows: &[R]) -> Self {
        Self::new(
            rows.iter()
                .map(|row| row.as_ref().iter().map(|s| CellValue::from(*s)).collect())
                .collect(),
        )
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Copy of the grid without rows whose cells are all empty
    pub fn without_empty_rows(&self) -> RawGrid {
        let rows = self
            .rows
            .iter()
            .filter(|row| !row.iter().all(CellValue::is_empty))
            .cloned()
            .collect();
        RawGrid { rows }
    }
}

/// Ordered, collision-free column labels taken from the first sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CanonicalHeader {
    labels: Vec<String>,
}

impl CanonicalHeader {
    /// Wrap labels that are already unique (see `header::reconcile`)
    pub(crate) fn from_unique(labels: Vec<String>) -> Self {
        debug_assert!(
            labels.iter().collect::<BTreeSet<_>>().len() == labels.len(),
            "canonical header labels must be unique"
        );
        Self { labels }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Find a column position by exact label
    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}

/// One data row conforming to the canonical header, plus derived fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRow {
    cells: Vec<CellValue>,
    /// Sheet the row came from
    pub source_sheet: String,
    /// Lineup slot code; `None` for rows of the first sheet
    pub bat_order: Option<String>,
}

/// Pad with empty cells or truncate so the row matches the header width
pub fn fit_width(cells: &[CellValue], width: usize) -> Vec<CellValue> {
    let mut fitted: Vec<CellValue> = cells.iter().take(width).cloned().collect();
    fitted.resize(width, CellValue::Empty);
    fitted
}

impl NormalizedRow {
    /// Create a row from raw sheet cells, padded or truncated to the header width
    pub fn fitted(header: &CanonicalHeader, cells: &[CellValue], source_sheet: impl Into<String>) -> Self {
        Self {
            cells: fit_width(cells, header.len()),
            source_sheet: source_sheet.into(),
            bat_order: None,
        }
    }

    /// Create a row from cells that must already match the header width.
    ///
    /// Sheet normalization uses [`NormalizedRow::fitted`]; this is for callers
    /// assembling rows themselves.
    pub fn new(
        header: &CanonicalHeader,
        cells: Vec<CellValue>,
        source_sheet: impl Into<String>,
    ) -> Result<Self, RowError> {
        if cells.len() != header.len() {
            return Err(RowError::WidthMismatch {
                expected: header.len(),
                found: cells.len(),
            });
        }
        Ok(Self {
            cells,
            source_sheet: source_sheet.into(),
            bat_order: None,
        })
    }

    /// Attach a lineup slot code
    #[must_use]
    pub fn with_bat_order(mut self, bat_order: impl Into<String>) -> Self {
        self.bat_order = Some(bat_order.into());
        self
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    /// Get a cell by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }

    /// Get a cell by header label
    pub fn get_by_label(&self, header: &CanonicalHeader, label: &str) -> Option<&CellValue> {
        header.position(label).and_then(|i| self.get(i))
    }
}

/// Ordering key for the primary (date) column
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Date(NaiveDateTime),
    Number(f64),
    Text(String),
    Missing,
}

impl SortKey {
    /// Derive the key for a cell
    pub fn for_cell(cell: Option<&CellValue>) -> Self {
        match cell {
            None | Some(CellValue::Empty) => SortKey::Missing,
            Some(c) => match c.as_datetime() {
                Some(dt) => SortKey::Date(dt),
                None => match c {
                    CellValue::Number(n) => SortKey::Number(*n),
                    other => SortKey::Text(other.to_string_value()),
                },
            },
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, SortKey::Date(_))
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Date(_) => 0,
            SortKey::Number(_) => 1,
            SortKey::Text(_) => 2,
            SortKey::Missing => 3,
        }
    }
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// All surviving rows of a run, in output order
#[derive(Debug, Clone, Serialize)]
pub struct MergedTable {
    /// Canonical column labels
    pub header: CanonicalHeader,
    /// Rows with provenance
    pub rows: Vec<NormalizedRow>,
}

impl MergedTable {
    pub fn new(header: CanonicalHeader, rows: Vec<NormalizedRow>) -> Self {
        Self { header, rows }
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of output columns (canonical plus the two derived fields)
    pub fn column_count(&self) -> usize {
        self.header.len() + 2
    }

    /// Number of distinct sheets that contributed rows
    pub fn distinct_sheet_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.source_sheet.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Stable sort by the first canonical column.
    ///
    /// Date cells (or text parsing as a date) order first, then numbers, then other
    /// text, then blanks. Returns the number of rows whose key is not a date.
    pub fn sort_by_primary(&mut self) -> usize {
        let mut keyed: Vec<(SortKey, NormalizedRow)> = std::mem::take(&mut self.rows)
            .into_iter()
            .map(|row| (SortKey::for_cell(row.get(0)), row))
            .collect();
        let unparsable = keyed.iter().filter(|(k, _)| !k.is_date()).count();

        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        self.rows = keyed.into_iter().map(|(_, row)| row).collect();
        unparsable
    }

    /// Labels of the output columns, in canonical then derived order
    pub fn output_labels<'a>(&'a self, source_label: &'a str, bat_label: &'a str) -> Vec<&'a str> {
        self.header
            .labels()
            .iter()
            .map(String::as_str)
            .chain([source_label, bat_label])
            .collect()
    }

    /// Cells of one row in output column order
    pub fn output_cells(row: &NormalizedRow) -> Vec<CellValue> {
        let mut cells = row.cells().to_vec();
        cells.push(CellValue::Text(row.source_sheet.clone()));
        cells.push(
            row.bat_order
                .as_deref()
                .map_or(CellValue::Empty, |b| CellValue::Text(b.to_string())),
        );
        cells
    }
}

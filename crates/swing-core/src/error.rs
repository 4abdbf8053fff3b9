//! Error types for swing-core

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum Error {
    /// The first eligible sheet cannot hold a header row
    #[error("first sheet '{sheet}' too short: {rows} non-empty rows, need at least {required}")]
    Layout {
        sheet: String,
        rows: usize,
        required: usize,
    },

    /// Every sheet was excluded, or the workbook has none
    #[error("no eligible sheets found in workbook")]
    NoEligibleSheets,

    /// The first eligible sheet could not be read or lacks a required column
    #[error("first sheet '{sheet}' could not be processed: {reason}")]
    FirstSheetUnreadable { sheet: String, reason: SheetError },

    /// Failed to open a workbook
    #[error("failed to open workbook '{path}': {source}")]
    WorkbookOpen {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Table does not fit the export format
    #[error("export limit exceeded: {0}")]
    ExportLimit(String),

    /// Spreadsheet writer error
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Map a failure of the first sheet to the run-level error
    pub fn first_sheet(sheet: &str, reason: SheetError) -> Self {
        match reason {
            SheetError::TooShort { rows, required } => Error::Layout {
                sheet: sheet.to_string(),
                rows,
                required,
            },
            other => Error::FirstSheetUnreadable {
                sheet: sheet.to_string(),
                reason: other,
            },
        }
    }
}

/// Reasons a single sheet produced no rows
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum SheetError {
    /// Fewer non-empty rows than the layout requires
    #[error("too short: {rows} non-empty rows, need at least {required}")]
    TooShort { rows: usize, required: usize },

    /// The reader could not produce a grid for the sheet
    #[error("unreadable: {0}")]
    Unreadable(String),

    /// A column the sheet logic depends on is not in the canonical header
    #[error("column '{0}' not found in header")]
    MissingColumn(String),
}

/// Reasons a single row was dropped
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum RowError {
    /// Cell count does not match the canonical header; only `NormalizedRow::new` checks this
    #[error("expected {expected} cells, found {found}")]
    WidthMismatch { expected: usize, found: usize },

    /// A cell needed for filtering holds a spreadsheet error value
    #[error("cell in column '{column}' holds error value {value}")]
    UnreadableCell { column: String, value: String },
}

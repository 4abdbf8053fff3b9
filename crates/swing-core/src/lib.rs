//! swing-core: Core library for merging swing-tracker workbook exports
//!
//! This library provides functionality to:
//! - Read every sheet of a multi-sheet workbook export as a raw cell grid
//! - Build a collision-free header from the first sheet
//! - Map each sheet's rows onto that header, padding or truncating columns
//! - Tag rows with their source sheet and batting-order slot, keep in-game swings
//! - Merge all rows into one date-sorted table and export it as a single sheet

pub mod bat_order;
pub mod config;
pub mod error;
pub mod export;
pub mod header;
pub mod merger;
pub mod normalizer;
pub mod table;
pub mod workbook;

pub use bat_order::BatOrderTable;
pub use config::{MergeConfig, TEAM_REPORT_SHEET};
pub use error::{Error, Result, RowError, SheetError};
pub use export::{encode_xlsx, write_csv, write_json, write_xlsx};
pub use header::{extract_header, reconcile};
pub use merger::{
    eligible_sheets, merge, merge_workbook, MergeReport, SheetProgress, SheetSummary, Warning,
};
pub use normalizer::{normalize, NormalizedSheet, SheetRole};
pub use table::{fit_width, CanonicalHeader, CellValue, MergedTable, NormalizedRow, RawGrid};
pub use workbook::{CalamineWorkbook, InMemoryWorkbook, WorkbookSource};

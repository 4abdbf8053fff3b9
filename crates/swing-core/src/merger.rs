//! Merge engine: runs every eligible sheet through normalization and builds one table

use crate::bat_order::BatOrderTable;
use crate::config::MergeConfig;
use crate::error::{Error, Result, RowError, SheetError};
use crate::header::{duplicate_labels, raw_header_row, reconcile};
use crate::normalizer::{normalize, NormalizedSheet, SheetRole};
use crate::table::{CanonicalHeader, MergedTable, NormalizedRow, RawGrid};
use crate::workbook::WorkbookSource;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// Progress notification, sent once per sheet before it is processed
#[derive(Debug, Clone, Copy)]
pub struct SheetProgress<'a> {
    /// 0-based position among eligible sheets
    pub index: usize,
    pub total: usize,
    pub sheet: &'a str,
}

impl SheetProgress<'_> {
    /// Completed fraction once this sheet is done, `(index + 1) / total`
    pub fn fraction(&self) -> f64 {
        (self.index + 1) as f64 / self.total as f64
    }
}

/// A recoverable problem recorded during a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Warning {
    /// A subsequent sheet contributed nothing
    SheetSkipped { sheet: String, reason: SheetError },
    /// A single row was dropped
    RowSkipped {
        sheet: String,
        position: usize,
        reason: RowError,
    },
    /// Header labels that were disambiguated with numeric suffixes
    DuplicateHeaders { labels: Vec<String> },
    /// Rows whose primary column is not a date; they sort after dated rows
    UnparsableDates { count: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::SheetSkipped { sheet, reason } => {
                write!(f, "sheet '{}' skipped: {}", sheet, reason)
            }
            Warning::RowSkipped {
                sheet,
                position,
                reason,
            } => write!(f, "sheet '{}' row {} skipped: {}", sheet, position + 1, reason),
            Warning::DuplicateHeaders { labels } => {
                write!(f, "duplicate column labels numbered: {}", labels.join(", "))
            }
            Warning::UnparsableDates { count } => {
                write!(f, "{} rows have no valid date in the first column", count)
            }
        }
    }
}

/// Per-sheet outcome counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetSummary {
    pub sheet: String,
    pub kept: usize,
    pub filtered_out: usize,
    pub skipped_rows: usize,
}

/// Result of a run that did not abort
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    /// Header taken from the first sheet
    pub header: CanonicalHeader,
    /// Merged rows; `None` when no row survived
    pub table: Option<MergedTable>,
    /// Sheets that produced output, in processing order
    pub sheets: Vec<SheetSummary>,
    pub warnings: Vec<Warning>,
}

impl MergeReport {
    /// Whether the run finished without any rows
    pub fn is_empty(&self) -> bool {
        self.table.is_none()
    }
}

/// Eligible sheet names in workbook order
pub fn eligible_sheets(names: &[String], config: &MergeConfig) -> Vec<String> {
    names
        .iter()
        .filter(|name| config.is_eligible(name))
        .cloned()
        .collect()
}

/// Merge already-loaded sheets, in order.
///
/// Sheets are taken by position, so two entries with the same name are both
/// processed.
pub fn merge(sheets: Vec<(String, RawGrid)>, config: &MergeConfig) -> Result<MergeReport> {
    let (names, grids): (Vec<String>, Vec<RawGrid>) = sheets
        .into_iter()
        .filter(|(name, _)| config.is_eligible(name))
        .unzip();
    let mut grids: Vec<Option<RawGrid>> = grids.into_iter().map(Some).collect();

    merge_sheets(
        &names,
        |index, name| {
            grids
                .get_mut(index)
                .and_then(Option::take)
                .ok_or_else(|| SheetError::Unreadable(format!("sheet '{}' already consumed", name)))
        },
        config,
        |_| {},
    )
}

/// Merge every eligible sheet of a workbook.
///
/// The first eligible sheet supplies the header; any failure on it aborts the
/// run. Later sheets that fail are skipped with a warning.
pub fn merge_workbook<S, F>(source: &mut S, config: &MergeConfig, on_progress: F) -> Result<MergeReport>
where
    S: WorkbookSource + ?Sized,
    F: FnMut(&SheetProgress<'_>),
{
    let names = eligible_sheets(&source.sheet_names(), config);
    merge_sheets(&names, |_, name| source.read_grid(name), config, on_progress)
}

/// Drive normalization over eligible sheet names; `read` gets each sheet's
/// position in `names` and its name.
fn merge_sheets<R, F>(
    names: &[String],
    mut read: R,
    config: &MergeConfig,
    mut on_progress: F,
) -> Result<MergeReport>
where
    R: FnMut(usize, &str) -> std::result::Result<RawGrid, SheetError>,
    F: FnMut(&SheetProgress<'_>),
{
    let (first, rest) = names.split_first().ok_or(Error::NoEligibleSheets)?;
    let total = names.len();
    let bat_orders = BatOrderTable::global();

    let mut warnings = Vec::new();
    let mut summaries = Vec::new();
    let mut rows = Vec::new();

    on_progress(&SheetProgress {
        index: 0,
        total,
        sheet: first,
    });
    info!(sheet = %first, "reading header sheet");

    let grid = read(0, first).map_err(|reason| Error::first_sheet(first, reason))?;
    let raw_labels =
        raw_header_row(&grid, config.header_row).map_err(|reason| Error::first_sheet(first, reason))?;
    let duplicates = duplicate_labels(&raw_labels);
    if !duplicates.is_empty() {
        record(&mut warnings, Warning::DuplicateHeaders { labels: duplicates });
    }
    let header = reconcile(raw_labels);

    let first_sheet = normalize(first, &grid, &header, SheetRole::First, config, bat_orders)
        .map_err(|reason| Error::first_sheet(first, reason))?;
    absorb(first_sheet, &mut rows, &mut summaries, &mut warnings);

    for (offset, name) in rest.iter().enumerate() {
        let index = offset + 1;
        on_progress(&SheetProgress {
            index,
            total,
            sheet: name,
        });
        info!(sheet = %name, "processing sheet");

        let result = read(index, name).and_then(|grid| {
            normalize(name, &grid, &header, SheetRole::Subsequent, config, bat_orders)
        });
        match result {
            Ok(sheet) => absorb(sheet, &mut rows, &mut summaries, &mut warnings),
            Err(reason) => record(
                &mut warnings,
                Warning::SheetSkipped {
                    sheet: name.clone(),
                    reason,
                },
            ),
        }
    }

    if rows.is_empty() {
        info!("no rows to merge");
        return Ok(MergeReport {
            header,
            table: None,
            sheets: summaries,
            warnings,
        });
    }

    let mut table = MergedTable::new(header.clone(), rows);
    let unparsable = table.sort_by_primary();
    if unparsable > 0 {
        record(&mut warnings, Warning::UnparsableDates { count: unparsable });
    }

    info!(
        rows = table.row_count(),
        sheets = table.distinct_sheet_count(),
        warnings = warnings.len(),
        "merge complete"
    );

    Ok(MergeReport {
        header,
        table: Some(table),
        sheets: summaries,
        warnings,
    })
}

fn record(warnings: &mut Vec<Warning>, warning: Warning) {
    debug!("{}", warning);
    warnings.push(warning);
}

fn absorb(
    sheet: NormalizedSheet,
    rows: &mut Vec<NormalizedRow>,
    summaries: &mut Vec<SheetSummary>,
    warnings: &mut Vec<Warning>,
) {
    for skipped in &sheet.skipped_rows {
        record(
            warnings,
            Warning::RowSkipped {
                sheet: sheet.sheet.clone(),
                position: skipped.position,
                reason: skipped.error.clone(),
            },
        );
    }

    summaries.push(SheetSummary {
        sheet: sheet.sheet,
        kept: sheet.rows.len(),
        filtered_out: sheet.filtered_out,
        skipped_rows: sheet.skipped_rows.len(),
    });
    rows.extend(sheet.rows);
}

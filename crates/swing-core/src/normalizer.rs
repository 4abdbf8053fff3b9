//! Sheet normalization: maps one sheet's raw grid onto the canonical header

use crate::bat_order::BatOrderTable;
use crate::config::MergeConfig;
use crate::error::{RowError, SheetError};
use crate::table::{CanonicalHeader, CellValue, NormalizedRow, RawGrid};
use serde::Serialize;
use tracing::debug;

/// How a sheet's rows are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetRole {
    /// The sheet the header was taken from; every non-empty row is data
    First,
    /// Any later sheet; rows from `data_start_row` on are data, filtered to in-game swings
    Subsequent,
}

/// A row dropped during normalization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    /// Position among the sheet's non-empty rows
    pub position: usize,
    pub error: RowError,
}

/// Rows produced from one sheet
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSheet {
    pub sheet: String,
    pub rows: Vec<NormalizedRow>,
    pub skipped_rows: Vec<SkippedRow>,
    /// Rows dropped by the in-game filter
    pub filtered_out: usize,
}

/// Normalize one sheet against the canonical header.
///
/// Empty rows are removed first. A first sheet needs a row at `header_row` and
/// contributes every remaining row, header and pre-header rows included. A
/// subsequent sheet needs more than `data_start_row` rows, contributes rows from
/// `data_start_row` on, gets a slot code and is filtered on the swing condition
/// column.
pub fn normalize(
    sheet_name: &str,
    grid: &RawGrid,
    header: &CanonicalHeader,
    role: SheetRole,
    config: &MergeConfig,
    bat_orders: &BatOrderTable,
) -> Result<NormalizedSheet, SheetError> {
    let compact = grid.without_empty_rows();

    let mut sheet = NormalizedSheet {
        sheet: sheet_name.to_string(),
        rows: Vec::new(),
        skipped_rows: Vec::new(),
        filtered_out: 0,
    };

    match role {
        SheetRole::First => {
            let required = config.first_sheet_min_rows();
            if compact.row_count() < required {
                return Err(SheetError::TooShort {
                    rows: compact.row_count(),
                    required,
                });
            }

            sheet.rows.extend(
                compact
                    .rows()
                    .iter()
                    .map(|raw| NormalizedRow::fitted(header, raw, sheet_name)),
            );
        }
        SheetRole::Subsequent => {
            let required = config.subsequent_sheet_min_rows();
            if compact.row_count() < required {
                return Err(SheetError::TooShort {
                    rows: compact.row_count(),
                    required,
                });
            }

            let condition_idx = header
                .position(&config.swing_condition_column)
                .ok_or_else(|| SheetError::MissingColumn(config.swing_condition_column.clone()))?;
            let slot = bat_orders.slot_for(sheet_name);

            for (position, raw) in compact
                .rows()
                .iter()
                .enumerate()
                .skip(config.data_start_row)
            {
                let row = NormalizedRow::fitted(header, raw, sheet_name);
                match keep_in_game(row, condition_idx, config) {
                    Ok(Some(row)) => sheet.rows.push(row.with_bat_order(slot)),
                    Ok(None) => sheet.filtered_out += 1,
                    Err(error) => sheet.skipped_rows.push(SkippedRow { position, error }),
                }
            }
        }
    }

    debug!(
        sheet = sheet_name,
        kept = sheet.rows.len(),
        filtered = sheet.filtered_out,
        skipped = sheet.skipped_rows.len(),
        "normalized sheet"
    );

    Ok(sheet)
}

/// Apply the in-game filter to one row
fn keep_in_game(
    row: NormalizedRow,
    condition_idx: usize,
    config: &MergeConfig,
) -> Result<Option<NormalizedRow>, RowError> {
    match row.get(condition_idx) {
        Some(CellValue::Error(value)) => Err(RowError::UnreadableCell {
            column: config.swing_condition_column.clone(),
            value: value.clone(),
        }),
        Some(CellValue::Text(s)) if *s == config.in_game_value => Ok(Some(row)),
        _ => Ok(None),
    }
}

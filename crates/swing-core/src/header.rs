//! Header reconciliation: turns the first sheet's raw header row into unique labels

use crate::error::SheetError;
use crate::table::{CanonicalHeader, CellValue, RawGrid};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Build a collision-free header from raw labels.
///
/// Missing labels become `""`. The first occurrence of a non-empty label is kept
/// verbatim; its N-th repeat becomes `"{label}_{N}"` (first repeat `_1`). Blank
/// labels are always suffixed, so `["A", "A", "", "A", ""]` gives
/// `["A", "A_1", "_1", "A_2", "_2"]`. A generated name that would clash with a
/// label already emitted skips ahead to the next free suffix.
pub fn reconcile<I, S>(raw_labels: I) -> CanonicalHeader
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut emitted: HashSet<String> = HashSet::new();
    let mut labels = Vec::new();

    for raw in raw_labels {
        let label = match &raw {
            Some(s) => s.as_ref().to_string(),
            None => String::new(),
        };

        let unique = if !label.is_empty() && !seen.contains_key(&label) && !emitted.contains(&label)
        {
            seen.insert(label.clone(), 0);
            label
        } else {
            let mut count = seen.get(&label).copied().unwrap_or(0);
            let candidate = loop {
                count += 1;
                let candidate = format!("{}_{}", label, count);
                if !emitted.contains(&candidate) {
                    break candidate;
                }
            };
            seen.insert(label, count);
            candidate
        };

        emitted.insert(unique.clone());
        labels.push(unique);
    }

    CanonicalHeader::from_unique(labels)
}

/// Convert a header cell into an optional label
fn cell_label(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Empty => None,
        other => Some(other.to_string_value()),
    }
}

/// Raw labels of the header row, after empty rows are removed
///
/// Fails with `TooShort` when the grid has no row at `header_row`.
pub fn raw_header_row(grid: &RawGrid, header_row: usize) -> Result<Vec<Option<String>>, SheetError> {
    let compact = grid.without_empty_rows();
    let row = compact.rows().get(header_row).ok_or(SheetError::TooShort {
        rows: compact.row_count(),
        required: header_row + 1,
    })?;
    Ok(row.iter().map(cell_label).collect())
}

/// Extract and reconcile the header of the first sheet
pub fn extract_header(grid: &RawGrid, header_row: usize) -> Result<CanonicalHeader, SheetError> {
    let raw = raw_header_row(grid, header_row)?;
    Ok(reconcile(raw))
}

/// Non-empty labels that occur more than once, in first-seen order
pub fn duplicate_labels(raw_labels: &[Option<String>]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in raw_labels.iter().flatten() {
        *counts.entry(label.as_str()).or_default() += 1;
    }

    let mut reported = BTreeSet::new();
    raw_labels
        .iter()
        .flatten()
        .filter(|l| !l.is_empty() && counts[l.as_str()] > 1)
        .filter(|l| reported.insert(l.as_str()))
        .cloned()
        .collect()
}

//! Layout convention and business vocabulary for a merge run
//!
//! The defaults describe the swing-tracker export: header on the 9th non-empty
//! row of the first sheet, data from the 9th non-empty row of every other
//! sheet, and an "In Game" filter on the swing condition column.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Team summary sheet that never contributes rows
pub const TEAM_REPORT_SHEET: &str = "チームレポート";

/// Settings for one merge run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Sheet names skipped entirely
    pub excluded_sheets: Vec<String>,
    /// Position of the header row in the first sheet, after empty rows are removed.
    ///
    /// With the default of 8, equal to `data_start_row`, each subsequent sheet's
    /// own label row is read as its first data row and then dropped by the
    /// in-game filter. An earlier version of this tool took the labels from
    /// position 7, so that row never reached the filter; set 7 here to
    /// reproduce that.
    pub header_row: usize,
    /// Position of the first data row in subsequent sheets, after empty rows are removed
    pub data_start_row: usize,
    /// Header label of the column the in-game filter reads
    pub swing_condition_column: String,
    /// Value a subsequent-sheet row must hold in that column to be kept
    pub in_game_value: String,
    /// Output label of the provenance column
    pub source_sheet_column: String,
    /// Output label of the slot code column
    pub bat_order_column: String,
    /// Name of the single sheet in the exported workbook
    pub output_sheet_name: String,
    /// Excel number format applied to date cells on export
    pub date_num_format: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            excluded_sheets: vec![TEAM_REPORT_SHEET.to_string()],
            header_row: 8,
            data_start_row: 8,
            swing_condition_column: "スイング条件".to_string(),
            in_game_value: "In Game".to_string(),
            source_sheet_column: "source_sheet".to_string(),
            bat_order_column: "bat_order".to_string(),
            output_sheet_name: "summary".to_string(),
            date_num_format: "yyyy-mm-dd".to_string(),
        }
    }
}

impl MergeConfig {
    /// Load a config from a JSON file; missing fields take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the config as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Whether a sheet takes part in the merge
    pub fn is_eligible(&self, sheet_name: &str) -> bool {
        !self.excluded_sheets.iter().any(|s| s == sheet_name)
    }

    /// Non-empty rows the first sheet needs
    pub fn first_sheet_min_rows(&self) -> usize {
        self.header_row + 1
    }

    /// Non-empty rows a subsequent sheet needs
    pub fn subsequent_sheet_min_rows(&self) -> usize {
        self.data_start_row + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = MergeConfig::default();
        assert!(!config.is_eligible("チームレポート"));
        assert!(config.is_eligible("2302 Player"));
        assert_eq!(config.first_sheet_min_rows(), 9);
        assert_eq!(config.subsequent_sheet_min_rows(), 9);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MergeConfig =
            serde_json::from_str(r#"{"in_game_value": "Practice"}"#).unwrap();
        assert_eq!(config.in_game_value, "Practice");
        assert_eq!(config.header_row, 8);
        assert_eq!(config.output_sheet_name, "summary");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = MergeConfig::default();
        config.excluded_sheets.push("Notes".to_string());
        config.save(&path).unwrap();

        let loaded = MergeConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = MergeConfig::load("/nonexistent/config.json").unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}

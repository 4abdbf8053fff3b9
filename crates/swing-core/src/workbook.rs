//! Workbook readers: sheet names and raw cell grids

use crate::error::{Error, Result, SheetError};
use crate::table::{CellValue, RawGrid};
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader, Sheets};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};

/// Anything that can list sheets and produce a grid per sheet
pub trait WorkbookSource {
    /// Sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Read one sheet's cells
    fn read_grid(&mut self, sheet_name: &str) -> std::result::Result<RawGrid, SheetError>;
}

/// Workbook read through calamine (xlsx, xlsm, xlsb, xls, ods)
pub struct CalamineWorkbook<RS: Read + Seek> {
    sheets: Sheets<RS>,
}

impl CalamineWorkbook<BufReader<File>> {
    /// Open a workbook file, detecting the format from its extension
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let sheets = open_workbook_auto(path).map_err(|e| Error::WorkbookOpen {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self { sheets })
    }
}

impl CalamineWorkbook<Cursor<Vec<u8>>> {
    /// Open a workbook held in memory, e.g. an uploaded file
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let sheets = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| Error::WorkbookOpen {
            path: PathBuf::from("<memory>"),
            source: e,
        })?;
        Ok(Self { sheets })
    }
}

impl<RS: Read + Seek> WorkbookSource for CalamineWorkbook<RS> {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets
            .sheet_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn read_grid(&mut self, sheet_name: &str) -> std::result::Result<RawGrid, SheetError> {
        let range = self
            .sheets
            .worksheet_range(sheet_name)
            .map_err(|e| SheetError::Unreadable(e.to_string()))?;

        // calamine trims leading blank columns; restore them so positions match column A
        let leading = range.start().map_or(0, |(_, col)| col as usize);

        let rows = range
            .rows()
            .map(|row| {
                let mut cells = vec![CellValue::Empty; leading];
                cells.extend(row.iter().map(data_to_cell_value));
                cells
            })
            .collect();

        Ok(RawGrid::new(rows))
    }
}

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => CellValue::Number(dt.as_f64()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or_else(|| CellValue::Error(format!("#DATE({})", dt.as_f64())), CellValue::Date),
        Data::DateTimeIso(s) => {
            let text = CellValue::from(s.as_str());
            text.as_datetime().map_or(text, CellValue::Date)
        }
        Data::DurationIso(s) => CellValue::from(s.as_str()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}

/// Sheets held in memory, in insertion order; `read_grid` returns the first sheet with a name
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkbook {
    sheets: Vec<(String, std::result::Result<RawGrid, String>)>,
}

impl InMemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a readable sheet
    pub fn add_sheet(&mut self, name: impl Into<String>, grid: RawGrid) -> &mut Self {
        self.sheets.push((name.into(), Ok(grid)));
        self
    }

    /// Append a sheet whose grid cannot be read
    pub fn add_unreadable(&mut self, name: impl Into<String>, reason: impl Into<String>) -> &mut Self {
        self.sheets.push((name.into(), Err(reason.into())));
        self
    }
}

impl FromIterator<(String, RawGrid)> for InMemoryWorkbook {
    fn from_iter<T: IntoIterator<Item = (String, RawGrid)>>(iter: T) -> Self {
        Self {
            sheets: iter.into_iter().map(|(name, grid)| (name, Ok(grid))).collect(),
        }
    }
}

impl WorkbookSource for InMemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_grid(&mut self, sheet_name: &str) -> std::result::Result<RawGrid, SheetError> {
        match self.sheets.iter().find(|(name, _)| name == sheet_name) {
            Some((_, Ok(grid))) => Ok(grid.clone()),
            Some((_, Err(reason))) => Err(SheetError::Unreadable(reason.clone())),
            None => Err(SheetError::Unreadable(format!("sheet '{}' not found", sheet_name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
    use tempfile::tempdir;

    fn sample_workbook() -> Workbook {
        let mut workbook = Workbook::new();

        let report = workbook.add_worksheet();
        report.set_name("チームレポート").unwrap();
        report.write_string(0, 0, "team totals").unwrap();

        let player = workbook.add_worksheet();
        player.set_name("2302 Player").unwrap();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let date = ExcelDateTime::from_ymd(2024, 5, 1).unwrap();
        player.write_string(0, 1, "Date").unwrap();
        player.write_string(0, 2, "Speed").unwrap();
        player.write_datetime_with_format(1, 1, &date, &date_format).unwrap();
        player.write_number(1, 2, 71.5).unwrap();
        player.write_boolean(2, 2, true).unwrap();

        workbook
    }

    #[test]
    fn test_open_file_and_read_grid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("export.xlsx");
        sample_workbook().save(&path).unwrap();

        let mut workbook = CalamineWorkbook::open(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["チームレポート", "2302 Player"]);

        let grid = workbook.read_grid("2302 Player").unwrap();
        assert_eq!(grid.row_count(), 3);
        // leading blank column A is preserved
        assert_eq!(grid.rows()[0][0], CellValue::Empty);
        assert_eq!(grid.rows()[0][1], CellValue::Text("Date".to_string()));
        assert_eq!(
            grid.rows()[1][1],
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(0, 0, 0).unwrap())
        );
        assert_eq!(grid.rows()[1][2], CellValue::Number(71.5));
        assert_eq!(grid.rows()[2][2], CellValue::Bool(true));
    }

    #[test]
    fn test_open_from_bytes() {
        let bytes = sample_workbook().save_to_buffer().unwrap();

        let mut workbook = CalamineWorkbook::from_bytes(bytes).unwrap();
        let grid = workbook.read_grid("チームレポート").unwrap();
        assert_eq!(grid.rows()[0][0], CellValue::Text("team totals".to_string()));
    }

    #[test]
    fn test_missing_sheet_is_unreadable() {
        let bytes = sample_workbook().save_to_buffer().unwrap();
        let mut workbook = CalamineWorkbook::from_bytes(bytes).unwrap();
        assert!(matches!(
            workbook.read_grid("Nope"),
            Err(SheetError::Unreadable(_))
        ));
    }

    #[test]
    fn test_open_missing_file() {
        let result = CalamineWorkbook::open("/nonexistent/export.xlsx");
        assert!(matches!(result, Err(Error::WorkbookOpen { .. })));
    }

    #[test]
    fn test_in_memory_workbook() {
        let mut workbook = InMemoryWorkbook::new();
        workbook
            .add_sheet("a", RawGrid::from_text(&[["x"]]))
            .add_unreadable("b", "corrupt");

        assert_eq!(workbook.sheet_names(), vec!["a", "b"]);
        assert_eq!(workbook.read_grid("a").unwrap().row_count(), 1);
        assert_eq!(
            workbook.read_grid("b"),
            Err(SheetError::Unreadable("corrupt".to_string()))
        );
    }
}

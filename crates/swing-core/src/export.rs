//! Export of the merged table: xlsx (primary), CSV and JSON

use crate::config::MergeConfig;
use crate::error::{Error, Result};
use crate::table::{CellValue, MergedTable};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Encode the table as a single-sheet xlsx workbook
pub fn encode_xlsx(table: &MergedTable, config: &MergeConfig) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&config.output_sheet_name)?;
    write_worksheet(worksheet, table, config)?;
    Ok(workbook.save_to_buffer()?)
}

/// Write the xlsx encoding to a file
pub fn write_xlsx<P: AsRef<Path>>(table: &MergedTable, config: &MergeConfig, path: P) -> Result<()> {
    let bytes = encode_xlsx(table, config)?;
    fs::write(path, bytes)?;
    Ok(())
}

fn write_worksheet(worksheet: &mut Worksheet, table: &MergedTable, config: &MergeConfig) -> Result<()> {
    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format(&config.date_num_format);

    let labels = table.output_labels(&config.source_sheet_column, &config.bat_order_column);
    for (col_idx, label) in labels.iter().enumerate() {
        worksheet.write_string_with_format(0, column_number(col_idx)?, *label, &header_format)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = u32::try_from(row_idx + 1)
            .map_err(|_| Error::ExportLimit(format!("row {} out of range", row_idx + 1)))?;

        for (col_idx, cell) in MergedTable::output_cells(row).iter().enumerate() {
            let col_num = column_number(col_idx)?;
            match cell {
                CellValue::Empty => {}
                CellValue::Text(s) | CellValue::Error(s) => {
                    worksheet.write_string(row_num, col_num, s)?;
                }
                CellValue::Number(n) => {
                    worksheet.write_number(row_num, col_num, *n)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(row_num, col_num, *b)?;
                }
                CellValue::Date(dt) => {
                    worksheet.write_datetime_with_format(row_num, col_num, dt, &date_format)?;
                }
            }
        }
    }

    Ok(())
}

fn column_number(col_idx: usize) -> Result<u16> {
    u16::try_from(col_idx).map_err(|_| Error::ExportLimit(format!("column {} out of range", col_idx)))
}

/// Write the table as CSV with a header line; dates as `YYYY-MM-DD`
pub fn write_csv<W: Write>(table: &MergedTable, config: &MergeConfig, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(table.output_labels(&config.source_sheet_column, &config.bat_order_column))?;
    for row in &table.rows {
        csv_writer.write_record(MergedTable::output_cells(row).iter().map(CellValue::to_string_value))?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write the table as pretty JSON
pub fn write_json<W: Write>(table: &MergedTable, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, table)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::reconcile;
    use crate::table::NormalizedRow;
    use crate::workbook::{CalamineWorkbook, WorkbookSource};
    use chrono::NaiveDate;

    fn sample_table() -> MergedTable {
        let header = reconcile(["Date", "Speed"].map(Some));
        let date = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let rows = vec![
            NormalizedRow::new(&header, vec![CellValue::Date(date), CellValue::Number(70.5)], "first")
                .unwrap(),
            NormalizedRow::new(&header, vec!["2024-05-02".into(), CellValue::Empty], "2302 Player")
                .unwrap()
                .with_bat_order("h_1"),
        ];
        MergedTable::new(header, rows)
    }

    #[test]
    fn test_encode_xlsx_single_summary_sheet() {
        let config = MergeConfig::default();
        let bytes = encode_xlsx(&sample_table(), &config).unwrap();

        let mut workbook = CalamineWorkbook::from_bytes(bytes).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["summary"]);

        let grid = workbook.read_grid("summary").unwrap();
        assert_eq!(grid.row_count(), 3);
        assert_eq!(
            grid.rows()[0],
            vec![
                CellValue::from("Date"),
                CellValue::from("Speed"),
                CellValue::from("source_sheet"),
                CellValue::from("bat_order"),
            ]
        );
        assert_eq!(grid.rows()[1][0].to_string(), "2024-05-01");
        assert_eq!(grid.rows()[1][1], CellValue::Number(70.5));
        assert_eq!(grid.rows()[1][2], CellValue::from("first"));
        assert_eq!(grid.rows()[1][3], CellValue::Empty);
        assert_eq!(grid.rows()[2][3], CellValue::from("h_1"));
    }

    #[test]
    fn test_write_xlsx_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merged.xlsx");

        write_xlsx(&sample_table(), &MergeConfig::default(), &path).unwrap();

        assert!(path.exists());
        let workbook = CalamineWorkbook::open(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["summary"]);
    }

    #[test]
    fn test_write_csv() {
        let mut out = Vec::new();
        write_csv(&sample_table(), &MergeConfig::default(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Date,Speed,source_sheet,bat_order");
        assert_eq!(lines[1], "2024-05-01,70.5,first,");
        assert_eq!(lines[2], "2024-05-02,,2302 Player,h_1");
    }

    #[test]
    fn test_write_json() {
        let mut out = Vec::new();
        write_json(&sample_table(), &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["header"][0], "Date");
        assert_eq!(value["rows"][1]["bat_order"], "h_1");
        assert_eq!(value["rows"][0]["bat_order"], serde_json::Value::Null);
    }
}

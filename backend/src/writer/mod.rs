//! Output sink: render a [`Table`] as xlsx, CSV or JSON.

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::fmt;
use std::str::FromStr;

use crate::error::{WorkbookError, WorkbookResult};
use crate::models::{CellValue, Table};

/// MIME type of xlsx downloads.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Largest integer an xlsx number cell (f64) holds exactly; larger ones are
/// written as text.
const MAX_EXACT_INTEGER: u64 = 1 << 53;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Xlsx,
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xlsx" | "excel" => Ok(OutputFormat::Xlsx),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown format '{}' (expected xlsx, csv or json)", other)),
        }
    }
}

/// Render `table` in `format`. `sheet_title` only applies to xlsx.
pub fn render(table: &Table, format: OutputFormat, sheet_title: &str) -> WorkbookResult<Vec<u8>> {
    match format {
        OutputFormat::Xlsx => write_table(table, sheet_title),
        OutputFormat::Csv => to_csv(table),
        OutputFormat::Json => to_json(table).map(String::into_bytes),
    }
}

/// Serialize `table` as a single-sheet xlsx workbook.
///
/// Header row in bold, then data rows in table order with native cell types.
pub fn write_table(table: &Table, sheet_title: &str) -> WorkbookResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_title)?;

    for (col, name) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, column_number(col)?, name, &header_format)?;
    }

    for (index, row) in table.rows().iter().enumerate() {
        let row_number = u32::try_from(index + 1)
            .map_err(|_| WorkbookError::Write(format!("too many rows ({})", table.len())))?;
        for (col, (_, value)) in row.iter().enumerate() {
            write_cell(worksheet, row_number, column_number(col)?, value, &date_format)?;
        }
    }

    worksheet.autofit();

    Ok(workbook.save_to_buffer()?)
}

fn column_number(col: usize) -> WorkbookResult<u16> {
    u16::try_from(col).map_err(|_| WorkbookError::Write(format!("too many columns ({})", col + 1)))
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    date_format: &Format,
) -> WorkbookResult<()> {
    match value {
        CellValue::Empty => {}
        CellValue::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
        CellValue::Int(n) if n.unsigned_abs() > MAX_EXACT_INTEGER => {
            worksheet.write_string(row, col, n.to_string())?;
        }
        CellValue::Int(n) => {
            worksheet.write_number(row, col, *n as f64)?;
        }
        CellValue::Float(f) => {
            worksheet.write_number(row, col, *f)?;
        }
        CellValue::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        CellValue::DateTime(dt) => {
            worksheet.write_datetime_with_format(row, col, dt, date_format)?;
        }
    }
    Ok(())
}

/// Serialize `table` as comma-delimited CSV with a header line.
pub fn to_csv(table: &Table) -> WorkbookResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(table.columns())
        .map_err(|e| WorkbookError::Write(e.to_string()))?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(|(_, v)| v.as_text().into_owned()))
            .map_err(|e| WorkbookError::Write(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| WorkbookError::Write(e.to_string()))
}

/// Serialize the rows of `table` as a pretty JSON array of objects.
pub fn to_json(table: &Table) -> WorkbookResult<String> {
    serde_json::to_string_pretty(table.rows()).map_err(|e| WorkbookError::Write(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Row;

    fn plants() -> Table {
        let row: Row = [
            ("Plant ID", CellValue::from("25s.0001-001")),
            ("Transplant Count", CellValue::Int(2)),
            ("note", CellValue::from("a, b")),
            ("weight", CellValue::Empty),
        ]
        .into_iter()
        .collect();
        Table::with_rows(
            vec!["Plant ID".into(), "Transplant Count".into(), "note".into(), "weight".into()],
            [row],
        )
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("xlsx".parse::<OutputFormat>().unwrap(), OutputFormat::Xlsx);
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("pdf".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_csv_output() {
        let csv = String::from_utf8(to_csv(&plants()).unwrap()).unwrap();
        assert_eq!(
            csv,
            "Plant ID,Transplant Count,note,weight\n25s.0001-001,2,\"a, b\",\n"
        );
    }

    #[test]
    fn test_json_output_keeps_column_order() {
        let json = to_json(&plants()).unwrap();
        let plant = json.find("Plant ID").unwrap();
        let count = json.find("Transplant Count").unwrap();
        assert!(plant < count);

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["Transplant Count"], 2);
        assert!(parsed[0]["weight"].is_null());
    }

    #[test]
    fn test_xlsx_is_zip() {
        let bytes = write_table(&plants(), "Plant List").unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_invalid_sheet_title_rejected() {
        assert!(write_table(&plants(), "bad/title").is_err());
    }
}

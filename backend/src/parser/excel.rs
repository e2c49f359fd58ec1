//! Spreadsheet sheets (xlsx, xlsm, xls, ods) via calamine.

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use std::io::Cursor;

use crate::error::{WorkbookError, WorkbookResult};
use crate::models::{CellValue, Table};

use super::build_table;

/// An opened spreadsheet held in memory.
pub struct ExcelSource {
    sheets: Sheets<Cursor<Vec<u8>>>,
}

impl ExcelSource {
    pub fn from_bytes(bytes: Vec<u8>) -> WorkbookResult<Self> {
        let sheets = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| WorkbookError::Unreadable(format!("Failed to open spreadsheet: {}", e)))?;
        Ok(Self { sheets })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    /// Read one sheet; its first row is the header.
    pub fn read_table(&mut self, sheet: &str) -> WorkbookResult<Table> {
        let range = self
            .sheets
            .worksheet_range(sheet)
            .map_err(|e| WorkbookError::Unreadable(format!("Failed to read sheet '{}': {}", sheet, e)))?;
        Ok(range_to_table(&range))
    }
}

fn range_to_table(range: &Range<Data>) -> Table {
    let mut rows = range.rows();
    let header = match rows.next() {
        Some(cells) => cells.iter().map(|c| cell_value(c).as_text().into_owned()).collect(),
        None => return Table::default(),
    };
    let data = rows.map(|cells| cells.iter().map(cell_value).collect()).collect();
    build_table(header, data)
}

/// Convert a calamine cell, keeping its native type.
pub fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => {
            if s.trim().is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(s.clone())
            }
        }
        Data::Int(n) => CellValue::Int(*n),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(dt) => CellValue::DateTime(dt),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

//! Workbook source: list sheets and read one sheet into a [`Table`].
//!
//! The format is sniffed from the content, not the file name:
//!
//! | Magic bytes      | Format            | Backend                 |
//! |------------------|-------------------|-------------------------|
//! | `PK\x03\x04`     | xlsx / xlsm / ods | calamine                |
//! | `D0 CF 11 E0`    | xls               | calamine                |
//! | anything else    | CSV / TSV         | csv + chardet decoding  |
//!
//! A delimited file exposes a single sheet named after its file stem.

pub mod delimited;
pub mod excel;

use std::collections::HashMap;
use std::path::Path;

use crate::error::{WorkbookError, WorkbookResult};
use crate::models::{CellValue, Row, Table};

use excel::ExcelSource;

/// Sheet name given to delimited files without a usable file name.
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

enum Source {
    Excel(ExcelSource),
    Delimited { sheet: String, table: Table },
}

/// An uploaded workbook.
pub struct Workbook {
    name: String,
    source: Source,
}

impl Workbook {
    /// Open a workbook from raw bytes.
    ///
    /// `file_name` only names the workbook (and the sheet of a CSV file).
    pub fn from_bytes(bytes: Vec<u8>, file_name: Option<&str>) -> WorkbookResult<Self> {
        let name = file_name.unwrap_or("upload").to_string();

        if bytes.is_empty() {
            return Err(WorkbookError::Unreadable("file is empty".to_string()));
        }

        let source = if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
            Source::Excel(ExcelSource::from_bytes(bytes)?)
        } else {
            let sheet = file_name
                .and_then(|n| Path::new(n).file_stem())
                .and_then(|s| s.to_str())
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_SHEET_NAME)
                .to_string();
            Source::Delimited {
                sheet,
                table: delimited::parse_bytes(&bytes)?,
            }
        };

        Ok(Self { name, source })
    }

    /// Open a workbook file.
    pub fn open(path: &Path) -> WorkbookResult<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path.file_name().and_then(|n| n.to_str());
        Self::from_bytes(bytes, file_name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<String> {
        match &self.source {
            Source::Excel(excel) => excel.sheet_names(),
            Source::Delimited { sheet, .. } => vec![sheet.clone()],
        }
    }

    /// Read `sheet` into a table.
    pub fn read_table(&mut self, sheet: &str) -> WorkbookResult<Table> {
        let available = self.sheet_names();
        if !available.iter().any(|s| s == sheet) {
            return Err(WorkbookError::SheetNotFound {
                sheet: sheet.to_string(),
                available,
            });
        }

        match &mut self.source {
            Source::Excel(excel) => excel.read_table(sheet),
            Source::Delimited { table, .. } => Ok(table.clone()),
        }
    }
}

/// Build a table from a raw header and raw rows.
///
/// Blank headers become `Unnamed: <index>`, repeated headers get `.1`, `.2`
/// suffixes, and rows whose cells are all blank are dropped.
pub(crate) fn build_table(header: Vec<String>, rows: Vec<Vec<CellValue>>) -> Table {
    let columns = normalize_header(header);

    let rows = rows
        .into_iter()
        .filter(|cells| !cells.iter().all(CellValue::is_blank))
        .map(|cells| {
            let mut cells = cells.into_iter();
            columns
                .iter()
                .map(|c| (c.clone(), cells.next().unwrap_or_default()))
                .collect::<Row>()
        })
        .collect::<Vec<_>>();

    Table::with_rows(columns, rows)
}

fn normalize_header(header: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::with_capacity(header.len());

    for (index, raw) in header.into_iter().enumerate() {
        let base = if raw.trim().is_empty() {
            format!("Unnamed: {}", index)
        } else {
            raw
        };

        let mut name = base.clone();
        while columns.contains(&name) {
            let n = seen.entry(base.clone()).or_insert(0);
            *n += 1;
            name = format!("{}.{}", base, n);
        }
        columns.push(name);
    }

    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        let header = vec!["sow.nr".into(), "".into(), "Ty1".into(), "Ty1".into(), "Ty1".into()];
        assert_eq!(
            normalize_header(header),
            vec!["sow.nr", "Unnamed: 1", "Ty1", "Ty1.1", "Ty1.2"]
        );
    }

    #[test]
    fn test_build_table_pads_and_skips_blank_rows() {
        let header = vec!["a".to_string(), "b".to_string()];
        let rows = vec![
            vec![CellValue::Int(1)],
            vec![CellValue::Empty, CellValue::from("  ")],
            vec![CellValue::Int(2), CellValue::Int(3), CellValue::Int(4)],
        ];

        let table = build_table(header, rows);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].value("b"), &CellValue::Empty);
        assert_eq!(table.rows()[1].value("b"), &CellValue::Int(3));
    }

    #[test]
    fn test_csv_workbook_single_sheet() {
        let mut wb = Workbook::from_bytes(
            b"sow.nr;transplant\n25s.0001;3\n".to_vec(),
            Some("spring_lots.csv"),
        )
        .unwrap();

        assert_eq!(wb.sheet_names(), vec!["spring_lots"]);
        let table = wb.read_table("spring_lots").unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_sheet_not_found() {
        let mut wb = Workbook::from_bytes(b"a,b\n1,2\n".to_vec(), None).unwrap();
        match wb.read_table("Plan") {
            Err(WorkbookError::SheetNotFound { sheet, available }) => {
                assert_eq!(sheet, "Plan");
                assert_eq!(available, vec![DEFAULT_SHEET_NAME]);
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected SheetNotFound"),
        }
    }

    #[test]
    fn test_empty_upload_rejected() {
        assert!(matches!(
            Workbook::from_bytes(Vec::new(), Some("x.xlsx")),
            Err(WorkbookError::Unreadable(_))
        ));
    }
}

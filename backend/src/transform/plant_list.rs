//! Plant list expansion: one seed-lot row becomes `transplant` plant rows.
//!
//! ```text
//! sow.nr    transplant generation        Plant ID      Transplant Count sow.nr   ... generation
//! 25s.0001  2          F2           →    25s.0001-001  2                25s.0001 ... F3
//!                                        25s.0001-002  2                25s.0001 ... F3
//! ```

use crate::error::ExpandResult;
use crate::models::{CellValue, Table};

use super::columns::GENERATION_COLUMN;
use super::generation::next_generation_cell;
use super::{child_id, read_count, BlankCount};

/// Generated plant identifier column.
pub const PLANT_ID_COLUMN: &str = "Plant ID";

/// Repeated transplant count column.
pub const TRANSPLANT_COUNT_COLUMN: &str = "Transplant Count";

/// Expand every row of `table` into per-plant rows.
///
/// `id_column` and `count_column` must already be resolved against the
/// table header. Output columns are `Plant ID`, `Transplant Count`, then the
/// source columns in order. A row with count 0 contributes nothing; a blank,
/// non-integer or negative count aborts the whole table.
pub fn expand_plant_list(table: &Table, id_column: &str, count_column: &str) -> ExpandResult<Table> {
    let mut columns = vec![
        PLANT_ID_COLUMN.to_string(),
        TRANSPLANT_COUNT_COLUMN.to_string(),
    ];
    columns.extend(
        table
            .columns()
            .iter()
            .filter(|c| c.as_str() != PLANT_ID_COLUMN && c.as_str() != TRANSPLANT_COUNT_COLUMN)
            .cloned(),
    );
    let mut output = Table::new(columns);

    for (index, row) in table.rows().iter().enumerate() {
        let count = read_count(row, count_column, index, BlankCount::Reject)?;
        if count == 0 {
            continue;
        }

        let base_id = row.value(id_column).as_text().into_owned();
        let template = match row.get(GENERATION_COLUMN) {
            Some(generation) => row.with_value(GENERATION_COLUMN, next_generation_cell(generation)),
            None => row.clone(),
        };

        for plant in 1..=count {
            let derived = template
                .with_value(PLANT_ID_COLUMN, child_id(&base_id, plant))
                .with_value(TRANSPLANT_COUNT_COLUMN, CellValue::Int(count as i64));
            output.push(derived);
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExpandError;
    use crate::models::Row;

    fn lots(rows: Vec<Vec<(&str, CellValue)>>) -> Table {
        let columns = rows[0].iter().map(|(k, _)| k.to_string()).collect();
        Table::with_rows(columns, rows.into_iter().map(|r| r.into_iter().collect::<Row>()))
    }

    fn plant_ids(table: &Table) -> Vec<String> {
        table
            .rows()
            .iter()
            .map(|r| r.value(PLANT_ID_COLUMN).to_string())
            .collect()
    }

    #[test]
    fn test_end_to_end_generation() {
        let table = lots(vec![
            vec![
                ("25s.sow.nr", CellValue::from("25s.0001")),
                ("transplant", CellValue::Float(2.0)),
                ("generation", CellValue::from("F2")),
            ],
            vec![
                ("25s.sow.nr", CellValue::from("25s.0002")),
                ("transplant", CellValue::Float(1.0)),
                ("generation", CellValue::Empty),
            ],
        ]);

        let out = expand_plant_list(&table, "25s.sow.nr", "transplant").unwrap();

        assert_eq!(plant_ids(&out), vec!["25s.0001-001", "25s.0001-002", "25s.0002-001"]);
        let generations: Vec<String> = out
            .rows()
            .iter()
            .map(|r| r.value("generation").to_string())
            .collect();
        assert_eq!(generations, vec!["F3", "F3", "F1"]);
    }

    #[test]
    fn test_inserted_columns_come_first() {
        let table = lots(vec![vec![
            ("note", CellValue::from("early")),
            ("sow.nr", CellValue::from("A")),
            ("transplant", CellValue::Int(1)),
        ]]);

        let out = expand_plant_list(&table, "sow.nr", "transplant").unwrap();
        assert_eq!(
            out.columns(),
            &["Plant ID", "Transplant Count", "note", "sow.nr", "transplant"]
        );
        assert_eq!(out.rows()[0].value(TRANSPLANT_COUNT_COLUMN), &CellValue::Int(1));
    }

    #[test]
    fn test_identifiers_are_contiguous() {
        let table = lots(vec![vec![
            ("sow.nr", CellValue::from("25s.0100")),
            ("transplant", CellValue::Int(12)),
        ]]);

        let out = expand_plant_list(&table, "sow.nr", "transplant").unwrap();
        let ids = plant_ids(&out);
        assert_eq!(ids.len(), 12);
        assert_eq!(ids[0], "25s.0100-001");
        assert_eq!(ids[9], "25s.0100-010");
        assert_eq!(ids[11], "25s.0100-012");
        assert!(out
            .rows()
            .iter()
            .all(|r| r.value(TRANSPLANT_COUNT_COLUMN) == &CellValue::Int(12)));
    }

    #[test]
    fn test_other_columns_preserved() {
        let table = lots(vec![vec![
            ("sow.nr", CellValue::from("L1")),
            ("transplant", CellValue::Int(2)),
            ("parent", CellValue::from("P-7 x P-9")),
            ("tray", CellValue::Int(14)),
        ]]);

        let out = expand_plant_list(&table, "sow.nr", "transplant").unwrap();
        for row in out.rows() {
            assert_eq!(row.value("parent"), &CellValue::from("P-7 x P-9"));
            assert_eq!(row.value("tray"), &CellValue::Int(14));
            assert_eq!(row.value("transplant"), &CellValue::Int(2));
            assert_eq!(row.value("sow.nr"), &CellValue::from("L1"));
        }
    }

    #[test]
    fn test_without_generation_column_none_added() {
        let table = lots(vec![vec![
            ("sow.nr", CellValue::from("L1")),
            ("transplant", CellValue::Int(1)),
        ]]);

        let out = expand_plant_list(&table, "sow.nr", "transplant").unwrap();
        assert!(!out.has_column("generation"));
        assert!(!out.rows()[0].contains("generation"));
    }

    #[test]
    fn test_zero_count_skips_row_only() {
        let table = lots(vec![
            vec![("sow.nr", CellValue::from("A")), ("transplant", CellValue::Int(0))],
            vec![("sow.nr", CellValue::from("B")), ("transplant", CellValue::Int(2))],
        ]);

        let out = expand_plant_list(&table, "sow.nr", "transplant").unwrap();
        assert_eq!(plant_ids(&out), vec!["B-001", "B-002"]);
    }

    #[test]
    fn test_negative_count_rejected() {
        let table = lots(vec![
            vec![("sow.nr", CellValue::from("A")), ("transplant", CellValue::Int(3))],
            vec![("sow.nr", CellValue::from("B")), ("transplant", CellValue::Int(-1))],
        ]);

        match expand_plant_list(&table, "sow.nr", "transplant") {
            Err(ExpandError::InvalidCount { row, column, .. }) => {
                assert_eq!(row, 3);
                assert_eq!(column, "transplant");
            }
            other => panic!("expected InvalidCount, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_or_text_count_rejected() {
        let blank = lots(vec![vec![("sow.nr", CellValue::from("A")), ("transplant", CellValue::Empty)]]);
        assert!(matches!(
            expand_plant_list(&blank, "sow.nr", "transplant"),
            Err(ExpandError::InvalidCount { .. })
        ));

        let text = lots(vec![vec![("sow.nr", CellValue::from("A")), ("transplant", CellValue::from("ten"))]]);
        assert!(matches!(
            expand_plant_list(&text, "sow.nr", "transplant"),
            Err(ExpandError::InvalidCount { .. })
        ));
    }

    #[test]
    fn test_numeric_base_id() {
        let table = lots(vec![vec![
            ("field.nr", CellValue::Float(2501.0)),
            ("transplant", CellValue::Int(1)),
        ]]);

        let out = expand_plant_list(&table, "field.nr", "transplant").unwrap();
        assert_eq!(plant_ids(&out), vec!["2501-001"]);
    }

    #[test]
    fn test_existing_plant_id_column_replaced() {
        let table = lots(vec![vec![
            ("Plant ID", CellValue::from("old")),
            ("sow.nr", CellValue::from("A")),
            ("transplant", CellValue::Int(1)),
        ]]);

        let out = expand_plant_list(&table, "sow.nr", "transplant").unwrap();
        assert_eq!(out.columns().iter().filter(|c| *c == "Plant ID").count(), 1);
        assert_eq!(plant_ids(&out), vec!["A-001"]);
    }
}

//! Marker sample expansion: one count-sheet row becomes one row per sample.
//!
//! ```text
//! sow.nr    Ty1 Ty2 Ty3 Tm-2a        sow.nr    sample.nr     Ty1 Ty2 Ty3 Tm-2a
//! 25s.0171  3   0   3   0       →    25s.0171  25s.0171-001  yes no  yes no
//!                                    25s.0171  25s.0171-002  yes no  yes no
//!                                    25s.0171  25s.0171-003  yes no  yes no
//! ```

use crate::error::{ExpandError, ExpandResult};
use crate::models::{CellValue, Row, Table};

use super::columns::ColumnRole;
use super::markers::TestDecision;
use super::{child_id, read_count, BlankCount};

/// Identifier column expected in count sheets.
pub const DEFAULT_ID_COLUMN: &str = "sow.nr";

/// Generated sample identifier column.
pub const SAMPLE_COLUMN: &str = "sample.nr";

/// Expand a marker count sheet into per-sample rows.
///
/// Every column other than `id_column` is a marker count (blank = 0). Each row
/// yields as many samples as its largest count; sample `i` is marked "yes"
/// for a marker when `i` is within that marker's count.
pub fn expand_marker_samples(table: &Table, id_column: &str) -> ExpandResult<Table> {
    if !table.has_column(id_column) {
        return Err(ExpandError::MissingColumn {
            roles: vec![ColumnRole::SampleId(id_column.to_string())],
        });
    }

    let id_lower = id_column.to_lowercase();
    let markers: Vec<&String> = table
        .columns()
        .iter()
        .filter(|c| c.to_lowercase() != id_lower)
        .collect();
    if markers.is_empty() {
        return Err(ExpandError::MissingColumn {
            roles: vec![ColumnRole::MarkerCount],
        });
    }

    let mut columns = vec![id_column.to_string(), SAMPLE_COLUMN.to_string()];
    columns.extend(markers.iter().map(|m| m.to_string()));
    let mut output = Table::new(columns);

    for (index, row) in table.rows().iter().enumerate() {
        let counts = markers
            .iter()
            .map(|m| read_count(row, m, index, BlankCount::Zero))
            .collect::<ExpandResult<Vec<usize>>>()?;
        let max_count = counts.iter().copied().max().unwrap_or(0);
        if max_count == 0 {
            continue;
        }

        let base = row.value(id_column);
        let base_id = base.as_text().into_owned();
        for sample in 1..=max_count {
            let mut derived = Row::new();
            derived.set(id_column, base.clone());
            derived.set(SAMPLE_COLUMN, child_id(&base_id, sample));
            for (marker, &count) in markers.iter().zip(&counts) {
                let decision = if sample <= count {
                    TestDecision::Test
                } else {
                    TestDecision::Skip
                };
                derived.set(marker, CellValue::from(decision));
            }
            output.push(derived);
        }
    }

    Ok(output)
}

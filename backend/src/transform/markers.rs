//! Marker testing suggestions.
//!
//! Two steps feed the sample plan:
//! 1. [`suggest_markers`] appends a `plan.<marker>` yes/no column per marker,
//!    based on the recorded marker result.
//! 2. [`marker_counts`] turns that suggestion into an editable count sheet
//!    (plants to sample per marker), the input of
//!    [`expand_marker_samples`](super::samples::expand_marker_samples).
//!
//! | Result       | Decision |
//! |--------------|----------|
//! | blank        | yes      |
//! | `R` / `H`    | yes      |
//! | `S` / other  | no       |

use crate::models::{CellValue, Row, Table};

use super::samples::DEFAULT_ID_COLUMN;

/// Markers assayed by default.
pub const DEFAULT_MARKERS: [&str; 4] = ["Ty1", "Ty2", "Ty3", "Tm-2a"];

/// Prefix of the decision columns.
pub const PLAN_PREFIX: &str = "plan.";

/// Whether a marker should be (re)tested on a lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestDecision {
    Test,
    Skip,
}

impl TestDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestDecision::Test => "yes",
            TestDecision::Skip => "no",
        }
    }

    /// Parse a `plan.<marker>` cell back into a decision.
    pub fn from_cell(value: &CellValue) -> Option<Self> {
        match value.as_text().trim().to_lowercase().as_str() {
            "yes" => Some(TestDecision::Test),
            "no" => Some(TestDecision::Skip),
            _ => None,
        }
    }
}

impl From<TestDecision> for CellValue {
    fn from(decision: TestDecision) -> Self {
        CellValue::from(decision.as_str())
    }
}

/// Decision for one marker result.
///
/// Untested (blank), resistant (`R`) and heterozygous (`H`) lots are worth
/// testing; susceptible (`S`) and anything else is skipped.
pub fn suggest(value: &CellValue) -> TestDecision {
    match value.as_text().trim().to_uppercase().as_str() {
        "" | "R" | "H" => TestDecision::Test,
        _ => TestDecision::Skip,
    }
}

/// Name of the decision column for `marker`.
pub fn plan_column(marker: &str) -> String {
    format!("{}{}", PLAN_PREFIX, marker)
}

/// Append one `plan.<marker>` column per marker.
///
/// Marker columns missing from the input are added blank (and so suggested
/// for testing). One output row per input row.
pub fn suggest_markers(table: &Table, markers: &[String]) -> Table {
    let mut columns = table.columns().to_vec();
    for marker in markers {
        if !columns.contains(marker) {
            columns.push(marker.clone());
        }
    }
    for marker in markers {
        let plan = plan_column(marker);
        if !columns.contains(&plan) {
            columns.push(plan);
        }
    }

    let rows = table.rows().iter().map(|row| {
        let mut derived = row.clone();
        for marker in markers {
            let decision = suggest(row.value(marker));
            derived.set(&plan_column(marker), decision);
        }
        derived
    });

    Table::with_rows(columns, rows)
}

/// Build the marker count sheet from a suggestion table.
///
/// Output: `sow.nr` (copied from `id_column`) then one count column per
/// marker: `plants_per_marker` where the plan says yes, 0 otherwise. A missing
/// or unreadable plan cell is recomputed from the marker result.
pub fn marker_counts(
    table: &Table,
    id_column: &str,
    markers: &[String],
    plants_per_marker: usize,
) -> Table {
    let mut columns = vec![DEFAULT_ID_COLUMN.to_string()];
    columns.extend(markers.iter().cloned());

    let per_marker = CellValue::Int(plants_per_marker as i64);
    let rows = table.rows().iter().map(|row| {
        let mut counts = Row::new();
        counts.set(DEFAULT_ID_COLUMN, row.value(id_column).clone());
        for marker in markers {
            let decision = row
                .get(&plan_column(marker))
                .and_then(TestDecision::from_cell)
                .unwrap_or_else(|| suggest(row.value(marker)));
            let count = match decision {
                TestDecision::Test => per_marker.clone(),
                TestDecision::Skip => CellValue::Int(0),
            };
            counts.set(marker, count);
        }
        counts
    });

    Table::with_rows(columns, rows)
}

/// Default marker list as owned strings.
pub fn default_markers() -> Vec<String> {
    DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sow_list() -> Table {
        let columns = vec!["sow.nr".to_string(), "Ty1".into(), "Ty2".into(), "Ty3".into()];
        let rows = vec![
            [("sow.nr", "25s.0171"), ("Ty1", "H"), ("Ty2", "H"), ("Ty3", "S")],
            [("sow.nr", "25s.0172"), ("Ty1", "r"), ("Ty2", "s"), ("Ty3", " ")],
        ];
        Table::with_rows(columns, rows.into_iter().map(|r| r.into_iter().collect::<Row>()))
    }

    #[test]
    fn test_suggest_mapping() {
        for value in ["", "R", "H", "r", "h", " h "] {
            assert_eq!(suggest(&CellValue::from(value)), TestDecision::Test, "{value:?}");
        }
        assert_eq!(suggest(&CellValue::Empty), TestDecision::Test);
        for value in ["S", "s", "X", "RH"] {
            assert_eq!(suggest(&CellValue::from(value)), TestDecision::Skip, "{value:?}");
        }
        assert_eq!(suggest(&CellValue::Int(1)), TestDecision::Skip);
    }

    #[test]
    fn test_missing_marker_added_and_planned() {
        let out = suggest_markers(&sow_list(), &default_markers());

        assert_eq!(
            out.columns(),
            &[
                "sow.nr", "Ty1", "Ty2", "Ty3", "Tm-2a",
                "plan.Ty1", "plan.Ty2", "plan.Ty3", "plan.Tm-2a"
            ]
        );
        assert_eq!(out.len(), 2);

        let first = &out.rows()[0];
        assert_eq!(first.value("Tm-2a"), &CellValue::Empty);
        assert_eq!(first.value("plan.Ty1"), &CellValue::from("yes"));
        assert_eq!(first.value("plan.Ty3"), &CellValue::from("no"));
        assert_eq!(first.value("plan.Tm-2a"), &CellValue::from("yes"));

        let second = &out.rows()[1];
        assert_eq!(second.value("plan.Ty1"), &CellValue::from("yes"));
        assert_eq!(second.value("plan.Ty2"), &CellValue::from("no"));
        assert_eq!(second.value("plan.Ty3"), &CellValue::from("yes"));
    }

    #[test]
    fn test_existing_plan_column_overwritten_in_place() {
        let columns = vec!["sow.nr".to_string(), "plan.Ty1".into(), "Ty1".into()];
        let row: Row = [("sow.nr", "A"), ("plan.Ty1", "maybe"), ("Ty1", "S")].into_iter().collect();
        let table = Table::with_rows(columns, [row]);

        let out = suggest_markers(&table, &["Ty1".to_string()]);
        assert_eq!(out.columns(), &["sow.nr", "plan.Ty1", "Ty1"]);
        assert_eq!(out.rows()[0].value("plan.Ty1"), &CellValue::from("no"));
    }

    #[test]
    fn test_marker_counts_from_plan() {
        let markers = default_markers();
        let suggested = suggest_markers(&sow_list(), &markers);
        let counts = marker_counts(&suggested, "sow.nr", &markers, 3);

        assert_eq!(counts.columns(), &["sow.nr", "Ty1", "Ty2", "Ty3", "Tm-2a"]);
        let first = &counts.rows()[0];
        assert_eq!(first.value("sow.nr"), &CellValue::from("25s.0171"));
        assert_eq!(first.value("Ty1"), &CellValue::Int(3));
        assert_eq!(first.value("Ty3"), &CellValue::Int(0));
        assert_eq!(first.value("Tm-2a"), &CellValue::Int(3));
    }

    #[test]
    fn test_marker_counts_without_plan_columns() {
        let counts = marker_counts(&sow_list(), "sow.nr", &["Ty2".to_string()], 5);
        assert_eq!(counts.rows()[0].value("Ty2"), &CellValue::Int(5));
        assert_eq!(counts.rows()[1].value("Ty2"), &CellValue::Int(0));
    }
}

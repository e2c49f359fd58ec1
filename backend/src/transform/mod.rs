//! Transformation module.
//!
//! - Columns: tolerant header resolution
//! - Generation: F-number arithmetic
//! - Plant list: per-plant fan-out of seed lots
//! - Markers: test suggestions and editable count sheets
//! - Samples: per-sample fan-out of marker count sheets
//! - Pipeline: source -> tool -> output orchestration

pub mod columns;
pub mod generation;
pub mod markers;
pub mod pipeline;
pub mod plant_list;
pub mod samples;

pub use columns::{find_column, resolve_columns, ColumnRole, IdColumn, Resolution, ResolveMode};
pub use generation::{next_generation, next_generation_cell};
pub use markers::{default_markers, marker_counts, suggest, suggest_markers, TestDecision, DEFAULT_MARKERS};
pub use pipeline::*;
pub use plant_list::expand_plant_list;
pub use samples::expand_marker_samples;

use crate::error::{ExpandError, ExpandResult};
use crate::models::Row;

/// How a blank count cell is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlankCount {
    Reject,
    Zero,
}

/// Read a non-negative integer count from `row[column]`.
///
/// `index` is the 0-based data row; errors report the spreadsheet row
/// (header is row 1).
pub(crate) fn read_count(
    row: &Row,
    column: &str,
    index: usize,
    blank: BlankCount,
) -> ExpandResult<usize> {
    let value = row.value(column);
    if value.is_blank() && blank == BlankCount::Zero {
        return Ok(0);
    }

    let invalid = |message: &str| ExpandError::InvalidCount {
        row: index + 2,
        column: column.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    };

    let count = value.as_integer().ok_or_else(|| invalid("not an integer"))?;
    usize::try_from(count).map_err(|_| invalid("count must not be negative"))
}

/// `{base}-{n:03}` child identifier.
pub(crate) fn child_id(base: &str, n: usize) -> String {
    format!("{}-{:03}", base, n)
}

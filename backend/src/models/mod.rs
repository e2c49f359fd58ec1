//! Domain models: cell values, rows and tables.
//!
//! A [`Table`] is an ordered header plus rows. Every [`Row`] in a table carries
//! exactly the table's columns, in header order. Rows are never mutated once
//! they are part of a table; derived rows are built with [`Row::with_value`].

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Blank / missing cell.
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

static EMPTY: CellValue = CellValue::Empty;

impl CellValue {
    /// True for missing cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text rendering used for identifiers and label comparisons.
    ///
    /// Whole floats render without a fractional part (`12.0` becomes `12`),
    /// so numeric sow numbers read from a workbook produce clean identifiers.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Empty => Cow::Borrowed(""),
            CellValue::Text(s) => Cow::Borrowed(s.as_str()),
            CellValue::Int(n) => Cow::Owned(n.to_string()),
            CellValue::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    Cow::Owned(format!("{}", *f as i64))
                } else {
                    Cow::Owned(f.to_string())
                }
            }
            CellValue::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            CellValue::DateTime(dt) => Cow::Owned(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }

    /// Integer coercion for count columns.
    ///
    /// Accepts integers, whole floats, and text holding either. Anything else
    /// (blank included) is `None`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Int(n) => Some(*n),
            CellValue::Float(f) => float_to_integer(*f),
            CellValue::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(float_to_integer))
            }
            _ => None,
        }
    }
}

fn float_to_integer(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
        Some(f as i64)
    } else {
        None
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Int(n)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// One record: an ordered mapping from column name to cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Row {
    cells: IndexMap<String, CellValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// Cell value, or [`CellValue::Empty`] when the column is absent.
    pub fn value(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&EMPTY)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    /// Copy of this row with one field overridden.
    ///
    /// An existing column keeps its position; a new column is appended.
    pub fn with_value(&self, column: &str, value: impl Into<CellValue>) -> Row {
        let mut row = self.clone();
        row.set(column, value);
        row
    }

    /// Builder-style setter, for rows that are not yet part of a table.
    pub fn set(&mut self, column: &str, value: impl Into<CellValue>) {
        match self.cells.get_mut(column) {
            Some(cell) => *cell = value.into(),
            None => {
                self.cells.insert(column.to_string(), value.into());
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Row {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// An ordered header plus rows sharing that header.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table, aligning every row to `columns`.
    pub fn with_rows(columns: Vec<String>, rows: impl IntoIterator<Item = Row>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push(row);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, reordered to the table header.
    ///
    /// Missing columns become empty; keys outside the header are dropped.
    pub fn push(&mut self, row: Row) {
        let mut source = row.cells;
        let cells = self
            .columns
            .iter()
            .map(|column| {
                let value = source.swap_remove(column).unwrap_or_default();
                (column.clone(), value)
            })
            .collect();
        self.rows.push(Row { cells });
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

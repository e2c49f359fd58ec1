//! Column resolution: find the semantic columns a tool needs in a header.
//!
//! Headers written by hand drift (`25s.sow.nr`, `Sow.Nr`, ` Transplant `), so
//! matching is case-insensitive and the first matching header wins. Other
//! matching headers are reported back so the caller can warn about them, or
//! reject the table in [`ResolveMode::Strict`].

use std::fmt;

use crate::error::{ExpandError, ExpandResult};

/// Header used for the generation field (case-sensitive).
pub const GENERATION_COLUMN: &str = "generation";

/// Header used for the transplant count (matched trimmed, case-insensitive).
pub const TRANSPLANT_COLUMN: &str = "transplant";

/// Which identifier family a tool keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdColumn {
    /// Seed-lot numbers: any header containing `sow.nr`.
    SowNr,
    /// Field-plot numbers: any header containing `field.nr`.
    FieldNr,
}

impl IdColumn {
    pub fn pattern(&self) -> &'static str {
        match self {
            IdColumn::SowNr => "sow.nr",
            IdColumn::FieldNr => "field.nr",
        }
    }
}

/// A semantic column role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRole {
    /// Lot / plot identifier, matched by substring.
    FieldOrSowId(IdColumn),
    /// Identifier matched by exact header name.
    SampleId(String),
    TransplantCount,
    Generation,
    MarkerResult(String),
    /// Per-marker requested sample counts.
    MarkerCount,
}

impl ColumnRole {
    /// Does `header` satisfy this role?
    pub fn matches(&self, header: &str) -> bool {
        match self {
            ColumnRole::FieldOrSowId(id) => header.to_lowercase().contains(id.pattern()),
            ColumnRole::SampleId(name) => header == name,
            ColumnRole::TransplantCount => header.trim().to_lowercase() == TRANSPLANT_COLUMN,
            ColumnRole::Generation => header == GENERATION_COLUMN,
            ColumnRole::MarkerResult(marker) => header == marker,
            ColumnRole::MarkerCount => false,
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRole::FieldOrSowId(id) => {
                write!(f, "identifier column (name containing '{}')", id.pattern())
            }
            ColumnRole::SampleId(name) => write!(f, "identifier column '{}'", name),
            ColumnRole::TransplantCount => write!(f, "'{}' column", TRANSPLANT_COLUMN),
            ColumnRole::Generation => write!(f, "'{}' column", GENERATION_COLUMN),
            ColumnRole::MarkerResult(marker) => write!(f, "marker column '{}'", marker),
            ColumnRole::MarkerCount => write!(f, "marker count columns"),
        }
    }
}

/// What to do when several headers match one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveMode {
    /// First match wins.
    #[default]
    FirstMatch,
    /// More than one match is an error.
    Strict,
}

/// A resolved role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub role: ColumnRole,
    /// The chosen header.
    pub column: String,
    /// Later headers that also matched and were ignored.
    pub ignored: Vec<String>,
}

impl Resolution {
    pub fn is_ambiguous(&self) -> bool {
        !self.ignored.is_empty()
    }
}

/// First header matching `role`, in header order.
pub fn find_column<'a>(columns: &'a [String], role: &ColumnRole) -> Option<&'a str> {
    columns
        .iter()
        .find(|c| role.matches(c))
        .map(String::as_str)
}

/// Resolve every role in `roles` against `columns`.
///
/// Fails with [`ExpandError::MissingColumn`] naming all unresolved roles at
/// once, or with [`ExpandError::AmbiguousColumn`] in strict mode.
pub fn resolve_columns(
    columns: &[String],
    roles: &[ColumnRole],
    mode: ResolveMode,
) -> ExpandResult<Vec<Resolution>> {
    let mut resolved = Vec::with_capacity(roles.len());
    let mut missing = Vec::new();

    for role in roles {
        let mut matches = columns.iter().filter(|c| role.matches(c)).cloned();
        match matches.next() {
            Some(column) => resolved.push(Resolution {
                role: role.clone(),
                column,
                ignored: matches.collect(),
            }),
            None => missing.push(role.clone()),
        }
    }

    if !missing.is_empty() {
        return Err(ExpandError::MissingColumn { roles: missing });
    }

    if mode == ResolveMode::Strict {
        if let Some(r) = resolved.iter().find(|r| r.is_ambiguous()) {
            let mut candidates = vec![r.column.clone()];
            candidates.extend(r.ignored.iter().cloned());
            return Err(ExpandError::AmbiguousColumn {
                role: r.role.clone(),
                candidates,
            });
        }
    }

    Ok(resolved)
}

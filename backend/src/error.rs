//! Error types for the Meishu breeding tools.
//!
//! - [`WorkbookError`] - reading and writing spreadsheets
//! - [`ExpandError`] - column resolution and row expansion
//! - [`PipelineError`] - top-level tool runs
//! - [`ServerError`] - HTTP layer
//!
//! Conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::transform::columns::ColumnRole;

// =============================================================================
// Workbook Errors
// =============================================================================

/// Errors from the spreadsheet source and sink.
#[derive(Debug, Error)]
pub enum WorkbookError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes are not a workbook we can open.
    #[error("Unreadable workbook: {0}")]
    Unreadable(String),

    /// The requested sheet does not exist.
    #[error("Sheet '{sheet}' not found (available: {})", .available.join(", "))]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    /// Failed to build the xlsx output.
    #[error("Failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Failed to render CSV or JSON output.
    #[error("Failed to write output: {0}")]
    Write(String),
}

// =============================================================================
// Expansion Errors
// =============================================================================

/// Errors raised by the core transformations.
#[derive(Debug, Error)]
pub enum ExpandError {
    /// One or more required columns could not be resolved from the header.
    #[error("Required column(s) not found: {}", describe_roles(.roles))]
    MissingColumn { roles: Vec<ColumnRole> },

    /// Several headers match a role and strict resolution is on.
    #[error("Ambiguous {role}: {}", .candidates.join(", "))]
    AmbiguousColumn {
        role: ColumnRole,
        candidates: Vec<String>,
    },

    /// A count cell is not a non-negative integer.
    #[error("Row {row}, column '{column}' (value '{value}'): {message}")]
    InvalidCount {
        row: usize,
        column: String,
        value: String,
        message: String,
    },
}

fn describe_roles(roles: &[ColumnRole]) -> String {
    roles
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level error for a tool run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source or sink error.
    #[error("Workbook error: {0}")]
    Workbook(#[from] WorkbookError),

    /// Transformation error.
    #[error("{0}")]
    Expand(#[from] ExpandError),
}

impl PipelineError {
    /// True when the error comes from the uploaded data rather than from us.
    pub fn is_input_error(&self) -> bool {
        match self {
            PipelineError::Expand(_) => true,
            PipelineError::Workbook(WorkbookError::Unreadable(_))
            | PipelineError::Workbook(WorkbookError::SheetNotFound { .. }) => true,
            PipelineError::Workbook(_) => false,
        }
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<WorkbookError> for ServerError {
    fn from(err: WorkbookError) -> Self {
        ServerError::Pipeline(err.into())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for workbook operations.
pub type WorkbookResult<T> = Result<T, WorkbookError>;

/// Result type for expansion operations.
pub type ExpandResult<T> = Result<T, ExpandError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::columns::IdColumn;

    #[test]
    fn test_error_conversion_chain() {
        let expand_err = ExpandError::MissingColumn {
            roles: vec![ColumnRole::TransplantCount],
        };
        let pipeline_err: PipelineError = expand_err.into();
        assert!(pipeline_err.to_string().contains("transplant"));
        assert!(pipeline_err.is_input_error());

        let sheet_err = WorkbookError::SheetNotFound {
            sheet: "Plan".into(),
            available: vec!["Sheet1".into(), "Sheet2".into()],
        };
        let pipeline_err: PipelineError = sheet_err.into();
        assert!(pipeline_err.to_string().contains("Sheet1, Sheet2"));
        assert!(pipeline_err.is_input_error());

        let write_err: PipelineError = WorkbookError::Write("disk full".into()).into();
        assert!(!write_err.is_input_error());
    }

    #[test]
    fn test_missing_column_lists_every_role() {
        let err = ExpandError::MissingColumn {
            roles: vec![
                ColumnRole::FieldOrSowId(IdColumn::SowNr),
                ColumnRole::TransplantCount,
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("sow.nr"));
        assert!(msg.contains("transplant"));
    }

    #[test]
    fn test_invalid_count_format() {
        let err = ExpandError::InvalidCount {
            row: 5,
            column: "transplant".into(),
            value: "abc".into(),
            message: "not an integer".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Row 5"));
        assert!(msg.contains("column 'transplant'"));
        assert!(msg.contains("value 'abc'"));
    }
}

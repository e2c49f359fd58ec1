//! REST API types for frontend integration.

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::Row;
use crate::transform::{Tool, ToolRun};

/// Response sent after a tool run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: "ready" or "warning"
    pub status: String,

    pub tool: Tool,

    /// Suggested file name for the xlsx download
    pub file_name: String,

    /// Sheet that was read
    pub sheet: String,

    /// Output header
    pub columns: Vec<String>,

    /// First output rows
    pub preview: Vec<Row>,

    /// Every output row
    pub rows: Vec<Row>,

    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub input_rows: usize,
    pub output_rows: usize,
    pub input_columns: Vec<String>,
    pub warnings: Vec<String>,
    /// RFC 3339 timestamp
    pub generated_at: String,
}

impl From<ToolRun> for ToolResponse {
    fn from(run: ToolRun) -> Self {
        let status = if run.warnings.is_empty() { "ready" } else { "warning" };
        let columns = run.output.columns().to_vec();
        let output_rows = run.output.len();

        ToolResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            tool: run.tool,
            file_name: run.tool.file_name().to_string(),
            sheet: run.sheet,
            columns,
            preview: run.preview.into_rows(),
            rows: run.output.into_rows(),
            metadata: ResponseMetadata {
                input_rows: run.input_rows,
                output_rows,
                input_columns: run.input_columns,
                warnings: run.warnings,
                generated_at: Utc::now().to_rfc3339(),
            },
        }
    }
}

/// Sheets of an uploaded workbook.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetsResponse {
    pub file_name: String,
    pub sheets: Vec<String>,
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

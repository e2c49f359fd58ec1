//! # Meishu - breeding spreadsheet tools
//!
//! Meishu turns breeding spreadsheets into the next working sheet: seed lots
//! into per-plant lists, marker results into test plans, and marker count
//! sheets into per-sample plans.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Workbook   │────▶│   Parser    │────▶│  Transform  │────▶│   Writer    │
//! │ (xlsx/csv)  │     │ (calamine)  │     │ (4 tools)   │     │ (xlsx/csv)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use meishu::{process_file, write_table, Tool, ToolOptions};
//! use std::path::Path;
//!
//! let run = process_file(Path::new("sow_list.xlsx"), None, Tool::PlantList, &ToolOptions::default())?;
//! let bytes = write_table(&run.output, Tool::PlantList.sheet_title())?;
//! std::fs::write(Tool::PlantList.file_name(), bytes)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Cells, rows and tables
//! - [`config`] - Environment configuration
//! - [`parser`] - Workbook source (xlsx, xls, ods, csv)
//! - [`transform`] - Column resolution, the four tools, pipeline
//! - [`writer`] - xlsx / csv / json sink
//! - [`api`] - HTTP API server and log stream

// Core modules
pub mod error;
pub mod models;
pub mod config;

// Source
pub mod parser;

// Transformation
pub mod transform;

// Sink
pub mod writer;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ExpandError,
    PipelineError,
    ServerError,
    WorkbookError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{CellValue, Row, Table};

// =============================================================================
// Re-exports - Source / Sink
// =============================================================================

pub use parser::Workbook;
pub use writer::{render, to_csv, to_json, write_table, OutputFormat};

// =============================================================================
// Re-exports - Transformations
// =============================================================================

pub use transform::{
    expand_marker_samples,
    expand_plant_list,
    find_column,
    marker_counts,
    next_generation,
    resolve_columns,
    suggest,
    suggest_markers,
    ColumnRole,
    IdColumn,
    ResolveMode,
    TestDecision,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    process_bytes,
    process_file,
    process_workbook,
    run_tool,
    Tool,
    ToolOptions,
    ToolOutput,
    ToolRun,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, ResponseMetadata, SheetsResponse, ToolResponse};
pub use config::Config;

// Server
pub mod server {
    pub use crate::api::server::start_server;
}

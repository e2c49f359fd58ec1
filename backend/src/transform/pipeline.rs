//! High-level pipeline API: workbook in, expanded table out.
//!
//! Combines all steps: reading the sheet, resolving columns, running the
//! selected tool and logging a summary. Rendering the result to xlsx/csv/json
//! is left to [`crate::writer`].
//!
//! # Example
//!
//! ```rust,ignore
//! use meishu::{process_file, Tool, ToolOptions};
//! use std::path::Path;
//!
//! let result = process_file(Path::new("sow_list.xlsx"), None, Tool::PlantList, &ToolOptions::default())?;
//! println!("{} plants", result.output.len());
//! ```

use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::{PipelineResult, WorkbookError};
use crate::models::Table;
use crate::parser::Workbook;

use super::columns::{resolve_columns, ColumnRole, IdColumn, Resolution, ResolveMode};
use super::markers::{default_markers, marker_counts, suggest_markers};
use super::plant_list::expand_plant_list;
use super::samples::{expand_marker_samples, DEFAULT_ID_COLUMN};

/// Default number of plants sampled per suggested marker.
pub const DEFAULT_PLANTS_PER_MARKER: usize = 3;

/// Default number of preview rows.
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

/// The available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    /// Seed lots keyed by `sow.nr` -> plants.
    PlantList,
    /// Field plots keyed by `field.nr` -> plants.
    FieldPlantList,
    /// Marker results -> `plan.<marker>` yes/no.
    MarkerSuggestion,
    /// Marker suggestion -> editable per-marker count sheet.
    MarkerCounts,
    /// Marker count sheet -> samples.
    MarkerSample,
}

impl Tool {
    pub const ALL: [Tool; 5] = [
        Tool::PlantList,
        Tool::FieldPlantList,
        Tool::MarkerSuggestion,
        Tool::MarkerCounts,
        Tool::MarkerSample,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Tool::PlantList => "plant-list",
            Tool::FieldPlantList => "field-plant-list",
            Tool::MarkerSuggestion => "marker-suggestion",
            Tool::MarkerCounts => "marker-counts",
            Tool::MarkerSample => "marker-sample",
        }
    }

    /// Title of the single output sheet.
    pub fn sheet_title(&self) -> &'static str {
        match self {
            Tool::PlantList | Tool::FieldPlantList => "Plant List",
            Tool::MarkerSuggestion => "Marker Suggestion",
            Tool::MarkerCounts => "Marker Counts",
            Tool::MarkerSample => "Marker Sample Plan",
        }
    }

    /// Default download file name.
    pub fn file_name(&self) -> &'static str {
        match self {
            Tool::PlantList | Tool::FieldPlantList => "plant_list_generated.xlsx",
            Tool::MarkerSuggestion => "marker_suggestion_plan.xlsx",
            Tool::MarkerCounts => "marker_count_sheet.xlsx",
            Tool::MarkerSample => "marker_sample_plan.xlsx",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|t| t.slug() == s)
            .ok_or_else(|| format!("unknown tool '{}'", s))
    }
}

/// Options shared by all tools.
#[derive(Debug, Clone)]
pub struct ToolOptions {
    /// Marker names for the suggestion and count sheet tools.
    pub markers: Vec<String>,
    /// Column resolution behaviour.
    pub resolve_mode: ResolveMode,
    /// Count written for suggested markers in the count sheet.
    pub plants_per_marker: usize,
    /// Exact identifier header of a count sheet.
    pub id_column: String,
    /// Rows kept in [`ToolRun::preview`].
    pub preview_rows: usize,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            markers: default_markers(),
            resolve_mode: ResolveMode::FirstMatch,
            plants_per_marker: DEFAULT_PLANTS_PER_MARKER,
            id_column: DEFAULT_ID_COLUMN.to_string(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

/// Output of one tool over one table.
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutput {
    pub table: Table,
    /// Non-fatal findings (ignored duplicate column matches).
    pub warnings: Vec<String>,
}

/// Result of a complete workbook run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRun {
    pub tool: Tool,
    /// Sheet that was read.
    pub sheet: String,
    pub input_columns: Vec<String>,
    pub input_rows: usize,
    pub output: Table,
    pub preview: Table,
    pub warnings: Vec<String>,
}

/// Run `tool` over an already-read table.
pub fn run_tool(tool: Tool, table: &Table, options: &ToolOptions) -> PipelineResult<ToolOutput> {
    let mut warnings = Vec::new();

    let output = match tool {
        Tool::PlantList | Tool::FieldPlantList => {
            let id = if tool == Tool::FieldPlantList {
                IdColumn::FieldNr
            } else {
                IdColumn::SowNr
            };
            let resolved = resolve(
                table,
                &[ColumnRole::FieldOrSowId(id), ColumnRole::TransplantCount],
                options.resolve_mode,
                &mut warnings,
            )?;
            log_info(format!("Expanding {} lots into plants...", table.len()));
            expand_plant_list(table, &resolved[0].column, &resolved[1].column)?
        }
        Tool::MarkerSuggestion => {
            log_info(format!("Markers: {}", options.markers.join(", ")));
            for marker in &options.markers {
                if !table.has_column(marker) {
                    let message = format!("Column '{}' not found, treated as untested", marker);
                    log_warning(message.clone());
                    warnings.push(message);
                }
            }
            suggest_markers(table, &options.markers)
        }
        Tool::MarkerCounts => {
            let resolved = resolve(
                table,
                &[ColumnRole::FieldOrSowId(IdColumn::SowNr)],
                options.resolve_mode,
                &mut warnings,
            )?;
            log_info(format!(
                "Building count sheet ({} plants per suggested marker)",
                options.plants_per_marker
            ));
            marker_counts(
                table,
                &resolved[0].column,
                &options.markers,
                options.plants_per_marker,
            )
        }
        Tool::MarkerSample => {
            log_info(format!("Expanding samples keyed by '{}'...", options.id_column));
            expand_marker_samples(table, &options.id_column)?
        }
    };

    log_success(format!("{} rows -> {} rows", table.len(), output.len()));
    Ok(ToolOutput {
        table: output,
        warnings,
    })
}

fn resolve(
    table: &Table,
    roles: &[ColumnRole],
    mode: ResolveMode,
    warnings: &mut Vec<String>,
) -> PipelineResult<Vec<Resolution>> {
    let resolved = resolve_columns(table.columns(), roles, mode)?;
    for r in &resolved {
        log_success(format!("{} -> '{}'", r.role, r.column));
        if r.is_ambiguous() {
            let message = format!(
                "Several columns match the {}; using '{}', ignoring {}",
                r.role,
                r.column,
                r.ignored.join(", ")
            );
            log_warning(message.clone());
            warnings.push(message);
        }
    }
    Ok(resolved)
}

/// Read `sheet` (default: first sheet) from `workbook` and run `tool`.
pub fn process_workbook(
    workbook: &mut Workbook,
    sheet: Option<&str>,
    tool: Tool,
    options: &ToolOptions,
) -> PipelineResult<ToolRun> {
    log_info(format!("📖 Reading workbook '{}'...", workbook.name()));
    let sheets = workbook.sheet_names();
    let sheet = match sheet {
        Some(s) => s.to_string(),
        None => sheets
            .first()
            .cloned()
            .ok_or_else(|| WorkbookError::Unreadable("workbook contains no sheets".to_string()))?,
    };

    let table = workbook.read_table(&sheet)?;
    log_success(format!(
        "Sheet '{}': {} rows, {} columns",
        sheet,
        table.len(),
        table.columns().len()
    ));

    log_info(format!("⚙️  Running {}...", tool));
    let output = run_tool(tool, &table, options)?;

    Ok(ToolRun {
        tool,
        sheet,
        input_columns: table.columns().to_vec(),
        input_rows: table.len(),
        preview: output.table.head(options.preview_rows),
        output: output.table,
        warnings: output.warnings,
    })
}

/// Same as [`process_workbook`] from raw upload bytes.
pub fn process_bytes(
    bytes: Vec<u8>,
    file_name: Option<&str>,
    sheet: Option<&str>,
    tool: Tool,
    options: &ToolOptions,
) -> PipelineResult<ToolRun> {
    let mut workbook = Workbook::from_bytes(bytes, file_name)?;
    process_workbook(&mut workbook, sheet, tool, options)
}

/// Same as [`process_workbook`] from a file on disk.
pub fn process_file(
    path: &Path,
    sheet: Option<&str>,
    tool: Tool,
    options: &ToolOptions,
) -> PipelineResult<ToolRun> {
    let mut workbook = Workbook::open(path)?;
    process_workbook(&mut workbook, sheet, tool, options)
}

//! Meishu CLI - breeding spreadsheet tools
//!
//! ```bash
//! meishu sheets sow_list.xlsx                      # List sheets
//! meishu plant-list sow_list.xlsx                  # -> plant_list_generated.xlsx
//! meishu plant-list field.xlsx --field             # Key by field.nr
//! meishu marker-suggestion results.xlsx            # -> marker_suggestion_plan.xlsx
//! meishu marker-counts marker_suggestion_plan.xlsx # -> marker_count_sheet.xlsx
//! meishu marker-sample marker_count_sheet.xlsx     # -> marker_sample_plan.xlsx
//! meishu serve                                     # Start HTTP server (port 3000)
//! ```
//!
//! Logs go to stderr; `--format csv|json` without `-o` prints to stdout.

use clap::{Args, Parser, Subcommand};
use meishu::{
    process_file, render, Config, OutputFormat, ResolveMode, Table, Tool, ToolOptions, ToolRun,
    Workbook,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "meishu")]
#[command(about = "Generate plant lists and marker sample plans from breeding spreadsheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sheets of a workbook
    Sheets {
        /// Input workbook (xlsx, xls, ods or csv)
        input: PathBuf,
    },

    /// Expand seed lots into one row per plant
    PlantList {
        #[command(flatten)]
        io: IoArgs,

        /// Key plants by the field.nr column instead of sow.nr
        #[arg(long)]
        field: bool,

        /// Fail when several columns match the identifier
        #[arg(long)]
        strict: bool,
    },

    /// Add plan.<marker> yes/no columns from marker results
    MarkerSuggestion {
        #[command(flatten)]
        io: IoArgs,

        /// Markers to plan (default: MEISHU_MARKERS or Ty1,Ty2,Ty3,Tm-2a)
        #[arg(short, long, value_delimiter = ',')]
        markers: Option<Vec<String>>,
    },

    /// Turn a marker suggestion into an editable count sheet
    MarkerCounts {
        #[command(flatten)]
        io: IoArgs,

        /// Markers to count (default: MEISHU_MARKERS or Ty1,Ty2,Ty3,Tm-2a)
        #[arg(short, long, value_delimiter = ',')]
        markers: Option<Vec<String>>,

        /// Plants sampled for each suggested marker
        #[arg(long)]
        plants_per_marker: Option<usize>,

        /// Fail when several columns match sow.nr
        #[arg(long)]
        strict: bool,
    },

    /// Expand a marker count sheet into one row per sample
    MarkerSample {
        #[command(flatten)]
        io: IoArgs,

        /// Identifier column of the count sheet
        #[arg(long, default_value = "sow.nr")]
        id_column: String,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: MEISHU_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Args)]
struct IoArgs {
    /// Input workbook (xlsx, xls, ods or csv)
    input: PathBuf,

    /// Sheet to read (default: first sheet)
    #[arg(short, long)]
    sheet: Option<String>,

    /// Output file (default: the tool's file name for xlsx, stdout otherwise)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: xlsx, csv or json
    #[arg(short, long, default_value = "xlsx")]
    format: OutputFormat,

    /// Number of result rows to print (default: MEISHU_PREVIEW_ROWS or 10)
    #[arg(long)]
    preview: Option<usize>,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env();

    let result = match cli.command {
        Commands::Sheets { input } => cmd_sheets(&input),

        Commands::PlantList { io, field, strict } => {
            let tool = if field {
                Tool::FieldPlantList
            } else {
                Tool::PlantList
            };
            let mut options = options_for(&config, &io);
            options.resolve_mode = resolve_mode(strict);
            cmd_tool(tool, &io, &options)
        }

        Commands::MarkerSuggestion { io, markers } => {
            let mut options = options_for(&config, &io);
            if let Some(markers) = markers {
                options.markers = markers;
            }
            cmd_tool(Tool::MarkerSuggestion, &io, &options)
        }

        Commands::MarkerCounts {
            io,
            markers,
            plants_per_marker,
            strict,
        } => {
            let mut options = options_for(&config, &io);
            if let Some(markers) = markers {
                options.markers = markers;
            }
            if let Some(n) = plants_per_marker {
                options.plants_per_marker = n;
            }
            options.resolve_mode = resolve_mode(strict);
            cmd_tool(Tool::MarkerCounts, &io, &options)
        }

        Commands::MarkerSample { io, id_column } => {
            let mut options = options_for(&config, &io);
            options.id_column = id_column;
            cmd_tool(Tool::MarkerSample, &io, &options)
        }

        Commands::Serve { port } => {
            let config = match port {
                Some(port) => config.with_port(port),
                None => config,
            };
            cmd_serve(config).await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn options_for(config: &Config, io: &IoArgs) -> ToolOptions {
    let mut options = config.tool_options();
    if let Some(n) = io.preview {
        options.preview_rows = n;
    }
    options
}

fn resolve_mode(strict: bool) -> ResolveMode {
    if strict {
        ResolveMode::Strict
    } else {
        ResolveMode::FirstMatch
    }
}

fn cmd_sheets(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Workbook: {}", input.display());

    let workbook = Workbook::open(input)?;
    for name in workbook.sheet_names() {
        println!("{}", name);
    }

    Ok(())
}

fn cmd_tool(tool: Tool, io: &IoArgs, options: &ToolOptions) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {} ({})", io.input.display(), tool);

    let run = process_file(&io.input, io.sheet.as_deref(), tool, options)?;
    print_summary(&run);

    let bytes = render(&run.output, io.format, tool.sheet_title())?;
    let output = match (&io.output, io.format) {
        (Some(path), _) => Some(path.clone()),
        (None, OutputFormat::Xlsx) => Some(PathBuf::from(tool.file_name())),
        (None, _) => None,
    };
    write_output(&bytes, output.as_deref())?;

    eprintln!("\n✨ Done!");
    Ok(())
}

fn print_summary(run: &ToolRun) {
    eprintln!("   Sheet: {}", run.sheet);
    eprintln!("   Input: {} rows, {} columns", run.input_rows, run.input_columns.len());
    eprintln!("   Output: {} rows", run.output.len());
    for warning in &run.warnings {
        eprintln!("   ⚠️  {}", warning);
    }
    if !run.preview.is_empty() {
        eprintln!("\n{}", preview_text(&run.preview));
    }
}

/// Tab-separated preview of `table`.
fn preview_text(table: &Table) -> String {
    let mut lines = vec![table.columns().join("\t")];
    for row in table.rows() {
        let cells: Vec<String> = row.iter().map(|(_, v)| v.to_string()).collect();
        lines.push(cells.join("\t"));
    }
    lines.join("\n")
}

async fn cmd_serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    meishu::server::start_server(config).await
}

fn write_output(content: &[u8], path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

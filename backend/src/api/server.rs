//! HTTP server for the breeding tools.
//!
//! Every tool endpoint takes a multipart upload (`file` plus optional text
//! fields) and returns a JSON [`ToolResponse`], or the xlsx itself with
//! `?download=true`.
//!
//! # API Endpoints
//!
//! | Method | Path                      | Fields                                |
//! |--------|---------------------------|---------------------------------------|
//! | GET    | `/health`                 |                                       |
//! | POST   | `/api/sheets`             | `file`                                |
//! | POST   | `/api/plant-list`         | `file sheet field strict`             |
//! | POST   | `/api/marker-suggestion`  | `file sheet markers`                  |
//! | POST   | `/api/marker-counts`      | `file sheet markers plantsPerMarker strict` |
//! | POST   | `/api/marker-sample`      | `file sheet idColumn`                 |
//! | GET    | `/api/logs`               | SSE stream of run logs                |

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{collections::HashMap, convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, SheetsResponse, ToolResponse};
use crate::config::{parse_marker_list, Config};
use crate::error::{ServerError, ServerResult};
use crate::parser::Workbook;
use crate::transform::{process_bytes, ResolveMode, Tool, ToolOptions};
use crate::writer::{write_table, XLSX_MIME};

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
}

#[derive(Debug, Default, Deserialize)]
struct DownloadQuery {
    download: Option<bool>,
}

type Rejection = (StatusCode, Json<Value>);

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let port = config.port;
    let max_upload = config.max_upload_bytes;
    let state = AppState {
        config: Arc::new(config),
    };

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/sheets", post(list_sheets))
        .route("/api/plant-list", post(plant_list))
        .route("/api/marker-suggestion", post(marker_suggestion))
        .route("/api/marker-counts", post(marker_counts))
        .route("/api/marker-sample", post(marker_sample))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    eprintln!("🚀 Meishu server running on http://localhost:{}", port);
    eprintln!("   POST /api/sheets             - List workbook sheets");
    eprintln!("   POST /api/plant-list         - Plant list generator");
    eprintln!("   POST /api/marker-suggestion  - Marker test suggestion");
    eprintln!("   POST /api/marker-counts      - Marker count sheet");
    eprintln!("   POST /api/marker-sample      - Marker sample plan");
    eprintln!("   GET  /api/logs               - SSE log stream");
    eprintln!("   Upload limit: {} MB", max_upload / (1024 * 1024));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "meishu",
        "version": env!("CARGO_PKG_VERSION"),
        "tools": Tool::ALL.iter().map(Tool::slug).collect::<Vec<_>>(),
        "endpoints": {
            "sheets": "POST /api/sheets",
            "plantList": "POST /api/plant-list",
            "markerSuggestion": "POST /api/marker-suggestion",
            "markerCounts": "POST /api/marker-counts",
            "markerSample": "POST /api/marker-sample",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn list_sheets(multipart: Multipart) -> Result<Json<SheetsResponse>, Rejection> {
    let form = read_form(multipart).await.map_err(rejection)?;
    let file_name = form.file_name.unwrap_or_else(|| "upload".to_string());
    let workbook = Workbook::from_bytes(form.bytes, Some(&file_name))
        .map_err(|e| rejection(e.into()))?;

    Ok(Json(SheetsResponse {
        sheets: workbook.sheet_names(),
        file_name,
    }))
}

async fn plant_list(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
    multipart: Multipart,
) -> Result<Response, Rejection> {
    let form = read_form(multipart).await.map_err(rejection)?;
    let tool = if form.flag("field") {
        Tool::FieldPlantList
    } else {
        Tool::PlantList
    };
    let mut options = state.config.tool_options();
    options.resolve_mode = form.resolve_mode();

    run_upload(form, tool, options, &query).await.map_err(rejection)
}

async fn marker_suggestion(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
    multipart: Multipart,
) -> Result<Response, Rejection> {
    let form = read_form(multipart).await.map_err(rejection)?;
    let mut options = state.config.tool_options();
    if let Some(markers) = form.markers() {
        options.markers = markers;
    }

    run_upload(form, Tool::MarkerSuggestion, options, &query)
        .await
        .map_err(rejection)
}

async fn marker_counts(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
    multipart: Multipart,
) -> Result<Response, Rejection> {
    let form = read_form(multipart).await.map_err(rejection)?;
    let mut options = state.config.tool_options();
    if let Some(markers) = form.markers() {
        options.markers = markers;
    }
    if let Some(n) = form.number("plantsPerMarker").map_err(rejection)? {
        options.plants_per_marker = n;
    }
    options.resolve_mode = form.resolve_mode();

    run_upload(form, Tool::MarkerCounts, options, &query)
        .await
        .map_err(rejection)
}

async fn marker_sample(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
    multipart: Multipart,
) -> Result<Response, Rejection> {
    let form = read_form(multipart).await.map_err(rejection)?;
    let mut options = state.config.tool_options();
    if let Some(id_column) = form.text("idColumn") {
        options.id_column = id_column.to_string();
    }

    run_upload(form, Tool::MarkerSample, options, &query)
        .await
        .map_err(rejection)
}

/// Run `tool` on the uploaded workbook and build the JSON or xlsx response.
async fn run_upload(
    form: UploadForm,
    tool: Tool,
    options: ToolOptions,
    query: &DownloadQuery,
) -> ServerResult<Response> {
    log_info(format!(
        "📄 NEW UPLOAD: {} ({} bytes) -> {}",
        form.file_name.as_deref().unwrap_or("unknown"),
        form.bytes.len(),
        tool
    ));

    let sheet = form.text("sheet").map(str::to_string);
    let UploadForm {
        bytes, file_name, ..
    } = form;

    // Parsing and expansion are CPU-bound.
    let run = tokio::task::spawn_blocking(move || {
        process_bytes(bytes, file_name.as_deref(), sheet.as_deref(), tool, &options)
    })
    .await
    .map_err(|e| ServerError::Internal(format!("Tool task failed: {}", e)))??;

    if query.download.unwrap_or(false) {
        let bytes = write_table(&run.output, tool.sheet_title())?;
        let disposition = format!("attachment; filename=\"{}\"", tool.file_name());
        return Ok((
            [
                (header::CONTENT_TYPE, XLSX_MIME.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            bytes,
        )
            .into_response());
    }

    Ok(Json(ToolResponse::from(run)).into_response())
}

/// Multipart upload: the `file` part plus every text field.
struct UploadForm {
    bytes: Vec<u8>,
    file_name: Option<String>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Trimmed text field, `None` when absent or blank.
    fn text(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn flag(&self, key: &str) -> bool {
        matches!(
            self.text(key).map(str::to_lowercase).as_deref(),
            Some("true" | "1" | "on" | "yes")
        )
    }

    fn number(&self, key: &str) -> ServerResult<Option<usize>> {
        self.text(key)
            .map(|raw| {
                raw.parse().map_err(|_| {
                    ServerError::BadRequest(format!("'{}' must be a non-negative integer, got '{}'", key, raw))
                })
            })
            .transpose()
    }

    fn markers(&self) -> Option<Vec<String>> {
        self.text("markers")
            .map(parse_marker_list)
            .filter(|m| !m.is_empty())
    }

    fn resolve_mode(&self) -> ResolveMode {
        if self.flag("strict") {
            ResolveMode::Strict
        } else {
            ResolveMode::FirstMatch
        }
    }
}

async fn read_form(mut multipart: Multipart) -> ServerResult<UploadForm> {
    let mut bytes: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut fields = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            file_name = field.file_name().map(|s| s.to_string());
            bytes = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?
                    .to_vec(),
            );
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            fields.insert(name, value);
        }
    }

    let bytes = bytes.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;
    Ok(UploadForm {
        bytes,
        file_name,
        fields,
    })
}

fn status_for(err: &ServerError) -> StatusCode {
    match err {
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::Pipeline(e) if e.is_input_error() => StatusCode::BAD_REQUEST,
        ServerError::Pipeline(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn rejection(err: ServerError) -> Rejection {
    let status = status_for(&err);
    log_error(err.to_string());
    (status, Json(error_response(&err.to_string())))
}

//! HTTP API for the MDX25 database sync.
//!
//! Every endpoint runs to completion inside its request; there is no job
//! queue and overlapping calls are not serialized.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use mdx_sync::{
    StatusReport, SyncDirection, SyncOrchestrator, SyncRun, SyncSummary, TableSyncResult,
};
use mdx_types::SyncTable;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared state behind every handler.
pub struct AppState {
    pub orchestrator: SyncOrchestrator,
    /// Bearer secret for the cron endpoint. When unset the endpoint rejects
    /// every call.
    pub cron_secret: Option<String>,
}

impl AppState {
    pub fn new(orchestrator: SyncOrchestrator, cron_secret: Option<String>) -> Self {
        Self {
            orchestrator,
            cron_secret,
        }
    }
}

/// Errors returned to HTTP clients.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(error) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": error })),
            )
                .into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized" })),
            )
                .into_response(),
            Self::Internal(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": error })),
            )
                .into_response(),
        }
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub success: bool,
    pub message: String,
    pub run_id: String,
    pub results: Vec<TableSyncResult>,
    pub summary: SyncSummary,
}

impl RunResponse {
    fn from_run(run: SyncRun, message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            run_id: run.id.to_string(),
            results: run.results,
            summary: run.summary,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableResponse {
    pub success: bool,
    pub result: TableSyncResult,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: StatusReport,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    pub summary: SyncSummary,
}

#[derive(Deserialize, Default)]
struct FullDatabaseRequest {
    direction: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SingleTableRequest {
    table_name: Option<String>,
    direction: Option<String>,
}

/// Parses an optional JSON body. An empty body yields the default request.
fn parse_body<T: for<'de> Deserialize<'de> + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))
}

async fn run_direction(state: &AppState, direction: SyncDirection, message: &str) -> Json<RunResponse> {
    info!("Sync requested over HTTP ({direction})");
    let run = state.orchestrator.run(direction).await;
    Json(RunResponse::from_run(run, message))
}

async fn to_supabase_handler(State(state): State<Arc<AppState>>) -> Json<RunResponse> {
    run_direction(&state, SyncDirection::ToSupabase, "Local → Supabase sync finished").await
}

async fn from_supabase_handler(State(state): State<Arc<AppState>>) -> Json<RunResponse> {
    run_direction(&state, SyncDirection::FromSupabase, "Supabase → local sync finished").await
}

async fn bidirectional_handler(State(state): State<Arc<AppState>>) -> Json<RunResponse> {
    run_direction(&state, SyncDirection::Bidirectional, "Bidirectional sync finished").await
}

async fn full_database_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<RunResponse> {
    let request: FullDatabaseRequest = parse_body(&body)?;
    let direction = match request.direction.as_deref() {
        Some("to-supabase") => SyncDirection::ToSupabase,
        Some("from-supabase") => SyncDirection::FromSupabase,
        _ => {
            return Err(ApiError::BadRequest(
                "direction must be 'to-supabase' or 'from-supabase'".to_string(),
            ));
        }
    };
    Ok(run_direction(&state, direction, "Full database sync finished").await)
}

async fn single_table_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<TableResponse> {
    let request: SingleTableRequest = parse_body(&body)?;
    let Some(name) = request.table_name.filter(|n| !n.is_empty()) else {
        return Err(ApiError::BadRequest("tableName is required".to_string()));
    };
    let table: SyncTable = name.parse().map_err(|_| {
        let available: Vec<&str> = SyncTable::ALL.iter().map(|t| t.name()).collect();
        ApiError::BadRequest(format!(
            "Table '{name}' cannot be synced. Available tables: {}",
            available.join(", ")
        ))
    })?;
    let direction = match request.direction {
        Some(d) => d.parse::<SyncDirection>().map_err(ApiError::BadRequest)?,
        None => SyncDirection::Bidirectional,
    };

    info!("Single-table sync requested: {table} ({direction})");
    let result = state.orchestrator.sync_table(table, direction).await;
    if !result.success {
        return Err(ApiError::Internal(
            result.error.unwrap_or_else(|| format!("sync of {table} failed")),
        ));
    }
    Ok(Json(TableResponse {
        success: true,
        result,
    }))
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        success: true,
        report: state.orchestrator.check_status().await,
    })
}

fn authorized(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(secret) = state.cron_secret.as_deref() else {
        return false;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == secret)
}

async fn daily_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<DailyResponse> {
    if !authorized(&state, &headers) {
        warn!("Rejected unauthorized cron call");
        return Err(ApiError::Unauthorized);
    }

    let run = state.orchestrator.run_daily().await;
    Ok(Json(DailyResponse {
        success: true,
        message: "Daily sync finished".to_string(),
        timestamp: mdx_types::format_timestamp(&Utc::now()),
        summary: run.summary,
    }))
}

/// Build the HTTP API router around the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/sync/to-supabase", post(to_supabase_handler))
        .route("/api/sync/from-supabase", post(from_supabase_handler))
        .route("/api/sync/bidirectional", post(bidirectional_handler))
        .route("/api/sync/full-database", post(full_database_handler))
        .route("/api/sync/single-table", post(single_table_handler))
        .route("/api/sync/status", get(status_handler))
        .route("/api/cron/sync-daily", get(daily_handler))
        .with_state(state)
}

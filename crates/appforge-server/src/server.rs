//! Axum router and server loop

use crate::error::ApiError;
use crate::state::SharedState;
use appforge_core::{AppforgeError, RequestKind, TaskId, TaskRecord, TaskRequest, TaskStatus};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptedResponse {
    pub status: String,
    pub task_id: TaskId,
}

/// Body of `GET /api/status/:task_id`; the request is echoed without its secret
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub request: TaskRequest,
    pub repo_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TaskRecord> for StatusResponse {
    fn from(record: TaskRecord) -> Self {
        Self {
            task_id: record.id,
            status: record.status,
            request: record.request,
            repo_name: record.repo_name,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Build the application router
pub fn router(state: SharedState) -> Router {
    let body_limit = state.max_body_bytes;
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/deploy", post(deploy))
        .route("/api/revise", post(revise))
        .route("/api/status/:task_id", get(status))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves, then finish in-flight requests
pub async fn serve<F>(state: SharedState, addr: &str, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// GET /
async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "appforge build service" }))
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /api/deploy
async fn deploy(
    State(app): State<SharedState>,
    payload: Result<Json<TaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    accept(&app, RequestKind::Build, payload)
}

/// POST /api/revise
async fn revise(
    State(app): State<SharedState>,
    payload: Result<Json<TaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    accept(&app, RequestKind::Revision, payload)
}

fn accept(
    app: &SharedState,
    kind: RequestKind,
    payload: Result<Json<TaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    let Json(request) =
        payload.map_err(|e| AppforgeError::Validation(format!("Invalid request body: {}", e)))?;

    let task_id = app.dispatcher.accept(kind, request)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            status: "accepted".to_string(),
            task_id,
        }),
    ))
}

/// GET /api/status/:task_id
async fn status(
    State(app): State<SharedState>,
    Path(task_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let record = app
        .dispatcher
        .status(&TaskId::from(task_id))
        .map_err(|_| AppforgeError::NotFound("Task not found".to_string()))?;
    Ok(Json(record.into()))
}

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{
    AlignOutcome, ChangeBatch, CommitOutcome, Dependency, DependencyId, EditKind, EngineError,
    Schedule, SchedulingResult, Task, TaskId,
};

#[derive(Clone)]
pub struct AppState {
    schedule: Arc<RwLock<Schedule>>,
}

impl AppState {
    pub fn new(schedule: Schedule) -> Self {
        Self {
            schedule: Arc::new(RwLock::new(schedule)),
        }
    }

    fn schedule(&self) -> Arc<RwLock<Schedule>> {
        self.schedule.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<EngineError> for ApiError {
    fn from(value: EngineError) -> Self {
        match value {
            EngineError::UnknownTask(_) | EngineError::UnknownDependency(_) => {
                ApiError::NotFound(value.to_string())
            }
            EngineError::EditInProgress(_)
            | EngineError::NoActiveEdit(_)
            | EngineError::EditsInFlight { .. } => ApiError::Conflict(value.to_string()),
            EngineError::Validation(_) => ApiError::Invalid(value.to_string()),
            EngineError::Persistence(_) => ApiError::Internal(value.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct EditPayload {
    kind: EditKind,
    delta_days: i64,
}

#[derive(Debug, Serialize)]
struct EditResponse {
    task: Task,
    #[serde(flatten)]
    outcome: Option<CommitOutcome>,
    committed: bool,
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    can_undo: bool,
    can_redo: bool,
    undo_depth: usize,
    redo_depth: usize,
    last: Option<ChangeBatch>,
    next_redo: Option<ChangeBatch>,
    unsynced: Vec<TaskId>,
}

#[derive(Debug, Serialize)]
struct StepResponse {
    applied: bool,
    #[serde(flatten)]
    outcome: Option<CommitOutcome>,
}

impl From<Option<CommitOutcome>> for StepResponse {
    fn from(outcome: Option<CommitOutcome>) -> Self {
        Self {
            applied: outcome.is_some(),
            outcome,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(list_tasks))
        .route("/tasks/:id", get(get_task))
        .route("/tasks/:id/edit", post(edit_task))
        .route("/dependencies", get(list_dependencies).post(create_dependency))
        .route(
            "/dependencies/:id",
            put(update_dependency).delete(delete_dependency),
        )
        .route("/align/preview", get(preview_alignment))
        .route("/align", post(align))
        .route("/undo", post(undo))
        .route("/redo", post(redo))
        .route("/history", get(history))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, schedule: Schedule) -> std::io::Result<()> {
    let state = AppState::new(schedule);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "http api listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    let schedule = state.schedule();
    let tasks = schedule.read().tasks().to_vec();
    Json(tasks)
}

async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let task_id = TaskId::from(task_id);
    let schedule = state.schedule();
    let task = schedule.read().task(&task_id).cloned();
    task.map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("task {task_id} not found")))
}

async fn edit_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(payload): Json<EditPayload>,
) -> Result<Json<EditResponse>, ApiError> {
    let task_id = TaskId::from(task_id);
    let schedule = state.schedule();
    let mut guard = schedule.write();
    let outcome = guard.apply_manual_edit(&task_id, payload.kind, payload.delta_days)?;
    let task = guard
        .task(&task_id)
        .cloned()
        .ok_or_else(|| ApiError::Internal("task not found after edit".into()))?;
    Ok(Json(EditResponse {
        task,
        committed: outcome.is_some(),
        outcome,
    }))
}

async fn list_dependencies(State(state): State<AppState>) -> Json<Vec<Dependency>> {
    let schedule = state.schedule();
    let dependencies = schedule.read().dependencies().to_vec();
    Json(dependencies)
}

async fn create_dependency(
    State(state): State<AppState>,
    Json(dependency): Json<Dependency>,
) -> Result<(StatusCode, Json<Dependency>), ApiError> {
    let schedule = state.schedule();
    let mut guard = schedule.write();
    if guard.dependency(&dependency.id).is_some() {
        return Err(ApiError::Conflict(format!(
            "dependency {} already exists",
            dependency.id
        )));
    }
    guard.create_dependency(dependency.clone())?;
    Ok((StatusCode::CREATED, Json(dependency)))
}

async fn update_dependency(
    State(state): State<AppState>,
    Path(dependency_id): Path<String>,
    Json(dependency): Json<Dependency>,
) -> Result<Json<Dependency>, ApiError> {
    if dependency.id.as_str() != dependency_id {
        return Err(ApiError::invalid(
            "dependency id in payload does not match path parameter",
        ));
    }
    let schedule = state.schedule();
    schedule.write().update_dependency(dependency.clone())?;
    Ok(Json(dependency))
}

async fn delete_dependency(
    State(state): State<AppState>,
    Path(dependency_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let schedule = state.schedule();
    schedule
        .write()
        .delete_dependency(&DependencyId::from(dependency_id))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn preview_alignment(State(state): State<AppState>) -> Json<SchedulingResult> {
    let schedule = state.schedule();
    let result = schedule.read().propose_alignment();
    Json(result)
}

async fn align(State(state): State<AppState>) -> Result<Response, ApiError> {
    let schedule = state.schedule();
    let outcome = schedule.write().align()?;
    let status = match outcome {
        AlignOutcome::Cycle { .. } => StatusCode::CONFLICT,
        AlignOutcome::NoChanges | AlignOutcome::Applied(_) => StatusCode::OK,
    };
    Ok((status, Json(outcome)).into_response())
}

async fn undo(State(state): State<AppState>) -> Result<Json<StepResponse>, ApiError> {
    let schedule = state.schedule();
    let outcome = schedule.write().undo()?;
    Ok(Json(outcome.into()))
}

async fn redo(State(state): State<AppState>) -> Result<Json<StepResponse>, ApiError> {
    let schedule = state.schedule();
    let outcome = schedule.write().redo()?;
    Ok(Json(outcome.into()))
}

async fn history(State(state): State<AppState>) -> Json<HistoryResponse> {
    let schedule = state.schedule();
    let guard = schedule.read();
    let history = guard.history();
    Json(HistoryResponse {
        can_undo: history.can_undo(),
        can_redo: history.can_redo(),
        undo_depth: history.undo_depth(),
        redo_depth: history.redo_depth(),
        last: history.last_undo().cloned(),
        next_redo: history.last_redo().cloned(),
        unsynced: guard.unsynced_tasks().cloned().collect(),
    })
}

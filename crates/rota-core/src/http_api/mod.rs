use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::{Local, NaiveDate};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    BookError, DueSummary, DynStore, MAX_UPCOMING, Roster, RosterError, RuleWarning,
    ScheduleRule, TaskAssignment, describe, next_occurrence, rule_warnings, upcoming,
};

const DEFAULT_PREVIEW_COUNT: usize = 5;

#[derive(Clone)]
pub struct AppState {
    roster: Arc<RwLock<Roster<DynStore>>>,
}

impl AppState {
    pub fn new(roster: Roster<DynStore>) -> Self {
        Self {
            roster: Arc::new(RwLock::new(roster)),
        }
    }

    fn roster(&self) -> Arc<RwLock<Roster<DynStore>>> {
        self.roster.clone()
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
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<RosterError> for ApiError {
    fn from(value: RosterError) -> Self {
        match value {
            RosterError::Book(BookError::NotFound(id)) => {
                ApiError::not_found(format!("assignment {id} not found"))
            }
            RosterError::Book(err @ (BookError::Duplicate(_) | BookError::IdsExhausted)) => {
                ApiError::Conflict(err.to_string())
            }
            RosterError::Book(err @ BookError::Invalid(_)) => ApiError::invalid(err.to_string()),
            RosterError::Persistence(err) => {
                tracing::error!(error = %err, "failed to persist assignments");
                ApiError::Internal(err.to_string())
            }
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
struct CreateAssignmentPayload {
    staff_id: String,
    task_name: String,
    rule: ScheduleRule,
    #[serde(default)]
    today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct UpdateRulePayload {
    rule: ScheduleRule,
    #[serde(default)]
    today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct RecordRunPayload {
    #[serde(default)]
    run_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct TriggerPayload {
    due_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    staff_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DueQuery {
    as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct DueResponse {
    summary: DueSummary,
    assignments: Vec<TaskAssignment>,
}

#[derive(Debug, Deserialize)]
struct PreviewPayload {
    rule: ScheduleRule,
    from: NaiveDate,
    #[serde(default)]
    count: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RulePreview {
    pub description: String,
    pub next: Option<NaiveDate>,
    pub upcoming: Vec<NaiveDate>,
    pub warnings: Vec<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/assignments", get(list_assignments).post(create_assignment))
        .route(
            "/assignments/:id",
            get(get_assignment).delete(delete_assignment),
        )
        .route("/assignments/:id/rule", put(update_rule))
        .route("/assignments/:id/runs", post(record_run))
        .route("/assignments/:id/trigger", post(trigger_assignment))
        .route("/due", get(due_assignments))
        .route("/rules/preview", post(preview_rule))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, roster: Roster<DynStore>) -> std::io::Result<()> {
    let state = AppState::new(roster);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "rota HTTP API listening");
    axum::serve(listener, app).await
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_assignments(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<TaskAssignment>> {
    let roster = state.roster();
    let guard = roster.read();
    let assignments = match query.staff_id.as_deref() {
        Some(staff_id) => guard
            .book()
            .for_staff(staff_id)
            .into_iter()
            .cloned()
            .collect(),
        None => guard.book().to_vec(),
    };
    Json(assignments)
}

async fn get_assignment(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<TaskAssignment>, ApiError> {
    let roster = state.roster();
    let found = roster.read().find(id).cloned();
    found
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("assignment {id} not found")))
}

async fn create_assignment(
    State(state): State<AppState>,
    Json(payload): Json<CreateAssignmentPayload>,
) -> Result<(StatusCode, Json<TaskAssignment>), ApiError> {
    let roster = state.roster();
    let created = roster.write().assign(
        payload.staff_id,
        payload.task_name,
        payload.rule,
        payload.today.unwrap_or_else(today),
    )?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_assignment(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<StatusCode, ApiError> {
    let roster = state.roster();
    let removed = roster.write().remove(id)?;
    if !removed {
        return Err(ApiError::not_found(format!("assignment {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(payload): Json<UpdateRulePayload>,
) -> Result<Json<TaskAssignment>, ApiError> {
    let roster = state.roster();
    let updated =
        roster
            .write()
            .update_rule(id, payload.rule, payload.today.unwrap_or_else(today))?;
    Ok(Json(updated))
}

async fn record_run(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(payload): Json<RecordRunPayload>,
) -> Result<Json<TaskAssignment>, ApiError> {
    let roster = state.roster();
    let updated = roster
        .write()
        .record_run(id, payload.run_date.unwrap_or_else(today))?;
    Ok(Json(updated))
}

async fn trigger_assignment(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(payload): Json<TriggerPayload>,
) -> Result<Json<TaskAssignment>, ApiError> {
    let roster = state.roster();
    let updated = roster.write().trigger(id, payload.due_date)?;
    Ok(Json(updated))
}

async fn due_assignments(
    State(state): State<AppState>,
    Query(query): Query<DueQuery>,
) -> Json<DueResponse> {
    let as_of = query.as_of.unwrap_or_else(today);
    let roster = state.roster();
    let guard = roster.read();
    Json(DueResponse {
        summary: guard.due_summary(as_of),
        assignments: guard
            .get_due_assignments(as_of)
            .into_iter()
            .cloned()
            .collect(),
    })
}

async fn preview_rule(Json(payload): Json<PreviewPayload>) -> Result<Json<RulePreview>, ApiError> {
    let count = payload.count.unwrap_or(DEFAULT_PREVIEW_COUNT);
    if count > MAX_UPCOMING {
        return Err(ApiError::invalid(format!(
            "count must be at most {MAX_UPCOMING}"
        )));
    }
    let rule = payload.rule;
    Ok(Json(RulePreview {
        description: describe(&rule),
        next: next_occurrence(&rule, payload.from),
        upcoming: upcoming(&rule, payload.from, count),
        warnings: rule_warnings(&rule)
            .iter()
            .map(RuleWarning::to_string)
            .collect(),
    }))
}

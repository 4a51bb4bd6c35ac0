// handlers/protected/tasks.rs - /api/tasks handlers
//
// Tasks are reached through their parent project. Reads and writes of a task
// under someone else's project answer 403; a task that does not exist answers 404.

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::database::models::task::parse_due_date;
use crate::database::models::{NewTask, Task, TaskPatch, TaskStats, TaskView};
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Message};
use crate::state::AppState;
use crate::types::{nullable, FieldUpdate};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub project_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<String>>,
}

impl CreateTaskRequest {
    /// Blank status, priority and due date fall back to the defaults.
    fn into_new_task(self) -> Result<NewTask, ApiError> {
        let project = match self.project_id.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_id(raw, "project")?,
            _ => {
                let mut fields = HashMap::new();
                fields.insert("projectId".to_string(), "This field is required".to_string());
                return Err(ApiError::validation_error("Project is required", Some(fields)));
            }
        };

        Ok(NewTask {
            title: self.title.unwrap_or_default(),
            description: self.description,
            status: parse_choice(non_blank(self.status))?,
            priority: parse_choice(non_blank(self.priority))?,
            due_date: non_blank(self.due_date).map(|d| parse_due(&d)).transpose()?,
            project,
        })
    }
}

impl TryFrom<UpdateTaskRequest> for TaskPatch {
    type Error = ApiError;

    fn try_from(request: UpdateTaskRequest) -> Result<Self, Self::Error> {
        let due_date = match request.due_date {
            None => FieldUpdate::Unchanged,
            Some(None) => FieldUpdate::Cleared,
            Some(Some(raw)) if raw.trim().is_empty() => FieldUpdate::Unchanged,
            Some(Some(raw)) => FieldUpdate::Set(parse_due(&raw)?),
        };

        Ok(TaskPatch {
            title: non_blank(request.title),
            description: request.description.into(),
            status: parse_choice(non_blank(request.status))?,
            priority: parse_choice(non_blank(request.priority))?,
            due_date,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_choice<T>(value: Option<String>) -> Result<Option<T>, ApiError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|raw| raw.parse::<T>().map_err(|e| ApiError::validation_error(e.to_string(), None)))
        .transpose()
}

fn parse_due(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    parse_due_date(raw)
        .ok_or_else(|| ApiError::validation_error(format!("invalid dueDate '{}'", raw), None))
}

/// GET /api/tasks - Every task under the caller's projects, newest first
pub async fn tasks_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<TaskView>> {
    let tasks = state.tasks().list(user.user_id).await?;
    Ok(ApiResponse::success(tasks))
}

/// GET /api/tasks/stats/all - Task counts by status
pub async fn tasks_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<TaskStats> {
    let stats = state.tasks().stats(user.user_id).await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/tasks/project/:id - Tasks of one owned project
pub async fn project_tasks_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Task>> {
    let project = parse_id(&id, "project")?;
    let tasks = state.tasks().list_for_project(user.user_id, project).await?;
    Ok(ApiResponse::success(tasks))
}

/**
 * POST /api/tasks - Create a task in one of the caller's projects
 *
 * Expected Input:
 * ```json
 * {
 *   "title": "string",          // Required
 *   "projectId": "uuid",        // Required, must be owned by the caller
 *   "description": "string",
 *   "status": "todo | in-progress | done",   // Default: todo
 *   "priority": "low | medium | high",       // Default: medium
 *   "dueDate": "2025-03-01"                  // RFC 3339 or YYYY-MM-DD
 * }
 * ```
 *
 * The task is assigned to the caller.
 */
pub async fn task_create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<Task> {
    let Json(request) = payload?;
    let task = state.tasks().create(user.user_id, request.into_new_task()?).await?;
    Ok(ApiResponse::created(task))
}

/// GET /api/tasks/:id - One task with its project's id and title
pub async fn task_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<TaskView> {
    let id = parse_id(&id, "task")?;
    let task = state.tasks().get(user.user_id, id).await?;
    Ok(ApiResponse::success(task))
}

/**
 * PUT /api/tasks/:id - Partial update
 *
 * Omitted or blank fields keep their value. `description` and `dueDate`
 * accept `null` to clear them.
 */
pub async fn task_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> ApiResult<Task> {
    let id = parse_id(&id, "task")?;
    let Json(request) = payload?;
    let task = state.tasks().update(user.user_id, id, request.try_into()?).await?;
    Ok(ApiResponse::success(task))
}

/// DELETE /api/tasks/:id
pub async fn task_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Message> {
    let id = parse_id(&id, "task")?;
    state.tasks().delete(user.user_id, id).await?;
    Ok(ApiResponse::message("Task deleted successfully"))
}

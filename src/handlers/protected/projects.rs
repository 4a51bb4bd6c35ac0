// handlers/protected/projects.rs - /api/projects handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::database::models::{Project, ProjectChanges};
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Message};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl From<ProjectRequest> for ProjectChanges {
    fn from(request: ProjectRequest) -> Self {
        ProjectChanges {
            title: request.title,
            description: request.description,
        }
    }
}

/// GET /api/projects - The caller's projects, newest first
pub async fn projects_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Project>> {
    let projects = state.projects().list(user.user_id).await?;
    Ok(ApiResponse::success(projects))
}

/// POST /api/projects - Create a project owned by the caller
pub async fn project_create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<ProjectRequest>, JsonRejection>,
) -> ApiResult<Project> {
    let Json(request) = payload?;
    let project = state.projects().create(user.user_id, request.into()).await?;
    Ok(ApiResponse::created(project))
}

/**
 * GET /api/projects/:id - Fetch one project
 *
 * A project owned by someone else answers 404, same as a missing one.
 */
pub async fn project_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Project> {
    let id = parse_id(&id, "project")?;
    let project = state.projects().get(user.user_id, id).await?;
    Ok(ApiResponse::success(project))
}

/// PUT /api/projects/:id - Replace the provided fields
pub async fn project_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<ProjectRequest>, JsonRejection>,
) -> ApiResult<Project> {
    let id = parse_id(&id, "project")?;
    let Json(request) = payload?;
    let project = state.projects().update(user.user_id, id, request.into()).await?;
    Ok(ApiResponse::success(project))
}

/// DELETE /api/projects/:id - Delete the project and every task under it
pub async fn project_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Message> {
    let id = parse_id(&id, "project")?;
    state.projects().delete(user.user_id, id).await?;
    Ok(ApiResponse::message("Project deleted successfully"))
}

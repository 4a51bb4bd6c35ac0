// handlers/protected/users.rs - /api/users/me handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::database::models::{User, UserChanges};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// GET /api/users/me - The caller's profile (never includes the password hash)
pub async fn me_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<User> {
    let profile = state.accounts().profile(user.user_id).await?;
    Ok(ApiResponse::success(profile))
}

/// PUT /api/users/me - Change name and/or email
pub async fn me_update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> ApiResult<User> {
    let Json(request) = payload?;
    let changes = UserChanges {
        name: request.name,
        email: request.email,
    };
    let profile = state.accounts().update_profile(user.user_id, changes).await?;
    Ok(ApiResponse::success(profile))
}

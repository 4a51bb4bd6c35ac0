// handlers/public/auth/register.rs - POST /api/auth/register handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use super::AuthResponse;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::Registration;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl From<RegisterRequest> for Registration {
    fn from(request: RegisterRequest) -> Self {
        Registration {
            name: request.name,
            email: request.email,
            password: request.password,
        }
    }
}

/**
 * POST /api/auth/register - Create a new account and receive JWT token
 *
 * Expected Input:
 * ```json
 * { "name": "Alice", "email": "alice@example.com", "password": "secret" }
 * ```
 *
 * Responds 201 with the same `{message, token, user}` shape as login.
 * Missing fields are reported per field under `field_errors`.
 */
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<AuthResponse> {
    let Json(request) = payload?;

    let session = state.accounts().register(request.into()).await?;

    Ok(ApiResponse::created(AuthResponse {
        message: "User registered successfully",
        session,
    }))
}

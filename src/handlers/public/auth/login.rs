// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use super::AuthResponse;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/**
 * POST /api/auth/login - Authenticate user and receive JWT token
 *
 * Expected Input:
 * ```json
 * { "email": "alice@example.com", "password": "secret" }
 * ```
 *
 * Expected Output (Success):
 * ```json
 * {
 *   "message": "Login successful",
 *   "token": "eyJhbGciOiJIUzI1NiI...",
 *   "user": { "id": "user_uuid", "name": "Alice", "email": "alice@example.com" }
 * }
 * ```
 *
 * Unknown email and wrong password both answer 400 "Invalid email or password".
 */
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<AuthResponse> {
    let Json(request) = payload?;

    let session = state.accounts().login(request.email, request.password).await?;

    Ok(ApiResponse::success(AuthResponse {
        message: "Login successful",
        session,
    }))
}

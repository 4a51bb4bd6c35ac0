use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::ApiError;
use crate::state::AppState;

const MISSING_TOKEN: &str = "No token, authorization denied";
const INVALID_TOKEN: &str = "Token is not valid";

/// Authenticated user context extracted from JWT
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self { user_id: claims.sub }
    }
}

/// Why a request carries no usable bearer token
#[derive(Debug, PartialEq, Eq)]
enum BearerError {
    Missing,
    Malformed,
}

/// JWT authentication middleware that validates tokens and extracts user context
///
/// The user id is trusted for the lifetime of the token; the user record is
/// not looked up again here.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = match extract_bearer(request.headers()) {
        Ok(token) => token,
        Err(BearerError::Missing) => return Err(ApiError::unauthorized(MISSING_TOKEN)),
        Err(BearerError::Malformed) => {
            tracing::debug!("Rejected malformed Authorization header");
            return Err(ApiError::unauthorized(INVALID_TOKEN));
        }
    };

    // Never tell the client which check failed
    let claims = state.tokens.verify(token).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        ApiError::unauthorized(INVALID_TOKEN)
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn extract_bearer(headers: &HeaderMap) -> Result<&str, BearerError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Err(BearerError::Missing);
    };

    let value = value.to_str().map_err(|_| BearerError::Malformed)?;
    if value.trim().is_empty() {
        return Err(BearerError::Missing);
    }

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err(BearerError::Missing),
        None => Err(BearerError::Malformed),
    }
}

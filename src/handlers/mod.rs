// handlers/mod.rs - 2-Tier Handler Architecture
//
// Public (no auth) → Protected (JWT auth via middleware::auth)
pub mod public;    // Tier 1: No authentication required (/, /health, /api/auth/*)
pub mod protected; // Tier 2: JWT authentication required (/api/projects, /api/tasks, /api/users)

use uuid::Uuid;

use crate::error::ApiError;

/// Parse a path segment as a record id, rejecting malformed values with 400.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("Invalid {} id", what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_uuid_and_rejects_garbage() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "task").unwrap(), id);

        let err = parse_id("42", "task").unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Invalid task id");
    }
}

// handlers/public/status.rs - GET / and GET /health

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// Service banner with a map of the available endpoints
pub async fn root_get() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Taskboard API",
        "version": version,
        "description": "Multi-user task and project tracking backend",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "auth": "/api/auth/register, /api/auth/login (public - token acquisition)",
            "projects": "/api/projects[/:id] (protected)",
            "tasks": "/api/tasks[/:id], /api/tasks/project/:id, /api/tasks/stats/all (protected)",
            "users": "/api/users/me (protected)",
        }
    }))
}

/// Store health check: 200 when reachable, 503 otherwise
pub async fn health_get(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if let Err(e) = state.store.health_check().await {
        // Details stay in the log
        tracing::error!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("database unavailable"));
    }

    Ok(Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "database": "ok"
    })))
}

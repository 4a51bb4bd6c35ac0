use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Build the full HTTP application: public routes, the JWT-gated API and global layers.
pub fn app(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        // Public
        .route("/", get(public::root_get))
        .route("/health", get(public::health_get))
        // Public auth routes
        .merge(auth_public_routes())
        // Protected API
        .merge(
            Router::new()
                .merge(project_routes())
                .merge(task_routes())
                .merge(user_routes())
                .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware)),
        )
        .fallback(not_found)
        // Global middleware
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(&config.security.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use axum::routing::post;
    use public::auth;

    Router::new()
        .route("/api/auth/register", post(auth::register_post))
        .route("/api/auth/login", post(auth::login_post))
}

fn project_routes() -> Router<AppState> {
    use protected::projects;

    Router::new()
        .route(
            "/api/projects",
            get(projects::projects_list).post(projects::project_create),
        )
        .route(
            "/api/projects/:id",
            get(projects::project_get)
                .put(projects::project_update)
                .delete(projects::project_delete),
        )
}

fn task_routes() -> Router<AppState> {
    use protected::tasks;

    Router::new()
        .route("/api/tasks", get(tasks::tasks_list).post(tasks::task_create))
        // Static segments win over `/api/tasks/:id`
        .route("/api/tasks/stats/all", get(tasks::tasks_stats))
        .route("/api/tasks/project/:id", get(tasks::project_tasks_list))
        .route(
            "/api/tasks/:id",
            get(tasks::task_get)
                .put(tasks::task_update)
                .delete(tasks::task_delete),
        )
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    Router::new().route("/api/users/me", get(users::me_get).put(users::me_update))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

/// `*` allows any origin; otherwise only the listed ones.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Open storage, bind the configured address and serve until shutdown.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config).await?;
    let app = app(state, &config);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!(
        "Taskboard API listening on http://{} ({:?}, {:?} storage)",
        bind_addr,
        config.environment,
        config.database.backend
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

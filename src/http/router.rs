//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! static serving of uploaded logos, and creates the axum router ready
//! for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let users = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/profile", get(handlers::get_profile))
        .route("/profile", put(handlers::update_profile))
        .route("/password", put(handlers::change_password))
        .route("/stats", get(handlers::get_stats))
        .route("/logo", post(handlers::upload_logo));

    let clients = Router::new()
        .route("/", post(handlers::create_client))
        .route("/", get(handlers::list_clients))
        .route("/{id}", get(handlers::get_client))
        .route("/{id}", put(handlers::update_client))
        .route("/{id}", delete(handlers::delete_client));

    let quotes = Router::new()
        .route("/", post(handlers::create_quote))
        .route("/", get(handlers::list_quotes))
        .route("/{id}", get(handlers::get_quote))
        .route("/{id}", delete(handlers::delete_quote))
        .route(
            "/{id}/status",
            put(handlers::update_quote_status).patch(handlers::update_quote_status),
        )
        .route("/{id}/pdf", get(handlers::quote_pdf));

    let api_v1 = Router::new()
        .nest("/users", users)
        .nest("/clients", clients)
        .nest("/quotes", quotes);

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        // Uploaded logos are served as plain static files.
        .nest_service("/uploads", ServeDir::new(&state.config.uploads_dir))
        // Logo uploads are the largest accepted payload.
        .layer(DefaultBodyLimit::max(5 * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::RepositoryFactory;

    #[test]
    fn test_router_creation() {
        let repo = RepositoryFactory::create_local();
        let state = AppState::new(repo, AppConfig::for_tests("router-test-secret"));
        let _router = create_router(state);
    }
}

//! Route definitions for the Meshboard HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via
//! Axum's `State` extractor.

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(module_routes())
        .merge(webhook_routes())
        .merge(settings_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Module listing, detail, settings, actions, reload
fn module_routes() -> Router<AppState> {
    Router::new()
        .route("/modules", get(handlers::modules::list_modules))
        .route("/modules/{name}", get(handlers::modules::get_module))
        .route(
            "/modules/{name}/settings",
            put(handlers::modules::save_settings),
        )
        .route(
            "/modules/{name}/actions/{action}",
            post(handlers::modules::execute_action),
        )
        .route(
            "/modules/{name}/reload",
            post(handlers::modules::reload_module),
        )
}

/// Inbound event webhook
fn webhook_routes() -> Router<AppState> {
    Router::new().route("/webhook", post(handlers::webhook::receive))
}

/// Settings document export/import
fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/settings/export", get(handlers::settings::export))
        .route("/settings/import", post(handlers::settings::import))
}

/// Health check
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

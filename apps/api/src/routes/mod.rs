pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::state::AppState;
use crate::templates::handlers;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_template_bytes;
    Router::new()
        .route("/health", get(health::health_handler))
        // Template API
        .route(
            "/api/v1/templates/render",
            post(handlers::handle_render_template),
        )
        .route("/api/v1/fields/render", post(handlers::handle_render_field))
        .route(
            "/api/v1/documents/plain-text",
            post(handlers::handle_plain_text),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

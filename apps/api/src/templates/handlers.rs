//! Axum route handlers for the Template API.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::state::AppState;
use crate::templates::service::{
    describe_document, render_field, render_template, PlainTextRequest, PlainTextResponse,
    RenderFieldRequest, RenderFieldResponse, RenderTemplateRequest, RenderTemplateResponse,
};

/// POST /api/v1/templates/render
pub async fn handle_render_template(
    State(state): State<AppState>,
    Json(req): Json<RenderTemplateRequest>,
) -> Result<Json<RenderTemplateResponse>, AppError> {
    let response = render_template(req, state.config.collapse_blank_lines)?;
    Ok(Json(response))
}

/// POST /api/v1/fields/render
pub async fn handle_render_field(
    Json(req): Json<RenderFieldRequest>,
) -> Result<Json<RenderFieldResponse>, AppError> {
    Ok(Json(render_field(req)))
}

/// POST /api/v1/documents/plain-text
pub async fn handle_plain_text(
    Json(req): Json<PlainTextRequest>,
) -> Result<Json<PlainTextResponse>, AppError> {
    Ok(Json(describe_document(req)))
}

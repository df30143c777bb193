//! Boundary between the JSON wire shapes and the engine.
//!
//! Field maps arrive keyed by decimal strings; values arrive as arbitrary
//! JSON and are classified into [`FieldValue`]s here, once.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::document::{
    analyze, collapse_blank_runs, extract_plain_text, parse_ops, plain_text, Document,
    DocumentShape, Op,
};
use crate::errors::AppError;
use crate::fields::{render, FieldCatalog, FieldDefinition, FieldId, FieldType, FieldValue};
use crate::substitution::Substitutor;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RenderTemplateRequest {
    pub document: Document,
    /// Field id → value, in the order the values should be consumed.
    #[serde(default)]
    pub values: Map<String, Value>,
    #[serde(default)]
    pub field_types: HashMap<String, FieldType>,
    #[serde(default)]
    pub fields: HashMap<String, FieldDefinition>,
    /// Overrides the configured default when present.
    pub collapse_blank_lines: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct RenderTemplateResponse {
    pub document: Document,
    pub plain_text: String,
    pub shape: DocumentShape,
}

#[derive(Debug, Deserialize)]
pub struct RenderFieldRequest {
    #[serde(default)]
    pub value: Value,
    pub field_type: Option<FieldType>,
    pub field: Option<FieldDefinition>,
}

#[derive(Debug, Serialize)]
pub struct RenderFieldResponse {
    pub ops: Vec<Op>,
}

#[derive(Debug, Deserialize)]
pub struct PlainTextRequest {
    pub raw: String,
}

#[derive(Debug, Serialize)]
pub struct PlainTextResponse {
    pub text: String,
    pub shape: DocumentShape,
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

/// Substitutes every field into the request's document.
pub fn render_template(
    request: RenderTemplateRequest,
    default_collapse: bool,
) -> Result<RenderTemplateResponse, AppError> {
    let catalog = build_catalog(request.field_types, request.fields)?;
    let values = request
        .values
        .iter()
        .map(|(key, value)| Ok((parse_field_id(key)?, FieldValue::from_json(value))))
        .collect::<Result<Vec<_>, AppError>>()?;

    let value_count = values.len();
    let mut ops = Substitutor::new(&catalog).process(&request.document.ops, values);
    if request.collapse_blank_lines.unwrap_or(default_collapse) {
        ops = collapse_blank_runs(&ops);
    }

    info!(
        "Rendered template: {} ops in, {} ops out, {} values supplied",
        request.document.ops.len(),
        ops.len(),
        value_count
    );

    Ok(RenderTemplateResponse {
        plain_text: plain_text(&ops),
        shape: analyze(&ops),
        document: Document { ops },
    })
}

/// Renders one value on its own, as it would appear in place of its token.
pub fn render_field(request: RenderFieldRequest) -> RenderFieldResponse {
    let field_type = request
        .field_type
        .or_else(|| request.field.as_ref().and_then(|f| f.field_type.clone()))
        .unwrap_or_default();
    let value = FieldValue::from_json(&request.value);
    RenderFieldResponse {
        ops: render(Some(&value), &field_type, request.field.as_ref()),
    }
}

pub fn describe_document(request: PlainTextRequest) -> PlainTextResponse {
    let ops = parse_ops(&request.raw);
    PlainTextResponse {
        text: extract_plain_text(&request.raw),
        shape: analyze(&ops),
    }
}

fn build_catalog(
    field_types: HashMap<String, FieldType>,
    fields: HashMap<String, FieldDefinition>,
) -> Result<FieldCatalog, AppError> {
    let mut catalog = FieldCatalog::new();
    for (key, field_type) in field_types {
        catalog.insert_type(parse_field_id(&key)?, field_type);
    }
    for (key, definition) in fields {
        catalog.insert_definition(parse_field_id(&key)?, definition);
    }
    Ok(catalog)
}

fn parse_field_id(key: &str) -> Result<FieldId, AppError> {
    match key.trim().parse::<FieldId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::Validation(format!(
            "field id '{key}' is not a positive integer"
        ))),
    }
}

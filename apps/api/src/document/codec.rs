//! Parsing, serialization and whitespace normalization for delta documents.
//!
//! Every entry point here is total: malformed input degrades to a literal
//! fallback instead of an error, and no input text is ever discarded.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::document::op::{Document, Insert, Op};

static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());

/// Structural features of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentShape {
    pub is_list_block: bool,
    pub is_code_block: bool,
}

/// Parses `raw` as `{"ops": [...]}`, returning `None` when it is anything else.
pub fn try_parse_ops(raw: &str) -> Option<Vec<Op>> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let ops = value.as_object()?.get("ops")?;
    if !ops.is_array() {
        return None;
    }
    serde_json::from_value(ops.clone()).ok()
}

/// Parses a stored document. Empty input is an empty document; anything that
/// is not a valid ops document becomes a single literal insert of `raw`.
pub fn parse_ops(raw: &str) -> Vec<Op> {
    if raw.is_empty() {
        return Vec::new();
    }
    try_parse_ops(raw).unwrap_or_else(|| {
        debug!("value is not an ops document; using it as literal text");
        vec![Op::text(raw)]
    })
}

/// Plain text of a stored document, or `raw` itself when it does not parse.
pub fn extract_plain_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    match try_parse_ops(raw) {
        Some(ops) => plain_text(&ops),
        None => raw.to_string(),
    }
}

/// Concatenation of every text insert; embeds contribute nothing.
pub fn plain_text(ops: &[Op]) -> String {
    ops.iter().filter_map(Op::as_text).collect()
}

pub fn analyze(ops: &[Op]) -> DocumentShape {
    DocumentShape {
        is_list_block: ops.iter().any(|op| op.has_attribute("list")),
        is_code_block: ops.iter().any(|op| op.has_attribute("code-block")),
    }
}

/// Collapses runs of blank lines inside each text op.
///
/// An op left with an empty insert is dropped unless it carries attributes:
/// an empty formatted insert still marks a meaningful line.
pub fn collapse_blank_runs(ops: &[Op]) -> Vec<Op> {
    let mut collapsed = Vec::with_capacity(ops.len());
    for op in ops {
        let Some(text) = op.as_text() else {
            collapsed.push(op.clone());
            continue;
        };
        let text = BLANK_RUN_RE.replace_all(text, "\n");
        if text.is_empty() && !op.has_attributes() {
            continue;
        }
        let mut op = op.clone();
        op.insert = Some(Insert::Text(text.into_owned()));
        collapsed.push(op);
    }
    collapsed
}

/// Serializes ops back to the stored `{"ops": [...]}` form.
pub fn serialize_ops(ops: &[Op]) -> String {
    let document = Document { ops: ops.to_vec() };
    // A map of strings and JSON values always serializes.
    serde_json::to_string(&document).unwrap_or_else(|_| String::from(r#"{"ops":[]}"#))
}

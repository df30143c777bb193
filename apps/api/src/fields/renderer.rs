//! Field value rendering: turns one supplied value into the ops fragment that
//! replaces its placeholder.
//!
//! Dispatch is by value shape first (lists and maps render the same way for
//! most types), then by field type for string values.

use serde_json::json;

use crate::document::{extract_plain_text, parse_ops, try_parse_ops, Insert, Op};
use crate::fields::models::{FieldDefinition, FieldOption, FieldType, FieldValue};

const BULLET: &str = "bullet";

/// Renders `value` as a fragment for a field of `field_type`.
///
/// Never fails: a missing value renders empty and malformed rich text renders
/// as its literal characters.
pub fn render(
    value: Option<&FieldValue>,
    field_type: &FieldType,
    field: Option<&FieldDefinition>,
) -> Vec<Op> {
    let Some(value) = value else {
        return Vec::new();
    };

    let content = match (value, field_type) {
        (FieldValue::StringList(items), FieldType::MultiSelect) => render_bullets(items),
        (FieldValue::StringList(items), _) => render_sentences(items),
        (FieldValue::StringMap(entries), _) => render_pairs(entries),
        (FieldValue::Scalar(raw) | FieldValue::RichText(raw), FieldType::SelectInvert) => {
            render_select_invert(raw, field)
        }
        (FieldValue::Scalar(text), FieldType::String | FieldType::Number) => render_scalar(text),
        (FieldValue::RichText(raw), FieldType::String | FieldType::Number) => {
            render_scalar(&extract_plain_text(raw))
        }
        (FieldValue::Scalar(raw) | FieldValue::RichText(raw), _) => parse_ops(raw),
    };

    match field {
        Some(field) => with_label(content, field_type, field),
        None => content,
    }
}

fn render_scalar(text: &str) -> Vec<Op> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    vec![Op::text(text)]
}

/// One bullet line per non-blank entry. Rich-text entries keep their inline
/// formatting; every op of theirs joins the bullet list.
fn render_bullets(items: &[String]) -> Vec<Op> {
    let mut ops = Vec::new();
    for item in items {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        match try_parse_ops(item) {
            Some(entry_ops) => {
                let ends_line = entry_ops
                    .iter()
                    .rev()
                    .find(|op| op.has_content())
                    .and_then(Op::as_text)
                    .is_some_and(|text| text.ends_with('\n'));
                ops.extend(entry_ops.into_iter().map(|mut op| {
                    op.set_attribute("list", BULLET);
                    op
                }));
                if !ends_line {
                    ops.push(Op::text_attr("\n", "list", BULLET));
                }
            }
            None => ops.push(Op::text_attr(format!("{item}\n"), "list", BULLET)),
        }
    }
    ops
}

/// One line per entry, each closed with a period.
fn render_sentences(items: &[String]) -> Vec<Op> {
    items
        .iter()
        .map(|item| item.trim())
        .map(|item| {
            if item.ends_with('.') {
                Op::text(format!("{item}\n"))
            } else {
                Op::text(format!("{item}.\n"))
            }
        })
        .collect()
}

fn render_pairs(entries: &[(String, String)]) -> Vec<Op> {
    entries
        .iter()
        .map(|(key, value)| Op::text(format!("{key}: {value}\n")))
        .collect()
}

/// Selected option, then the joiner, then the comma-separated alternatives.
fn render_select_invert(raw: &str, field: Option<&FieldDefinition>) -> Vec<Op> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    let options: &[FieldOption] = field.map(|f| f.field_options.as_slice()).unwrap_or(&[]);
    let selected = find_selected(raw, options);

    let selected_raw = selected.map(|i| options[i].value.as_str()).unwrap_or(raw);
    let mut ops = strip_trailing_newlines(parse_ops(selected_raw));
    if let Some(field) = field {
        ops.extend(strip_trailing_newlines(field.joiner_ops()));
    }

    let others: Vec<String> = options
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != selected)
        .map(|(_, option)| option_caption(option))
        .collect();
    if !others.is_empty() {
        ops.push(Op::text(others.join(",")));
    }
    ops
}

/// First option equal to `raw`, else first whose plain text matches.
fn find_selected(raw: &str, options: &[FieldOption]) -> Option<usize> {
    if let Some(i) = options.iter().position(|option| option.value == raw) {
        return Some(i);
    }
    let wanted = extract_plain_text(raw);
    let wanted = wanted.trim();
    options
        .iter()
        .position(|option| extract_plain_text(&option.value).trim() == wanted)
}

fn option_caption(option: &FieldOption) -> String {
    let source = if option.label.trim().is_empty() {
        &option.value
    } else {
        &option.label
    };
    extract_plain_text(source).replace('\n', "")
}

/// Removes newlines at the end of the fragment, dropping ops left empty.
fn strip_trailing_newlines(mut ops: Vec<Op>) -> Vec<Op> {
    while let Some(last) = ops.last_mut() {
        let Some(text) = last.as_text() else { break };
        if !text.ends_with('\n') {
            break;
        }
        let trimmed = text.trim_end_matches('\n').to_string();
        if trimmed.is_empty() {
            ops.pop();
        } else {
            last.insert = Some(Insert::Text(trimmed));
            break;
        }
    }
    ops
}

fn with_label(content: Vec<Op>, field_type: &FieldType, field: &FieldDefinition) -> Vec<Op> {
    let label = field.label.trim();
    if !field.render_label || label.is_empty() || !content.iter().any(Op::has_content) {
        return content;
    }
    let heading = if field_type.is_inline() {
        Op::text_attr(format!("{label}: "), "bold", true)
    } else {
        Op::text_attr(format!("{label}\n"), "header", json!(2))
    };
    let mut ops = Vec::with_capacity(content.len() + 1);
    ops.push(heading);
    ops.extend(content);
    ops
}

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::document::{parse_ops, try_parse_ops, Op};

/// Positive integer identifying a field within a project.
pub type FieldId = u64;

// ────────────────────────────────────────────────────────────────────────────
// Field types
// ────────────────────────────────────────────────────────────────────────────

/// The type tag of a field. Unrecognized tags are kept verbatim and render as
/// block content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Number,
    Select,
    SelectInvert,
    MultiSelect,
    #[default]
    Text,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Select => "select",
            FieldType::SelectInvert => "select-invert",
            FieldType::MultiSelect => "multi-select",
            FieldType::Text => "text",
            FieldType::Other(tag) => tag,
        }
    }

    /// Inline fields render into the surrounding sentence rather than as
    /// their own block.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            FieldType::String | FieldType::Number | FieldType::Select | FieldType::SelectInvert
        )
    }
}

impl From<&str> for FieldType {
    fn from(tag: &str) -> Self {
        match tag {
            "string" => FieldType::String,
            "number" => FieldType::Number,
            "select" => FieldType::Select,
            "select-invert" => FieldType::SelectInvert,
            "multi-select" => FieldType::MultiSelect,
            "text" => FieldType::Text,
            other => FieldType::Other(other.to_string()),
        }
    }
}

impl From<String> for FieldType {
    fn from(tag: String) -> Self {
        FieldType::from(tag.as_str())
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field values
// ────────────────────────────────────────────────────────────────────────────

/// A field value as supplied for one substitution run.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain text (numbers and booleans arrive here as their textual form).
    Scalar(String),
    /// A JSON-encoded `{"ops": [...]}` document.
    RichText(String),
    StringList(Vec<String>),
    /// Key/value pairs in the order they were supplied.
    StringMap(Vec<(String, String)>),
}

impl FieldValue {
    pub fn scalar(text: impl Into<String>) -> Self {
        FieldValue::Scalar(text.into())
    }

    pub fn rich_text(raw: impl Into<String>) -> Self {
        FieldValue::RichText(raw.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::StringList(items.into_iter().map(Into::into).collect())
    }

    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        FieldValue::StringMap(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Classifies an arbitrary JSON value once, at the boundary.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Scalar(String::new()),
            Value::String(s) => FieldValue::from_text(s.clone()),
            Value::Bool(b) => FieldValue::Scalar(b.to_string()),
            Value::Number(n) => FieldValue::Scalar(n.to_string()),
            Value::Array(items) => FieldValue::StringList(
                items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(json_to_text)
                    .collect(),
            ),
            Value::Object(map) => {
                if map.get("ops").is_some_and(Value::is_array) {
                    FieldValue::RichText(value.to_string())
                } else {
                    FieldValue::StringMap(
                        map.iter()
                            .map(|(k, v)| (k.clone(), json_to_text(v)))
                            .collect(),
                    )
                }
            }
        }
    }

    /// A string is rich text only if it actually parses as an ops document.
    pub fn from_text(text: String) -> Self {
        if try_parse_ops(&text).is_some() {
            FieldValue::RichText(text)
        } else {
            FieldValue::Scalar(text)
        }
    }
}

fn json_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field metadata
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldOption {
    #[serde(deserialize_with = "string_or_json")]
    pub value: String,
    #[serde(default, deserialize_with = "string_or_json")]
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        FieldOption {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Metadata a collaborator supplies for a field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub render_label: bool,
    #[serde(default, rename = "fieldOptions", alias = "field_options")]
    pub field_options: Vec<FieldOption>,
    /// Joiner fragment for `select-invert`: a stored document string, plain
    /// text, or an inline `{"ops": [...]}` object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

impl FieldDefinition {
    pub fn labelled(label: impl Into<String>) -> Self {
        FieldDefinition {
            label: label.into(),
            render_label: true,
            ..FieldDefinition::default()
        }
    }

    pub fn joiner_ops(&self) -> Vec<Op> {
        match &self.content {
            Some(Value::String(raw)) => parse_ops(raw),
            Some(value @ Value::Object(_)) => parse_ops(&value.to_string()),
            _ => Vec::new(),
        }
    }
}

/// Field types and definitions for one project, keyed by field id.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    types: HashMap<FieldId, FieldType>,
    definitions: HashMap<FieldId, FieldDefinition>,
}

impl FieldCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, id: FieldId, field_type: impl Into<FieldType>) -> Self {
        self.types.insert(id, field_type.into());
        self
    }

    pub fn with_definition(mut self, id: FieldId, definition: FieldDefinition) -> Self {
        self.definitions.insert(id, definition);
        self
    }

    pub fn insert_type(&mut self, id: FieldId, field_type: FieldType) {
        self.types.insert(id, field_type);
    }

    pub fn insert_definition(&mut self, id: FieldId, definition: FieldDefinition) {
        self.definitions.insert(id, definition);
    }

    /// Explicit type mapping first, then the definition's own tag, then `text`.
    pub fn field_type(&self, id: FieldId) -> FieldType {
        self.types
            .get(&id)
            .or_else(|| {
                self.definitions
                    .get(&id)
                    .and_then(|d| d.field_type.as_ref())
            })
            .cloned()
            .unwrap_or_default()
    }

    pub fn definition(&self, id: FieldId) -> Option<&FieldDefinition> {
        self.definitions.get(&id)
    }
}

fn string_or_json<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        other => json_to_text(&other),
    })
}

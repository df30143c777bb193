//! Delta-style document model: an ordered list of ops, each inserting either
//! text or an opaque embed, with an optional attribute map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Formatting attributes. Keys are open-ended; only [`LINE_ATTRIBUTES`] take
/// part in line-level propagation.
pub type Attributes = Map<String, Value>;

/// Attributes that belong to a whole line and are anchored on its newline.
pub const LINE_ATTRIBUTES: [&str; 4] = ["list", "header", "code-block", "indent"];

/// Payload of an op: a run of characters or an embedded object (image, etc).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Insert {
    Text(String),
    Embed(Value),
}

/// A single document unit.
///
/// Keys other than `insert` and `attributes` are kept in `extra` so that an op
/// the engine does not understand still round-trips byte for byte.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Op {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert: Option<Insert>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A whole document in its wire form, `{"ops": [...]}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub ops: Vec<Op>,
}

impl Op {
    pub fn text(text: impl Into<String>) -> Self {
        Op {
            insert: Some(Insert::Text(text.into())),
            ..Op::default()
        }
    }

    /// Text op with attributes; an empty map is stored as no attributes.
    pub fn text_with(text: impl Into<String>, attributes: Option<Attributes>) -> Self {
        Op {
            insert: Some(Insert::Text(text.into())),
            attributes: attributes.filter(|a| !a.is_empty()),
            ..Op::default()
        }
    }

    /// Text op carrying a single attribute.
    pub fn text_attr(text: impl Into<String>, key: &str, value: impl Into<Value>) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert(key.to_string(), value.into());
        Op::text_with(text, Some(attributes))
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.insert {
            Some(Insert::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn is_embed(&self) -> bool {
        matches!(self.insert, Some(Insert::Embed(_)))
    }

    pub fn has_attributes(&self) -> bool {
        self.attributes.as_ref().is_some_and(|a| !a.is_empty())
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.as_ref().is_some_and(|a| a.contains_key(key))
    }

    pub fn has_line_attributes(&self) -> bool {
        has_line_attributes(self.attributes.as_ref())
    }

    /// Sets `key` on this op, keeping every other attribute.
    pub fn set_attribute(&mut self, key: &str, value: impl Into<Value>) {
        self.attributes
            .get_or_insert_with(Attributes::new)
            .insert(key.to_string(), value.into());
    }

    /// True for ops that contribute visible content (non-empty text or an embed).
    pub fn has_content(&self) -> bool {
        match &self.insert {
            Some(Insert::Text(text)) => !text.is_empty(),
            Some(Insert::Embed(_)) => true,
            None => false,
        }
    }
}

pub fn has_line_attributes(attributes: Option<&Attributes>) -> bool {
    attributes.is_some_and(|a| LINE_ATTRIBUTES.iter().any(|key| a.contains_key(*key)))
}

/// The line-level subset of `attributes`, or `None` when there is none.
pub fn line_attributes(attributes: Option<&Attributes>) -> Option<Attributes> {
    let attributes = attributes?;
    let subset: Attributes = attributes
        .iter()
        .filter(|(key, _)| LINE_ATTRIBUTES.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    (!subset.is_empty()).then_some(subset)
}

//! Line normalization.
//!
//! The same logical line can arrive as one op (`"text\n"`) or as a text op
//! followed by an attributed `"\n"` op. Splitting every text op on its
//! newlines gives one uniform shape: inline pieces plus the op that supplies
//! the line's terminating break. Pieces remember their source op so untouched
//! ops can be re-emitted exactly as they came in.

use crate::document::{Attributes, Op};
use crate::substitution::tokens::{contains_token, whole_token, TokenMatch};

#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    /// Newline-free text cut from `ops[source]`.
    Text { text: String, source: usize },
    /// An embed or an op without an insert.
    Opaque { source: usize },
}

impl Piece {
    pub fn source(&self) -> usize {
        match self {
            Piece::Text { source, .. } | Piece::Opaque { source } => *source,
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, Piece::Text { text, .. } if text.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pub pieces: Vec<Piece>,
    /// Source op of the terminating newline; `None` for a trailing line that
    /// never ends.
    pub terminator: Option<usize>,
}

impl Line {
    /// Attributes of the terminating newline, which carry the line's block
    /// formatting.
    pub fn break_attributes<'a>(&self, ops: &'a [Op]) -> Option<&'a Attributes> {
        self.terminator.and_then(|source| ops[source].attributes.as_ref())
    }

    pub fn has_token(&self) -> bool {
        self.pieces
            .iter()
            .any(|piece| matches!(piece, Piece::Text { text, .. } if contains_token(text)))
    }

    /// The single token that is this line's entire content.
    pub fn sole_token(&self) -> Option<TokenMatch> {
        let mut found = None;
        for piece in self.pieces.iter().filter(|piece| !piece.is_blank()) {
            let Piece::Text { text, .. } = piece else {
                return None;
            };
            if found.is_some() {
                return None;
            }
            found = Some(whole_token(text)?);
        }
        found
    }

    /// True when nothing but empty text follows `pieces[index]`.
    pub fn is_blank_after(&self, index: usize) -> bool {
        self.pieces[index + 1..].iter().all(Piece::is_blank)
    }
}

/// Splits `ops` into lines. Every op is referenced by at least one piece or
/// terminator, including empty text ops.
pub fn split_lines(ops: &[Op]) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current = Line::default();

    for (source, op) in ops.iter().enumerate() {
        let Some(text) = op.as_text() else {
            current.pieces.push(Piece::Opaque { source });
            continue;
        };
        if text.is_empty() {
            current.pieces.push(Piece::Text {
                text: String::new(),
                source,
            });
            continue;
        }

        let mut segments = text.split('\n').peekable();
        while let Some(segment) = segments.next() {
            if !segment.is_empty() {
                current.pieces.push(Piece::Text {
                    text: segment.to_string(),
                    source,
                });
            }
            if segments.peek().is_some() {
                current.terminator = Some(source);
                lines.push(std::mem::take(&mut current));
            }
        }
    }

    if !current.pieces.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ops(value: serde_json::Value) -> Vec<Op> {
        serde_json::from_value(value).unwrap()
    }

    fn texts(line: &Line) -> Vec<&str> {
        line.pieces
            .iter()
            .filter_map(|p| match p {
                Piece::Text { text, .. } => Some(text.as_str()),
                Piece::Opaque { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_combined_and_separate_breaks_normalize_alike() {
        let combined = ops(json!([{"insert": "item\n", "attributes": {"list": "bullet"}}]));
        let separate = ops(json!([
            {"insert": "item"},
            {"insert": "\n", "attributes": {"list": "bullet"}}
        ]));

        let a = split_lines(&combined);
        let b = split_lines(&separate);
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_eq!(texts(&a[0]), texts(&b[0]));
        assert_eq!(a[0].break_attributes(&combined), b[0].break_attributes(&separate));
        assert_eq!(b[0].terminator, Some(1));
    }

    #[test]
    fn test_multiline_op_and_trailing_text() {
        let doc = ops(json!([{"insert": "a\n\nb"}]));
        let lines = split_lines(&doc);
        assert_eq!(lines.len(), 3);
        assert_eq!(texts(&lines[0]), vec!["a"]);
        assert!(lines[1].pieces.is_empty());
        assert_eq!(lines[1].terminator, Some(0));
        assert_eq!(texts(&lines[2]), vec!["b"]);
        assert_eq!(lines[2].terminator, None);
    }

    #[test]
    fn test_embeds_and_empty_ops_are_pieces() {
        let doc = ops(json!([{"insert": ""}, {"insert": {"image": "x"}}, {"retain": 2}]));
        let lines = split_lines(&doc);
        assert_eq!(lines.len(), 1);
        let sources: Vec<usize> = lines[0].pieces.iter().map(Piece::source).collect();
        assert_eq!(sources, vec![0, 1, 2]);
    }

    #[test]
    fn test_sole_token() {
        let doc = ops(json!([{"insert": "GEN:{{1}}"}, {"insert": ""}, {"insert": "\n"}]));
        let lines = split_lines(&doc);
        assert_eq!(lines[0].sole_token().map(|t| t.field_id), Some(1));

        let doc = ops(json!([{"insert": "Hi GEN:{{1}}\n"}]));
        assert!(split_lines(&doc)[0].sole_token().is_none());

        let doc = ops(json!([{"insert": "GEN:{{1}}"}, {"insert": {"image": "x"}}]));
        assert!(split_lines(&doc)[0].sole_token().is_none());
    }
}

//! Helpers for fitting a rendered fragment into a host line.

use crate::document::{Insert, Op};

/// Fragments that format their own lines (bullets, headings, code) keep their
/// line attributes instead of inheriting the host line's.
pub fn is_block_fragment(fragment: &[Op]) -> bool {
    fragment.iter().any(Op::has_line_attributes)
}

/// True when the fragment's last visible character is a newline.
pub fn ends_with_newline(fragment: &[Op]) -> bool {
    fragment
        .iter()
        .rev()
        .find(|op| op.has_content())
        .and_then(Op::as_text)
        .is_some_and(|text| text.ends_with('\n'))
}

/// True when `body` has content that no newline has closed yet.
pub fn is_line_open(body: &[Op]) -> bool {
    match body.iter().rev().find(|op| op.has_content()) {
        Some(op) => op.as_text().map_or(true, |text| !text.ends_with('\n')),
        None => false,
    }
}

/// Strips newlines from both ends of a fragment, dropping ops left empty.
pub fn trim_outer_newlines(mut ops: Vec<Op>) -> Vec<Op> {
    let mut leading = 0;
    while let Some(text) = ops.get(leading).and_then(Op::as_text) {
        let trimmed = text.trim_start_matches('\n').to_string();
        if trimmed.is_empty() {
            leading += 1;
            continue;
        }
        if trimmed.len() != text.len() {
            ops[leading].insert = Some(Insert::Text(trimmed));
        }
        break;
    }
    ops.drain(..leading);

    while let Some(text) = ops.last().and_then(Op::as_text) {
        let trimmed = text.trim_end_matches('\n').to_string();
        if trimmed.is_empty() {
            ops.pop();
            continue;
        }
        if trimmed.len() != text.len() {
            if let Some(last) = ops.last_mut() {
                last.insert = Some(Insert::Text(trimmed));
            }
        }
        break;
    }
    ops
}

/// Resolves soft joins: positions in `out` where a line break was removed.
/// A single space goes in wherever the text on both sides would otherwise
/// touch without whitespace.
pub fn resolve_joins(out: &mut Vec<Op>, mut joins: Vec<usize>) {
    joins.dedup();
    for &at in joins.iter().rev() {
        let before = last_char(&out[..at]);
        let after = first_char(&out[at..]);
        if let (Some(before), Some(after)) = (before, after) {
            if !before.is_whitespace() && !after.is_whitespace() {
                out.insert(at, Op::text(" "));
            }
        }
    }
}

/// Last character before a boundary; an embed counts as no character.
fn last_char(ops: &[Op]) -> Option<char> {
    ops.iter()
        .rev()
        .find(|op| op.has_content())
        .and_then(Op::as_text)
        .and_then(|text| text.chars().next_back())
}

fn first_char(ops: &[Op]) -> Option<char> {
    ops.iter()
        .find(|op| op.has_content())
        .and_then(Op::as_text)
        .and_then(|text| text.chars().next())
}

//! Placeholder token scanning.
//!
//! A token is `TAG:{{N}}` where `TAG` records which field list the id came
//! from (general, project or external fields). The tag has no effect on
//! substitution.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::fields::FieldId;

pub const TOKEN_TAGS: [&str; 3] = ["GEN", "PRJ", "EXT"];

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:GEN|PRJ|EXT):\{\{([0-9]+)\}\}").unwrap());

/// A token occurrence; `start..end` is a byte range into the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMatch {
    pub start: usize,
    pub end: usize,
    pub field_id: FieldId,
}

/// Tokens in `text`, left to right. An id of zero, or one too large for a
/// [`FieldId`], is not a token and stays as literal text.
pub fn find_tokens(text: &str) -> impl Iterator<Item = TokenMatch> + '_ {
    TOKEN_RE.captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        let field_id: FieldId = caps.get(1)?.as_str().parse().ok()?;
        if field_id == 0 {
            return None;
        }
        Some(TokenMatch {
            start: whole.start(),
            end: whole.end(),
            field_id,
        })
    })
}

pub fn contains_token(text: &str) -> bool {
    find_tokens(text).next().is_some()
}

/// The token that makes up all of `text`, if any.
pub fn whole_token(text: &str) -> Option<TokenMatch> {
    find_tokens(text)
        .next()
        .filter(|token| token.start == 0 && token.end == text.len())
}

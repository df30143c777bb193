//! Placeholder substitution: splices rendered field values into a host
//! document.
//!
//! Flow: split host into lines → rewrite lines that contain tokens → emit.
//!
//! Lines without tokens are never rebuilt: their ops come out as the exact
//! op objects that went in. Only ops that feed a rewritten line, or whose
//! newline is removed, are split into pieces.

use tracing::{debug, warn};

use crate::document::op::line_attributes;
use crate::document::{Insert, Op};
use crate::fields::{render, FieldCatalog, FieldId, FieldType, FieldValue};
use crate::substitution::lines::{split_lines, Line, Piece};
use crate::substitution::queue::{Resolution, ResolutionQueue};
use crate::substitution::splice::{
    ends_with_newline, is_block_fragment, is_line_open, resolve_joins, trim_outer_newlines,
};
use crate::substitution::tokens::find_tokens;

/// What happens to a line's terminating newline on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Break {
    Keep,
    /// Removed; the text on either side is joined (see `resolve_joins`).
    Join,
    /// Removed; the fragment on this line already ends it.
    Drop,
}

#[derive(Debug)]
struct LinePlan {
    /// Replacement inline content; `None` keeps the line as it was.
    body: Option<Vec<Op>>,
    terminator: Break,
}

impl LinePlan {
    fn untouched() -> Self {
        LinePlan {
            body: None,
            terminator: Break::Keep,
        }
    }
}

/// Replaces every placeholder token in `host` with the rendered value of its
/// field. See [`Substitutor::process`].
pub fn process(
    host: &[Op],
    values: impl IntoIterator<Item = (FieldId, FieldValue)>,
    catalog: &FieldCatalog,
) -> Vec<Op> {
    Substitutor::new(catalog).process(host, values)
}

/// Substitution against one project's field catalog. Holds no per-run state;
/// each `process` call builds its own resolution queue.
#[derive(Debug, Clone, Copy)]
pub struct Substitutor<'a> {
    catalog: &'a FieldCatalog,
}

impl<'a> Substitutor<'a> {
    pub fn new(catalog: &'a FieldCatalog) -> Self {
        Substitutor { catalog }
    }

    /// Scans `host` left to right. Each token takes the value supplied under
    /// its id, or else the next unused value in supply order, or renders
    /// empty once the values run out.
    pub fn process(
        &self,
        host: &[Op],
        values: impl IntoIterator<Item = (FieldId, FieldValue)>,
    ) -> Vec<Op> {
        let mut queue = ResolutionQueue::new(values);
        let lines = split_lines(host);
        let mut plans: Vec<LinePlan> = lines.iter().map(|_| LinePlan::untouched()).collect();

        for index in 0..lines.len() {
            if lines[index].has_token() {
                self.rewrite_line(host, &lines, index, &mut plans, &mut queue);
            }
        }

        if queue.remaining() > 0 {
            debug!("{} supplied field values were not used", queue.remaining());
        }
        emit(host, &lines, &plans)
    }

    fn rewrite_line(
        &self,
        host: &[Op],
        lines: &[Line],
        index: usize,
        plans: &mut [LinePlan],
        queue: &mut ResolutionQueue,
    ) {
        let line = &lines[index];
        let host_line_attrs = line_attributes(line.break_attributes(host));
        let sole = line.sole_token().is_some();
        let previous_break_is_plain = index
            .checked_sub(1)
            .and_then(|prev| lines[prev].terminator)
            .is_some_and(|source| !host[source].has_line_attributes());
        let can_collapse = sole
            && previous_break_is_plain
            && line.terminator.is_some()
            && host_line_attrs.is_none();
        // A collapse on the line above leaves that line open into this one.
        let continues_joined_line = index
            .checked_sub(1)
            .is_some_and(|prev| plans[prev].terminator == Break::Join);

        let mut body: Vec<Op> = Vec::new();
        let mut terminator = Break::Keep;

        for (position, piece) in line.pieces.iter().enumerate() {
            let source_op = &host[piece.source()];
            let text = match piece {
                Piece::Opaque { .. } => {
                    body.push(source_op.clone());
                    continue;
                }
                Piece::Text { text, .. } => text,
            };

            let mut cursor = 0;
            for token in find_tokens(text) {
                push_text(&mut body, &text[cursor..token.start], source_op);
                cursor = token.end;
                let rest_is_blank = text[cursor..].is_empty() && line.is_blank_after(position);

                let (field_type, fragment) = self.render_token(token.field_id, queue);

                if can_collapse && field_type.is_inline() {
                    body.extend(trim_outer_newlines(fragment));
                    terminator = Break::Join;
                    plans[index - 1].terminator = Break::Join;
                    continue;
                }
                if fragment.is_empty() {
                    continue;
                }

                if is_block_fragment(&fragment) {
                    if is_line_open(&body) {
                        body.push(Op::text_with("\n", host_line_attrs.clone()));
                    } else if continues_joined_line && !body.iter().any(Op::has_content) {
                        body.push(Op::text("\n"));
                    }
                    let closes_line = ends_with_newline(&fragment);
                    body.extend(fragment);
                    if closes_line && rest_is_blank && line.terminator.is_some() {
                        terminator = Break::Drop;
                    }
                } else if host_line_attrs.is_some() {
                    body.extend(trim_outer_newlines(fragment));
                } else {
                    body.extend(fragment);
                }
            }
            push_text(&mut body, &text[cursor..], source_op);
        }

        plans[index] = LinePlan {
            body: Some(body),
            terminator,
        };
    }

    fn render_token(&self, token_id: FieldId, queue: &mut ResolutionQueue) -> (FieldType, Vec<Op>) {
        let (field_id, value) = match queue.resolve(token_id) {
            Resolution::Exact(value) => (token_id, Some(value)),
            Resolution::Fallback { field_id, value } => (field_id, Some(value)),
            Resolution::Exhausted => {
                warn!("no value left for field {token_id}; rendering it empty");
                (token_id, None)
            }
        };
        let field_type = self.catalog.field_type(field_id);
        let fragment = render(
            value.as_ref(),
            &field_type,
            self.catalog.definition(field_id),
        );
        (field_type, fragment)
    }
}

/// Untouched text around a token keeps the attributes of the op it came from.
fn push_text(body: &mut Vec<Op>, text: &str, source_op: &Op) {
    if !text.is_empty() {
        body.push(piece_op(text, source_op));
    }
}

fn piece_op(text: &str, source_op: &Op) -> Op {
    Op {
        insert: Some(Insert::Text(text.to_string())),
        attributes: source_op.attributes.clone(),
        extra: source_op.extra.clone(),
    }
}

/// Writes the plans out. Ops that no rewritten line touches are emitted once,
/// whole, at their first piece.
fn emit(host: &[Op], lines: &[Line], plans: &[LinePlan]) -> Vec<Op> {
    let mut split = vec![false; host.len()];
    for (line, plan) in lines.iter().zip(plans) {
        if plan.body.is_some() {
            for piece in &line.pieces {
                split[piece.source()] = true;
            }
        }
        if plan.body.is_some() || plan.terminator != Break::Keep {
            if let Some(source) = line.terminator {
                split[source] = true;
            }
        }
    }

    let mut emitted = vec![false; host.len()];
    let mut out = Vec::with_capacity(host.len());
    let mut joins = Vec::new();
    let mut emit_whole = |source: usize, out: &mut Vec<Op>| {
        if !emitted[source] {
            emitted[source] = true;
            out.push(host[source].clone());
        }
    };

    for (line, plan) in lines.iter().zip(plans) {
        match &plan.body {
            Some(body) => out.extend(body.iter().cloned()),
            None => {
                for piece in &line.pieces {
                    let source = piece.source();
                    match piece {
                        Piece::Text { text, .. } if split[source] => {
                            push_text(&mut out, text, &host[source]);
                        }
                        _ => emit_whole(source, &mut out),
                    }
                }
            }
        }

        let Some(source) = line.terminator else {
            continue;
        };
        match plan.terminator {
            Break::Keep if split[source] => out.push(piece_op("\n", &host[source])),
            Break::Keep => emit_whole(source, &mut out),
            Break::Join => joins.push(out.len()),
            Break::Drop => {}
        }
    }

    resolve_joins(&mut out, joins);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{parse_ops, plain_text};
    use serde_json::{json, Value};

    fn ops(value: Value) -> Vec<Op> {
        serde_json::from_value(value).unwrap()
    }

    fn rich(text: &str) -> FieldValue {
        FieldValue::rich_text(json!({"ops": [{"insert": text}]}).to_string())
    }

    fn string_field(id: FieldId) -> FieldCatalog {
        FieldCatalog::new().with_type(id, "string")
    }

    // ── pass-through ────────────────────────────────────────────────────────

    #[test]
    fn test_document_without_tokens_is_unchanged() {
        let host = ops(json!([
            {"insert": "Title\n", "attributes": {"header": 1}},
            {"insert": "Body with "},
            {"insert": "bold", "attributes": {"bold": true}},
            {"insert": {"image": "diagram.png"}},
            {"insert": "\n"},
            {"insert": "item"},
            {"insert": "\n", "attributes": {"list": "bullet"}},
            {"retain": 4},
            {"insert": "tail\n\n"}
        ]));
        assert_eq!(process(&host, Vec::new(), &FieldCatalog::new()), host);
    }

    #[test]
    fn test_untouched_ops_keep_their_layout() {
        let host = ops(json!([
            {"insert": "Keep\nthis\n"},
            {"insert": "Name: GEN:{{1}}\n"}
        ]));
        let out = process(&host, [(1, FieldValue::scalar("Ada"))], &string_field(1));
        assert_eq!(out[0], host[0]);
        assert_eq!(plain_text(&out), "Keep\nthis\nName: Ada\n");
    }

    #[test]
    fn test_embed_on_token_line_passes_through() {
        let host = ops(json!([
            {"insert": "See GEN:{{1}} "},
            {"insert": {"image": "chart.png"}},
            {"insert": "\n"}
        ]));
        let out = process(&host, [(1, FieldValue::scalar("this"))], &string_field(1));
        assert_eq!(plain_text(&out), "See this \n");
        assert!(out.iter().any(|op| op.is_embed()));
    }

    // ── inline placement ────────────────────────────────────────────────────

    #[test]
    fn test_inline_field_on_own_line_collapses() {
        let host = parse_ops(r#"{"ops":[{"insert":"Write a\nGEN:{{1}}\nfunction"}]}"#);
        let out = process(&host, [(1, FieldValue::scalar("sorting"))], &string_field(1));
        let text = plain_text(&out);
        assert_eq!(text, "Write a sorting function");
        assert!(!text.contains('\n'));
    }

    #[test]
    fn test_collapse_across_separate_ops() {
        let host = ops(json!([
            {"insert": "Write a\n"},
            {"insert": "GEN:{{1}}\n"},
            {"insert": "function"}
        ]));
        let out = process(&host, [(1, FieldValue::scalar("sorting"))], &string_field(1));
        assert_eq!(plain_text(&out), "Write a sorting function");
        assert_eq!(out[0], Op::text("Write a"));
        assert_eq!(out.last(), host.last());
    }

    #[test]
    fn test_collapse_does_not_double_existing_spaces() {
        let host = parse_ops(r#"{"ops":[{"insert":"Write a \nGEN:{{1}}\n function"}]}"#);
        let out = process(&host, [(1, FieldValue::scalar("sorting"))], &string_field(1));
        assert_eq!(plain_text(&out), "Write a sorting function");
    }

    #[test]
    fn test_collapse_with_missing_value_leaves_single_space() {
        let host = parse_ops(r#"{"ops":[{"insert":"Write a\nGEN:{{1}}\nfunction"}]}"#);
        let out = process(&host, Vec::new(), &string_field(1));
        assert_eq!(plain_text(&out), "Write a function");
    }

    #[test]
    fn test_inline_field_within_text_is_substituted_in_place() {
        let host = ops(json!([{"insert": "Write a GEN:{{1}} function\n"}]));
        let out = process(&host, [(1, FieldValue::scalar("sorting"))], &string_field(1));
        assert_eq!(plain_text(&out), "Write a sorting function\n");
    }

    #[test]
    fn test_inline_field_on_first_line_keeps_break() {
        let host = ops(json!([{"insert": "GEN:{{1}}\nrest"}]));
        let out = process(&host, [(1, FieldValue::scalar("sorting"))], &string_field(1));
        assert_eq!(plain_text(&out), "sorting\nrest");
    }

    #[test]
    fn test_inline_field_in_list_item_does_not_collapse() {
        let host = ops(json!([
            {"insert": "Intro\n"},
            {"insert": "GEN:{{1}}"},
            {"insert": "\n", "attributes": {"list": "bullet"}}
        ]));
        let out = process(&host, [(1, FieldValue::scalar("x"))], &string_field(1));
        assert_eq!(plain_text(&out), "Intro\nx\n");
        assert_eq!(out[0], host[0]);
        assert!(out.last().unwrap().has_attribute("list"));
    }

    #[test]
    fn test_surrounding_text_keeps_inline_attributes() {
        let host = ops(json!([
            {"insert": "Hi GEN:{{1}} there", "attributes": {"bold": true}}
        ]));
        let out = process(&host, [(1, FieldValue::scalar("Ada"))], &string_field(1));
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], Op::text_attr("Hi ", "bold", true));
        assert_eq!(out[1], Op::text("Ada"));
        assert_eq!(out[2], Op::text_attr(" there", "bold", true));
    }

    // ── block placement ─────────────────────────────────────────────────────

    #[test]
    fn test_block_field_keeps_surrounding_newlines() {
        let host = ops(json!([{"insert": "Intro\nGEN:{{2}}\nOutro"}]));
        let out = process(&host, [(2, rich("Para\n"))], &FieldCatalog::new());
        assert_eq!(plain_text(&out), "Intro\nPara\n\nOutro");
    }

    #[test]
    fn test_list_line_keeps_single_attributed_break() {
        let host = ops(json!([
            {"insert": "URL: GEN:{{1}}"},
            {"insert": "\n", "attributes": {"list": "ordered"}}
        ]));
        let out = process(&host, [(1, rich("https://example.com\n"))], &FieldCatalog::new());
        let text = plain_text(&out);
        assert_eq!(text.matches('\n').count(), 1);
        assert_eq!(text.trim_end(), "URL: https://example.com");
        let newline = out.iter().find(|op| op.as_text() == Some("\n")).unwrap();
        assert_eq!(newline.attributes.as_ref().unwrap()["list"], json!("ordered"));
    }

    #[test]
    fn test_header_line_with_combined_break() {
        let host = ops(json!([
            {"insert": "GEN:{{1}}\n", "attributes": {"header": 1}}
        ]));
        let out = process(&host, [(1, rich("\nTitle\n"))], &FieldCatalog::new());
        assert_eq!(plain_text(&out), "Title\n");
        assert!(out.last().unwrap().has_attribute("header"));
    }

    #[test]
    fn test_bullet_fragment_in_ordered_line_keeps_own_attributes() {
        let host = ops(json!([
            {"insert": "Items: GEN:{{3}}"},
            {"insert": "\n", "attributes": {"list": "ordered"}}
        ]));
        let catalog = FieldCatalog::new().with_type(3, "multi-select");
        let out = process(&host, [(3, FieldValue::list(["A", "B"]))], &catalog);

        assert_eq!(plain_text(&out), "Items: \nA\nB\n");
        assert_eq!(out[1], Op::text_attr("\n", "list", "ordered"));
        assert_eq!(out[2], Op::text_attr("A\n", "list", "bullet"));
        assert_eq!(out[3], Op::text_attr("B\n", "list", "bullet"));
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_newline_injected_before_bullets_after_text() {
        let host = ops(json!([{"insert": "Steps: GEN:{{2}}\nDone\n"}]));
        let catalog = FieldCatalog::new().with_type(2, "multi-select");
        let out = process(&host, [(2, FieldValue::list(["A", "B"]))], &catalog);
        assert_eq!(plain_text(&out), "Steps: \nA\nB\nDone\n");
        assert_eq!(out[1], Op::text("\n"));
    }

    #[test]
    fn test_bullets_after_collapsed_line_start_on_new_line() {
        let host = ops(json!([{"insert": "Write a\nGEN:{{1}}\nGEN:{{2}}\n"}]));
        let catalog = FieldCatalog::new()
            .with_type(1, "string")
            .with_type(2, "multi-select");
        let values = [
            (1, FieldValue::scalar("sorting")),
            (2, FieldValue::list(["A", "B"])),
        ];
        let out = process(&host, values, &catalog);

        assert_eq!(plain_text(&out), "Write a sorting\nA\nB\n");
        let first_bullet = out.iter().position(|op| op.has_attribute("list")).unwrap();
        assert_eq!(out[first_bullet], Op::text_attr("A\n", "list", "bullet"));
        assert_eq!(out[first_bullet - 1], Op::text("\n"));
    }

    #[test]
    fn test_bullets_followed_by_text_keep_host_break() {
        let host = ops(json!([{"insert": "GEN:{{2}}then more\n"}]));
        let catalog = FieldCatalog::new().with_type(2, "multi-select");
        let out = process(&host, [(2, FieldValue::list(["A"]))], &catalog);
        assert_eq!(plain_text(&out), "A\nthen more\n");
    }

    #[test]
    fn test_labelled_block_field() {
        let host = ops(json!([{"insert": "GEN:{{4}}\n"}]));
        let catalog = FieldCatalog::new()
            .with_type(4, "multi-select")
            .with_definition(4, crate::fields::FieldDefinition::labelled("Constraints"));
        let out = process(&host, [(4, FieldValue::list(["Short"]))], &catalog);
        assert_eq!(out[0], Op::text_attr("Constraints\n", "header", 2));
        assert_eq!(plain_text(&out), "Constraints\nShort\n");
    }

    // ── resolution ──────────────────────────────────────────────────────────

    #[test]
    fn test_unknown_id_falls_back_by_position() {
        let host = ops(json!([{"insert": "GEN:{{99}}"}]));
        let values = [(
            5,
            FieldValue::rich_text(r#"{"ops":[{"insert":"fallback value"}]}"#),
        )];
        let out = process(&host, values, &FieldCatalog::new());
        assert!(plain_text(&out).contains("fallback value"));
    }

    #[test]
    fn test_fallback_uses_type_of_consumed_field() {
        let host = ops(json!([{"insert": "Use GEN:{{99}} now"}]));
        let catalog = FieldCatalog::new().with_type(5, "string");
        let out = process(&host, [(5, FieldValue::scalar("  tabs  "))], &catalog);
        assert_eq!(plain_text(&out), "Use tabs now");
    }

    #[test]
    fn test_duplicate_token_takes_next_value() {
        let host = ops(json!([{"insert": "GEN:{{1}} and PRJ:{{1}}"}]));
        let catalog = FieldCatalog::new().with_type(1, "string").with_type(2, "string");
        let values = [(1, FieldValue::scalar("x")), (2, FieldValue::scalar("y"))];
        assert_eq!(plain_text(&process(&host, values, &catalog)), "x and y");
    }

    #[test]
    fn test_exhausted_values_render_empty() {
        let host = ops(json!([{"insert": "Hello EXT:{{1}}!"}]));
        let out = process(&host, Vec::new(), &string_field(1));
        assert_eq!(plain_text(&out), "Hello !");
    }

    #[test]
    fn test_malformed_rich_text_is_inserted_literally() {
        let host = ops(json!([{"insert": "Note: GEN:{{1}}"}]));
        let out = process(&host, [(1, FieldValue::scalar("{not json"))], &FieldCatalog::new());
        assert_eq!(plain_text(&out), "Note: {not json");
    }

    #[test]
    fn test_select_invert_inline_in_sentence() {
        let host = ops(json!([{"insert": "Prefer GEN:{{7}}.\n"}]));
        let definition = crate::fields::FieldDefinition {
            field_type: Some(FieldType::SelectInvert),
            field_options: vec![
                crate::fields::FieldOption::new("tabs", "Tabs"),
                crate::fields::FieldOption::new("spaces", "Spaces"),
            ],
            content: Some(json!(" over ")),
            ..Default::default()
        };
        let catalog = FieldCatalog::new().with_definition(7, definition);
        let out = process(&host, [(7, FieldValue::scalar("tabs"))], &catalog);
        assert_eq!(plain_text(&out), "Prefer tabs over Spaces.\n");
    }
}

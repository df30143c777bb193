// Document codec: the delta-style rich-text model shared by the renderer and
// the substitutor. Pure functions only.

pub mod codec;
pub mod op;

pub use codec::{
    analyze, collapse_blank_runs, extract_plain_text, parse_ops, plain_text, serialize_ops,
    try_parse_ops, DocumentShape,
};
pub use op::{Attributes, Document, Insert, Op, LINE_ATTRIBUTES};

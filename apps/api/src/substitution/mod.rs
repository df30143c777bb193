// Placeholder substitution engine.
// Scans a host document for field tokens, resolves values through a per-call
// queue, and splices rendered fragments in while keeping line formatting.

pub mod lines;
pub mod queue;
pub mod splice;
pub mod substitutor;
pub mod tokens;

pub use queue::{Resolution, ResolutionQueue};
pub use substitutor::{process, Substitutor};
pub use tokens::{find_tokens, TokenMatch, TOKEN_TAGS};

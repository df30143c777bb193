use tracing::debug;

use crate::fields::{FieldId, FieldValue};

/// Outcome of resolving one placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The value supplied under the token's own id.
    Exact(FieldValue),
    /// The next unused value, supplied under a different id.
    Fallback { field_id: FieldId, value: FieldValue },
    /// Every supplied value has been used.
    Exhausted,
}

/// Field values for one substitution run. Each value is handed out at most
/// once: by exact id when possible, otherwise in supply order.
#[derive(Debug, Default)]
pub struct ResolutionQueue {
    entries: Vec<Option<(FieldId, FieldValue)>>,
}

impl ResolutionQueue {
    pub fn new(values: impl IntoIterator<Item = (FieldId, FieldValue)>) -> Self {
        ResolutionQueue {
            entries: values.into_iter().map(Some).collect(),
        }
    }

    pub fn resolve(&mut self, field_id: FieldId) -> Resolution {
        let exact = self
            .entries
            .iter()
            .position(|entry| matches!(entry, Some((id, _)) if *id == field_id));
        if let Some((_, value)) = exact.and_then(|i| self.entries[i].take()) {
            return Resolution::Exact(value);
        }

        match self.entries.iter_mut().find_map(Option::take) {
            Some((id, value)) => {
                debug!("field {field_id} has no unused value; using field {id} by position");
                Resolution::Fallback {
                    field_id: id,
                    value,
                }
            }
            None => Resolution::Exhausted,
        }
    }

    pub fn remaining(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }
}

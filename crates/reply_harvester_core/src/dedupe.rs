use std::collections::HashSet;

use crate::record::PostRecord;

/// Admits each post identifier once; first seen wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityDeduplicator {
    seen: HashSet<String>,
}

impl IdentityDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time an identifier is offered, `false` afterwards.
    pub fn admit(&mut self, record: &PostRecord) -> bool {
        if record.identifier.is_empty() {
            return false;
        }
        if self.seen.contains(&record.identifier) {
            return false;
        }
        self.seen.insert(record.identifier.clone())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.seen.contains(identifier)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

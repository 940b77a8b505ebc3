//! Identity-keyed visit map

use graft_model::{ObjectRef, Value};
use std::collections::HashMap;

/// Source object to transformed counterpart, keyed by node identity
///
/// Created per top-level call. Keys are held alive so an address is never
/// reused while the map exists, and domain equality never participates.
#[derive(Debug, Default)]
pub struct AdjacencyMap {
    entries: HashMap<usize, (ObjectRef, Value)>,
}

impl AdjacencyMap {
    /// Create an empty map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counterpart recorded for `source`
    #[must_use]
    pub fn get(&self, source: &ObjectRef) -> Option<&Value> {
        self.entries.get(&source.addr()).map(|(_, target)| target)
    }

    /// Check whether `source` was visited
    #[must_use]
    pub fn contains(&self, source: &ObjectRef) -> bool {
        self.entries.contains_key(&source.addr())
    }

    /// Record a counterpart, replacing any earlier one
    pub fn insert(&mut self, source: &ObjectRef, target: Value) {
        self.entries.insert(source.addr(), (source.clone(), target));
    }

    /// Number of visited objects
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check for an empty map
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

use std::collections::HashMap;

use super::Coordinates;

/// Process-lifetime memo of every geocoding query issued in one run.
///
/// An entry of `None` records a query the service could not resolve, so a
/// repeat miss never goes back to the network. Entries are never evicted;
/// growth is bounded by the number of distinct queries in a single pass.
/// The cache is owned by the caller and handed into the pipeline, never a
/// process-wide global.
#[derive(Debug, Default)]
pub struct GeocodeCache {
    entries: HashMap<String, Option<Coordinates>>,
}

impl GeocodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outer `Option`: was this query ever attempted. Inner: resolved
    /// coordinates, or the cached-unresolved marker.
    pub fn get(&self, query: &str) -> Option<Option<Coordinates>> {
        self.entries.get(query).copied()
    }

    pub fn put(&mut self, query: impl Into<String>, outcome: Option<Coordinates>) {
        self.entries.insert(query.into(), outcome);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

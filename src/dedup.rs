use crate::hashing::Fingerprint;
use std::collections::HashSet;

/// Exact-duplicate detection for one batch.
#[derive(Debug, Default, Clone)]
pub struct DuplicateFilter {
    seen: HashSet<Fingerprint>,
}

impl DuplicateFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_duplicate(&self, fingerprint: &Fingerprint) -> bool {
        self.seen.contains(fingerprint)
    }

    /// Returns `false` when the fingerprint was already recorded.
    pub fn record(&mut self, fingerprint: Fingerprint) -> bool {
        self.seen.insert(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

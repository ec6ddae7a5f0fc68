use std::collections::HashSet;

use crate::mood::Keyed;

/// Ids already emitted during one top-level request.
///
/// Shared by every scene of the request so no track is emitted twice.
/// Only the assembler records ids, and only for tracks it actually emits.
/// Later runs drop already-emitted candidates before mood selection so the
/// stage decision counts only tracks that can still be emitted.
#[derive(Debug, Clone, Default)]
pub struct DedupTracker {
    seen: HashSet<String>,
}

impl DedupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id`; returns false if it was emitted before
    pub fn admit(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.to_string())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Drop candidates emitted by an earlier run; returns how many were dropped
    pub fn retain_unseen<T: Keyed<Key = str>>(&self, candidates: &mut Vec<T>) -> usize {
        let before = candidates.len();
        candidates.retain(|c| !self.seen.contains(c.key()));
        before - candidates.len()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item(String);

    impl Keyed for Item {
        type Key = str;

        fn key(&self) -> &str {
            &self.0
        }
    }

    #[test]
    fn test_admit_once() {
        let mut tracker = DedupTracker::new();
        assert!(tracker.admit("T1"));
        assert!(!tracker.admit("T1"));
        assert!(tracker.admit("T2"));
        assert!(tracker.contains("T1"));
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_retain_unseen_keeps_order() {
        let mut tracker = DedupTracker::new();
        tracker.admit("b");
        tracker.admit("d");

        let mut items: Vec<Item> = ["a", "b", "c", "d"].iter().map(|s| Item(s.to_string())).collect();
        let dropped = tracker.retain_unseen(&mut items);

        assert_eq!(dropped, 2);
        let left: Vec<&str> = items.iter().map(|i| i.0.as_str()).collect();
        assert_eq!(left, vec!["a", "c"]);
    }
}

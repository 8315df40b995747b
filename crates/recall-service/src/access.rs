//! Access-count bookkeeping.
//!
//! Counts how often each record id is returned by a search. Counts are
//! informational only; ranking never reads them. They live for the lifetime
//! of the tracker and are not persisted. Once `max_tracked` distinct ids are
//! held, ids seen for the first time are no longer counted; existing counts
//! keep accumulating until [`AccessTracker::clear`].

use dashmap::DashMap;
use tracing::debug;

/// Distinct ids a tracker holds before it stops admitting new ones
pub const DEFAULT_MAX_TRACKED: usize = 100_000;

#[derive(Debug)]
pub struct AccessTracker {
    counts: DashMap<String, u64>,
    max_tracked: usize,
}

impl Default for AccessTracker {
    fn default() -> Self {
        Self::with_max_tracked(DEFAULT_MAX_TRACKED)
    }
}

impl AccessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_tracked(max_tracked: usize) -> Self {
        Self {
            counts: DashMap::new(),
            max_tracked,
        }
    }

    /// Record one access for each id.
    ///
    /// The limit is checked without a global lock, so concurrent callers can
    /// overshoot it by a few entries.
    pub fn record_access<'a>(&self, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            if let Some(mut count) = self.counts.get_mut(id) {
                *count += 1;
            } else if self.counts.len() < self.max_tracked {
                *self.counts.entry(id.to_string()).or_insert(0) += 1;
            } else {
                debug!(id, max_tracked = self.max_tracked, "Access tracker full");
            }
        }
    }

    pub fn access_count(&self, id: &str) -> u64 {
        self.counts.get(id).map(|count| *count).unwrap_or(0)
    }

    /// Number of distinct ids currently counted.
    pub fn tracked(&self) -> usize {
        self.counts.len()
    }

    pub fn max_tracked(&self) -> usize {
        self.max_tracked
    }

    pub fn clear(&self) {
        self.counts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_accumulate() {
        let tracker = AccessTracker::new();
        tracker.record_access(["a", "b"]);
        tracker.record_access(["a"]);

        assert_eq!(tracker.access_count("a"), 2);
        assert_eq!(tracker.access_count("b"), 1);
        assert_eq!(tracker.access_count("c"), 0);
        assert_eq!(tracker.tracked(), 2);
        assert_eq!(tracker.max_tracked(), DEFAULT_MAX_TRACKED);

        tracker.clear();
        assert_eq!(tracker.access_count("a"), 0);
    }

    #[test]
    fn test_full_tracker_stops_admitting_new_ids() {
        let tracker = AccessTracker::with_max_tracked(2);
        tracker.record_access(["a", "b", "c"]);
        tracker.record_access(["a", "d"]);

        assert_eq!(tracker.tracked(), 2);
        assert_eq!(tracker.access_count("a"), 2);
        assert_eq!(tracker.access_count("b"), 1);
        assert_eq!(tracker.access_count("c"), 0);
        assert_eq!(tracker.access_count("d"), 0);

        tracker.clear();
        tracker.record_access(["c"]);
        assert_eq!(tracker.access_count("c"), 1);
    }
}

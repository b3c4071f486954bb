//! Per-domain bookkeeping: submission timestamps and active-job entries.

use std::time::{Duration, Instant};

use crate::domain::DomainTag;

/// Sliding window of submission timestamps for one domain tag.
///
/// Entries are pruned lazily on write against the long retention horizon;
/// correctness of admission decisions depends only on `recent_count`, which
/// filters by the rate window regardless of what is still stored.
#[derive(Debug, Default)]
pub(super) struct DomainWindow {
    submissions: Vec<Instant>,
}

impl DomainWindow {
    /// Submissions younger than `window` as of `now`.
    pub(super) fn recent_count(&self, now: Instant, window: Duration) -> usize {
        self.submissions
            .iter()
            .filter(|t| now.duration_since(**t) < window)
            .count()
    }

    /// Record a submission at `now`, dropping entries older than `retention`.
    pub(super) fn record(&mut self, now: Instant, retention: Duration) {
        self.submissions
            .retain(|t| now.duration_since(*t) < retention);
        self.submissions.push(now);
    }
}

/// One dispatched, not-yet-terminal job.
#[derive(Debug)]
pub(super) struct ActiveEntry {
    pub(super) domain: DomainTag,
    pub(super) started_at: Instant,
}

//! Action log — rolling record of dispatch times for one device.
//!
//! Exists only to feed the hourly rate-limit check. Entries are appended on
//! successful dispatches and pruned lazily; anything older than 60 minutes
//! never counts.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// The trailing window the rate limit counts over.
const WINDOW_MINUTES: i64 = 60;

/// Rolling log of successful dispatch timestamps for a single device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionLog {
    entries: Vec<Timestamp>,
}

impl ActionLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dispatch timestamp, pruning stale entries on the way.
    pub fn record(&mut self, now: Timestamp) {
        self.prune(now);
        self.entries.push(now);
    }

    /// Count entries within the trailing 60 minutes.
    #[must_use]
    pub fn count_last_hour(&self, now: Timestamp) -> usize {
        let cutoff = now - Duration::minutes(WINDOW_MINUTES);
        self.entries.iter().filter(|ts| **ts > cutoff).count()
    }

    /// Drop entries older than the rate-limit window.
    pub fn prune(&mut self, now: Timestamp) {
        let cutoff = now - Duration::minutes(WINDOW_MINUTES);
        self.entries.retain(|ts| *ts > cutoff);
    }

    /// Total retained entries (stale ones included until the next prune).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log holds no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Time and timestamp helpers.

use chrono::{DateTime, Timelike, Utc};

/// UTC timestamp used for expiry deadlines, action-log entries, event times, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Extract the hour-of-day (0–23) from a timestamp.
#[must_use]
pub fn hour_of(ts: Timestamp) -> u8 {
    u8::try_from(ts.hour()).unwrap_or(0)
}

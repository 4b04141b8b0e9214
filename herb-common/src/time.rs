//! Timestamp utilities
//!
//! Timestamps are persisted as integer milliseconds since the Unix epoch so
//! that batch windows can be compared with plain `BETWEEN` in SQL.

use chrono::{DateTime, TimeZone, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time as epoch milliseconds
pub fn now_millis() -> i64 {
    to_millis(&now())
}

/// Convert a timestamp to epoch milliseconds for storage
pub fn to_millis(timestamp: &DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}

/// Convert stored epoch milliseconds back to a timestamp
///
/// Out-of-range values clamp to the Unix epoch.
pub fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

//! Timestamp type used throughout the gate.
//!
//! Timestamps are Unix epoch seconds (UTC). All TTL and window arithmetic is
//! done in seconds; the ISO-8601 form only appears at the persistence and
//! diagnostic boundaries.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_secs();
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// Whether this timestamp + duration has passed relative to `now`.
    pub fn has_expired(&self, duration_secs: u64, now: Timestamp) -> bool {
        now.0 >= self.0.saturating_add(duration_secs)
    }

    /// Whether this timestamp lies within the trailing `window_secs` of `now`.
    pub fn within_window(&self, window_secs: u64, now: Timestamp) -> bool {
        self.elapsed_since(now) < window_secs
    }

    /// ISO-8601 (RFC 3339) representation, second precision, UTC.
    pub fn to_rfc3339(&self) -> String {
        let dt: DateTime<Utc> = Utc
            .timestamp_opt(self.0 as i64, 0)
            .single()
            .unwrap_or_default();
        dt.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Parse an ISO-8601 timestamp. Sub-second precision is truncated.
    /// Returns `None` for unparseable input or pre-epoch times.
    pub fn from_rfc3339(s: &str) -> Option<Self> {
        let dt = DateTime::parse_from_rfc3339(s).ok()?;
        let secs = dt.timestamp();
        if secs < 0 {
            return None;
        }
        Some(Self(secs as u64))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_boundary_is_inclusive() {
        let issued = Timestamp::new(1000);
        assert!(!issued.has_expired(900, Timestamp::new(1899)));
        assert!(issued.has_expired(900, Timestamp::new(1900)));
    }

    #[test]
    fn window_boundary_is_exclusive() {
        let written = Timestamp::new(1000);
        assert!(written.within_window(30, Timestamp::new(1029)));
        assert!(!written.within_window(30, Timestamp::new(1030)));
    }

    #[test]
    fn elapsed_saturates_for_future_timestamps() {
        let future = Timestamp::new(2000);
        assert_eq!(future.elapsed_since(Timestamp::new(1000)), 0);
    }

    #[test]
    fn rfc3339_round_trip() {
        let ts = Timestamp::new(1_700_000_000);
        let s = ts.to_rfc3339();
        assert_eq!(Timestamp::from_rfc3339(&s), Some(ts));
    }

    #[test]
    fn rfc3339_rejects_garbage() {
        assert_eq!(Timestamp::from_rfc3339("not a time"), None);
        assert_eq!(Timestamp::from_rfc3339(""), None);
    }
}

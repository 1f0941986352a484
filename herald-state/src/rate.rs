//! Daily send counters
//!
//! One [`RateState`] exists per calendar day. Rollover at the day boundary
//! is a pure function of the stored date and the current date, evaluated
//! whenever the state is read — never a background timer — so behavior is
//! deterministic and testable without sleeping.
//!
//! Counters are only ever incremented through [`RateState::record`], after a
//! transport call has succeeded. Denied checks and failed sends consume no
//! budget.

use ahash::AHashMap;
use chrono::{DateTime, NaiveDate, Utc};
use herald_common::Domain;
use serde::{Deserialize, Serialize};

/// Send counters for a single calendar day.
///
/// On-disk format (rewritten atomically after every recorded send):
///
/// ```json
/// {
///   "date": "2026-08-06",
///   "total_sent": 12,
///   "domain_counts": { "example.org": 3 },
///   "last_send": "2026-08-06T09:14:02Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateState {
    /// The calendar day these counters belong to.
    pub date: NaiveDate,

    /// Total sends recorded today.
    pub total_sent: u32,

    /// Sends recorded today, per recipient domain.
    #[serde(default)]
    pub domain_counts: AHashMap<Domain, u32>,

    /// Timestamp of the most recent recorded send, for the cooldown clock.
    #[serde(default)]
    pub last_send: Option<DateTime<Utc>>,
}

impl RateState {
    /// Fresh counters for the given day.
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_sent: 0,
            domain_counts: AHashMap::new(),
            last_send: None,
        }
    }

    /// Roll the state over to `today`.
    ///
    /// Returns `self` unchanged when the stored date matches, or fresh
    /// counters when the day has advanced. This is the only rollover path;
    /// callers evaluate it at read time.
    #[must_use]
    pub fn for_day(self, today: NaiveDate) -> Self {
        if self.date == today {
            self
        } else {
            Self::empty(today)
        }
    }

    /// Sends recorded today for one domain.
    #[must_use]
    pub fn sent_to(&self, domain: &Domain) -> u32 {
        self.domain_counts.get(domain).copied().unwrap_or(0)
    }

    /// Record one successful send: bump the daily total, bump the domain
    /// counter, stamp the cooldown clock.
    pub fn record(&mut self, domain: Domain, now: DateTime<Utc>) {
        self.total_sent += 1;
        *self.domain_counts.entry(domain).or_insert(0) += 1;
        self.last_send = Some(now);
    }

    /// Seconds elapsed since the last recorded send, if any.
    #[must_use]
    pub fn seconds_since_last_send(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_send.map(|last| (now - last).num_seconds())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_record_increments_counters() {
        let mut state = RateState::empty(day("2026-08-06"));
        state.record(Domain::new("example.org"), at("2026-08-06T09:00:00Z"));
        state.record(Domain::new("example.org"), at("2026-08-06T09:01:00Z"));
        state.record(Domain::new("other.net"), at("2026-08-06T09:02:00Z"));

        assert_eq!(state.total_sent, 3);
        assert_eq!(state.sent_to(&Domain::new("example.org")), 2);
        assert_eq!(state.sent_to(&Domain::new("other.net")), 1);
        assert_eq!(state.last_send, Some(at("2026-08-06T09:02:00Z")));
    }

    #[test]
    fn test_rollover_is_pure_read_time_function() {
        let mut state = RateState::empty(day("2026-08-05"));
        state.record(Domain::new("example.org"), at("2026-08-05T23:59:00Z"));

        // Same day: unchanged.
        let same = state.clone().for_day(day("2026-08-05"));
        assert_eq!(same.total_sent, 1);

        // Next day: counters reset, cooldown clock cleared.
        let rolled = state.for_day(day("2026-08-06"));
        assert_eq!(rolled.total_sent, 0);
        assert!(rolled.domain_counts.is_empty());
        assert_eq!(rolled.last_send, None);
    }

    #[test]
    fn test_seconds_since_last_send() {
        let mut state = RateState::empty(day("2026-08-06"));
        assert_eq!(state.seconds_since_last_send(at("2026-08-06T09:00:00Z")), None);

        state.record(Domain::new("example.org"), at("2026-08-06T09:00:00Z"));
        assert_eq!(
            state.seconds_since_last_send(at("2026-08-06T09:00:45Z")),
            Some(45)
        );
    }

    #[test]
    fn test_serde_matches_wire_format() {
        let mut state = RateState::empty(day("2026-08-06"));
        state.record(Domain::new("example.org"), at("2026-08-06T09:14:02Z"));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["date"], "2026-08-06");
        assert_eq!(json["total_sent"], 1);
        assert_eq!(json["domain_counts"]["example.org"], 1);

        let back: RateState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}

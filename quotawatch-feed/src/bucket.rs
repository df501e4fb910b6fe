//! Fixed-window traffic aggregation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quotawatch_types::Outcome;

use crate::flatten::FlatEvent;

/// Admission counts for one fixed time window.
///
/// `start` is the window's inclusive lower edge, aligned to the
/// granularity the bucket was built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficBucket {
    pub start: DateTime<Utc>,
    pub allowed: u64,
    pub blocked: u64,
}

impl TrafficBucket {
    fn new(start: DateTime<Utc>) -> Self {
        Self {
            start,
            allowed: 0,
            blocked: 0,
        }
    }

    fn count(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Allowed => self.allowed += 1,
            Outcome::Blocked => self.blocked += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.allowed + self.blocked
    }
}

/// Group events into fixed windows of the given granularity.
///
/// An event lands in the window whose start is its timestamp truncated to
/// a multiple of the granularity. Buckets appear in the order their first
/// event does, and windows no event falls into are simply absent; callers
/// that want a gap-free axis fill it at render time. Sub-second
/// granularities are treated as one second.
pub fn bucket_events(events: &[FlatEvent], granularity: Duration) -> Vec<TrafficBucket> {
    let step = (granularity.as_secs().max(1)) as i64;
    let mut buckets: Vec<TrafficBucket> = Vec::new();

    for event in events {
        let start_secs = event.timestamp.timestamp().div_euclid(step) * step;
        let start = match DateTime::from_timestamp(start_secs, 0) {
            Some(start) => start,
            // Truncation left chrono's representable range; nothing
            // sensible to count the event under.
            None => continue,
        };

        let index = match buckets.iter().position(|bucket| bucket.start == start) {
            Some(index) => index,
            None => {
                buckets.push(TrafficBucket::new(start));
                buckets.len() - 1
            }
        };
        buckets[index].count(event.outcome);
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn event(secs: i64, outcome: Outcome) -> FlatEvent {
        FlatEvent {
            timestamp: ts(secs),
            user_id: "alice".to_string(),
            endpoint: "/chat".to_string(),
            outcome,
        }
    }

    #[test]
    fn events_in_the_same_minute_share_a_bucket() {
        let events = vec![event(5, Outcome::Allowed), event(35, Outcome::Blocked)];

        let buckets = bucket_events(&events, Duration::from_secs(60));

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].start, ts(0));
        assert_eq!(buckets[0].allowed, 1);
        assert_eq!(buckets[0].blocked, 1);
        assert_eq!(buckets[0].total(), 2);
    }

    #[test]
    fn events_straddling_a_boundary_split() {
        let events = vec![event(59, Outcome::Allowed), event(60, Outcome::Allowed)];

        let buckets = bucket_events(&events, Duration::from_secs(60));

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].start, ts(0));
        assert_eq!(buckets[1].start, ts(60));
        assert_eq!(buckets[0].allowed, 1);
        assert_eq!(buckets[1].allowed, 1);
    }

    #[test]
    fn buckets_follow_first_occurrence_order() {
        // Deliberately unsorted input: the bucket order tracks the events,
        // not the clock.
        let events = vec![
            event(70, Outcome::Allowed),
            event(10, Outcome::Blocked),
            event(75, Outcome::Allowed),
        ];

        let buckets = bucket_events(&events, Duration::from_secs(60));

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].start, ts(60));
        assert_eq!(buckets[0].allowed, 2);
        assert_eq!(buckets[1].start, ts(0));
        assert_eq!(buckets[1].blocked, 1);
    }

    #[test]
    fn quiet_windows_are_omitted() {
        let events = vec![event(0, Outcome::Allowed), event(600, Outcome::Allowed)];

        let buckets = bucket_events(&events, Duration::from_secs(60));

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].start, ts(0));
        assert_eq!(buckets[1].start, ts(600));
    }

    #[test]
    fn no_events_means_no_buckets() {
        assert!(bucket_events(&[], Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn counts_split_by_outcome() {
        let events = vec![
            event(1, Outcome::Allowed),
            event(2, Outcome::Allowed),
            event(3, Outcome::Blocked),
            event(4, Outcome::Allowed),
        ];

        let buckets = bucket_events(&events, Duration::from_secs(300));

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].allowed, 3);
        assert_eq!(buckets[0].blocked, 1);
    }

    #[test]
    fn zero_granularity_rounds_up_to_one_second() {
        let events = vec![event(3, Outcome::Allowed), event(4, Outcome::Allowed)];

        let buckets = bucket_events(&events, Duration::ZERO);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].start, ts(3));
        assert_eq!(buckets[1].start, ts(4));
    }

    #[test]
    fn buckets_serialize_with_rfc3339_starts() {
        // The dashboard export writes buckets straight to JSON; the window
        // start must stay a readable timestamp, not an epoch integer.
        let events = vec![event(65, Outcome::Allowed)];
        let buckets = bucket_events(&events, Duration::from_secs(60));

        let json = serde_json::to_value(&buckets).unwrap();
        assert_eq!(json[0]["start"], "1970-01-01T00:01:00Z");
        assert_eq!(json[0]["allowed"], 1);
        assert_eq!(json[0]["blocked"], 0);
    }
}

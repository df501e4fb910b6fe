//! Flattening nested request history into a single timeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quotawatch_types::{LogRecord, Outcome, UserStatus};

/// One admission decision lifted out of a snapshot, carrying the user it
/// belonged to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatEvent {
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub endpoint: String,
    pub outcome: Outcome,
}

/// Merge every user's recent-request history into one timeline, oldest
/// first.
///
/// The sort is stable: events with equal timestamps keep the order they
/// appear in the snapshot, user by user and record by record. The input is
/// untouched, and the same snapshot always flattens to the same timeline.
pub fn flatten(snapshot: &[UserStatus]) -> Vec<FlatEvent> {
    let mut events: Vec<FlatEvent> = snapshot
        .iter()
        .flat_map(|user| {
            user.last_requests.iter().map(|record| FlatEvent {
                timestamp: record.timestamp,
                user_id: user.user_id.clone(),
                endpoint: record.endpoint.clone(),
                outcome: record.ai_allowed,
            })
        })
        .collect();
    events.sort_by_key(|event| event.timestamp);
    events
}

/// Lift request-log records into the same timeline shape, oldest first.
///
/// The log endpoint serves newest-first; reordering here lets log-derived
/// and history-derived events feed the same aggregations.
pub fn events_from_logs(logs: &[LogRecord]) -> Vec<FlatEvent> {
    let mut events: Vec<FlatEvent> = logs
        .iter()
        .map(|record| FlatEvent {
            timestamp: record.timestamp,
            user_id: record.user_id.clone(),
            endpoint: record.endpoint.clone(),
            outcome: record.allowed,
        })
        .collect();
    events.sort_by_key(|event| event.timestamp);
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    use quotawatch_types::RequestRecord;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn record(secs: i64, endpoint: &str, outcome: Outcome) -> RequestRecord {
        RequestRecord {
            timestamp: ts(secs),
            endpoint: endpoint.to_string(),
            ai_allowed: outcome,
        }
    }

    fn user(user_id: &str, history: Vec<RequestRecord>) -> UserStatus {
        UserStatus {
            user_id: user_id.to_string(),
            requests: history.len() as u64,
            ai_allowed: Outcome::Allowed,
            ttl_seconds: 60,
            last_requests: history,
        }
    }

    #[test]
    fn merges_histories_in_timestamp_order() {
        let snapshot = vec![
            user(
                "alice",
                vec![
                    record(30, "/chat", Outcome::Allowed),
                    record(10, "/chat", Outcome::Blocked),
                ],
            ),
            user("bob", vec![record(20, "/search", Outcome::Allowed)]),
        ];

        let events = flatten(&snapshot);

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].timestamp, ts(10));
        assert_eq!(events[0].user_id, "alice");
        assert_eq!(events[0].outcome, Outcome::Blocked);
        assert_eq!(events[1].timestamp, ts(20));
        assert_eq!(events[1].user_id, "bob");
        assert_eq!(events[1].endpoint, "/search");
        assert_eq!(events[2].timestamp, ts(30));
        assert_eq!(events[2].user_id, "alice");
    }

    #[test]
    fn equal_timestamps_keep_snapshot_order() {
        let snapshot = vec![
            user("alice", vec![record(50, "/a", Outcome::Allowed)]),
            user("bob", vec![record(50, "/b", Outcome::Allowed)]),
        ];

        let events = flatten(&snapshot);

        assert_eq!(events[0].user_id, "alice");
        assert_eq!(events[1].user_id, "bob");
    }

    #[test]
    fn users_without_history_contribute_nothing() {
        let snapshot = vec![
            user("alice", Vec::new()),
            user("bob", vec![record(5, "/chat", Outcome::Allowed)]),
        ];

        let events = flatten(&snapshot);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].user_id, "bob");
    }

    #[test]
    fn empty_snapshot_flattens_to_nothing() {
        assert!(flatten(&[]).is_empty());
    }

    #[test]
    fn flatten_is_deterministic() {
        let snapshot = vec![
            user(
                "alice",
                vec![
                    record(7, "/chat", Outcome::Allowed),
                    record(7, "/chat", Outcome::Blocked),
                ],
            ),
            user("bob", vec![record(7, "/search", Outcome::Allowed)]),
        ];

        assert_eq!(flatten(&snapshot), flatten(&snapshot));
    }

    #[test]
    fn log_records_sort_oldest_first() {
        let logs = vec![
            LogRecord {
                timestamp: ts(40),
                user_id: "alice".to_string(),
                endpoint: "/chat".to_string(),
                allowed: Outcome::Blocked,
            },
            LogRecord {
                timestamp: ts(20),
                user_id: "bob".to_string(),
                endpoint: "/chat".to_string(),
                allowed: Outcome::Allowed,
            },
            LogRecord {
                timestamp: ts(10),
                user_id: "alice".to_string(),
                endpoint: "/search".to_string(),
                allowed: Outcome::Allowed,
            },
        ];

        let events = events_from_logs(&logs);

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].timestamp, ts(10));
        assert_eq!(events[1].timestamp, ts(20));
        assert_eq!(events[2].timestamp, ts(40));
        assert_eq!(events[2].outcome, Outcome::Blocked);
    }
}

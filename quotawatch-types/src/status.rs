//! Per-user quota state as reported by `GET /admin/rate-status`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::outcome::{self, Outcome};

/// All monitored users as of one successful poll, in the order the admin
/// API returned them. Replaced wholesale on every poll; never merged.
pub type StatusSnapshot = Vec<UserStatus>;

/// One monitored user's current quota state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStatus {
    /// Opaque user identifier, unique within a snapshot.
    pub user_id: String,

    /// Requests counted in the current rate window.
    pub requests: u64,

    /// The limiter's current decision for this user. This is point-in-time
    /// state, distinct from the historical outcomes in `last_requests`.
    #[serde(with = "outcome::bool_repr")]
    pub ai_allowed: Outcome,

    /// Seconds until the rate window resets. The upstream reports keys
    /// without an expiry as a negative value; read through [`Self::ttl`]
    /// to get a clamped duration.
    pub ttl_seconds: i64,

    /// Recent request history for this user, bounded upstream. Order within
    /// the list is not guaranteed; consumers sort by timestamp.
    #[serde(default)]
    pub last_requests: Vec<RequestRecord>,
}

impl UserStatus {
    /// Time until the user's rate window resets, clamped to zero for keys
    /// the upstream reports without an expiry.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds.max(0) as u64)
    }
}

/// One request from a user's recent history. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// When the request was made.
    pub timestamp: DateTime<Utc>,

    /// The endpoint the request targeted.
    pub endpoint: String,

    /// Whether this particular request was admitted.
    #[serde(with = "outcome::bool_repr")]
    pub ai_allowed: Outcome,
}

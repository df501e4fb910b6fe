//! Snapshot-wide rollup of admission state.

use serde::{Deserialize, Serialize};

use quotawatch_types::{Outcome, UserStatus};

/// Headline numbers for one status snapshot.
///
/// The allowed/blocked split covers every user exactly once, so
/// `allowed_users + blocked_users == total_users` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSummary {
    pub total_users: usize,
    pub allowed_users: usize,
    pub blocked_users: usize,
    /// Request counts per user, in snapshot order.
    pub per_user: Vec<UserRequests>,
}

/// One user's window request count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRequests {
    pub user_id: String,
    pub requests: u64,
}

/// Reduce a status snapshot to its headline numbers.
///
/// Users are classified by their current decision field alone; whatever
/// their recent history holds does not move the counts.
pub fn summarize(snapshot: &[UserStatus]) -> QuotaSummary {
    let mut allowed_users = 0;
    let mut blocked_users = 0;
    let mut per_user = Vec::with_capacity(snapshot.len());

    for user in snapshot {
        match user.ai_allowed {
            Outcome::Allowed => allowed_users += 1,
            Outcome::Blocked => blocked_users += 1,
        }
        per_user.push(UserRequests {
            user_id: user.user_id.clone(),
            requests: user.requests,
        });
    }

    QuotaSummary {
        total_users: snapshot.len(),
        allowed_users,
        blocked_users,
        per_user,
    }
}

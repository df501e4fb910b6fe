//! Per-user display state.
//!
//! The gateway's admission decision is authoritative; the dashboard only
//! adds a warning tier for users approaching the request ceiling so they
//! stand out before they get cut off.

use quotawatch_types::{Outcome, UserStatus};

/// Display thresholds for the users table.
#[derive(Debug, Clone)]
pub struct Thresholds {
    /// Request count at which an allowed user is shown as near the limit.
    pub request_warning: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        // The gateway ships with a ceiling of 10 requests per window.
        Self { request_warning: 8 }
    }
}

/// How a user should be presented in the dashboard.
///
/// Ordered so that sorting descending puts blocked users first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UserHealth {
    Healthy,
    NearLimit,
    Blocked,
}

impl UserHealth {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            UserHealth::Healthy => "OK",
            UserHealth::NearLimit => "NEAR",
            UserHealth::Blocked => "BLOCKED",
        }
    }
}

/// Classify a user for display.
///
/// A blocked decision always wins; the warning tier only applies to users
/// the gateway still admits.
pub fn classify(user: &UserStatus, thresholds: &Thresholds) -> UserHealth {
    if user.ai_allowed == Outcome::Blocked {
        return UserHealth::Blocked;
    }
    if user.requests >= thresholds.request_warning {
        UserHealth::NearLimit
    } else {
        UserHealth::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(requests: u64, outcome: Outcome) -> UserStatus {
        UserStatus {
            user_id: "alice".to_string(),
            requests,
            ai_allowed: outcome,
            ttl_seconds: 60,
            last_requests: Vec::new(),
        }
    }

    #[test]
    fn allowed_user_below_warning_is_healthy() {
        let health = classify(&user(3, Outcome::Allowed), &Thresholds::default());
        assert_eq!(health, UserHealth::Healthy);
    }

    #[test]
    fn allowed_user_at_warning_is_near_limit() {
        let health = classify(&user(8, Outcome::Allowed), &Thresholds::default());
        assert_eq!(health, UserHealth::NearLimit);
    }

    #[test]
    fn blocked_decision_wins_over_request_count() {
        // Low count but already blocked: the decision is what matters.
        let health = classify(&user(1, Outcome::Blocked), &Thresholds::default());
        assert_eq!(health, UserHealth::Blocked);
    }

    #[test]
    fn ordering_puts_blocked_last() {
        assert!(UserHealth::Healthy < UserHealth::NearLimit);
        assert!(UserHealth::NearLimit < UserHealth::Blocked);
    }
}

//! Per-user request trends across snapshots.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use quotawatch_types::UserStatus;

/// Maximum number of historical snapshots to keep.
const MAX_HISTORY_SIZE: usize = 60;

/// Tracks request counts over time for sparklines and rate estimates.
///
/// A user's `requests` field counts inside the limiter's sliding window,
/// so it rises while they are active and falls back when the window rolls
/// over. Sparklines therefore show the raw counts, not deltas.
#[derive(Debug, Clone)]
pub struct TrendHistory {
    /// Historical request counts per user (user_id -> readings).
    pub user_requests: HashMap<String, VecDeque<u64>>,
    /// Historical total request counts across all users.
    pub totals: VecDeque<u64>,
    /// Timestamps of snapshots for rate calculations.
    pub timestamps: VecDeque<Instant>,
}

impl Default for TrendHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl TrendHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            user_requests: HashMap::new(),
            totals: VecDeque::new(),
            timestamps: VecDeque::new(),
        }
    }

    /// Record a new status snapshot
    pub fn record(&mut self, snapshot: &[UserStatus]) {
        for user in snapshot {
            let readings = self.user_requests.entry(user.user_id.clone()).or_default();
            readings.push_back(user.requests);
            if readings.len() > MAX_HISTORY_SIZE {
                readings.pop_front();
            }
        }

        let total: u64 = snapshot.iter().map(|user| user.requests).sum();
        self.totals.push_back(total);
        if self.totals.len() > MAX_HISTORY_SIZE {
            self.totals.pop_front();
        }

        self.timestamps.push_back(Instant::now());
        if self.timestamps.len() > MAX_HISTORY_SIZE {
            self.timestamps.pop_front();
        }
    }

    /// Get sparkline data for a user's request counts (normalized to 0-7
    /// for 8 bar levels).
    ///
    /// Returns an empty Vec if there's not enough history.
    pub fn requests_sparkline(&self, user_id: &str) -> Vec<u8> {
        Self::normalize_sparkline(self.user_requests.get(user_id))
    }

    /// Get sparkline data for the total request count across all users.
    pub fn total_sparkline(&self) -> Vec<u8> {
        Self::normalize_sparkline(Some(&self.totals))
    }

    /// Normalize raw counts to 0-7 range for sparkline display.
    fn normalize_sparkline(data: Option<&VecDeque<u64>>) -> Vec<u8> {
        let Some(values) = data else {
            return Vec::new();
        };

        if values.len() < 2 {
            return Vec::new();
        }

        let max = values.iter().copied().max().unwrap_or(1).max(1);

        values
            .iter()
            .map(|&v| {
                let normalized = (v as f64 / max as f64 * 7.0) as u8;
                normalized.min(7)
            })
            .collect()
    }

    /// Estimated requests per second for a user, from the last two
    /// readings.
    ///
    /// Window rollovers make the count drop; a drop reads as a zero rate
    /// rather than negative traffic. Returns None without enough history.
    pub fn request_rate(&self, user_id: &str) -> Option<f64> {
        let readings = self.user_requests.get(user_id)?;
        if readings.len() < 2 || self.timestamps.len() < 2 {
            return None;
        }

        let current = *readings.back()?;
        let previous = *readings.get(readings.len() - 2)?;
        let delta = (current as i64 - previous as i64).max(0);

        let current_time = self.timestamps.back()?;
        let previous_time = self.timestamps.get(self.timestamps.len() - 2)?;
        let elapsed = current_time.duration_since(*previous_time).as_secs_f64();

        if elapsed > 0.0 {
            Some(delta as f64 / elapsed)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use quotawatch_types::Outcome;

    fn snapshot(users: Vec<(&str, u64)>) -> Vec<UserStatus> {
        users
            .into_iter()
            .map(|(user_id, requests)| UserStatus {
                user_id: user_id.to_string(),
                requests,
                ai_allowed: Outcome::Allowed,
                ttl_seconds: 60,
                last_requests: Vec::new(),
            })
            .collect()
    }

    #[test]
    fn new_history_is_empty() {
        let h = TrendHistory::new();
        assert!(h.user_requests.is_empty());
        assert!(h.totals.is_empty());
        assert!(h.timestamps.is_empty());
    }

    #[test]
    fn record_stores_user_readings() {
        let mut h = TrendHistory::new();

        h.record(&snapshot(vec![("alice", 5), ("bob", 2)]));

        assert!(h.user_requests.contains_key("alice"));
        assert!(h.user_requests.contains_key("bob"));
        assert_eq!(h.user_requests.get("alice").unwrap().len(), 1);
        assert_eq!(h.totals.back(), Some(&7));
    }

    #[test]
    fn record_accumulates_history() {
        let mut h = TrendHistory::new();

        for i in 0..5 {
            h.record(&snapshot(vec![("alice", i)]));
        }

        assert_eq!(h.user_requests.get("alice").unwrap().len(), 5);
        assert_eq!(h.timestamps.len(), 5);
    }

    #[test]
    fn history_caps_at_max_size() {
        let mut h = TrendHistory::new();

        for i in 0..70 {
            h.record(&snapshot(vec![("alice", i)]));
        }

        assert_eq!(h.user_requests.get("alice").unwrap().len(), 60);
        assert_eq!(h.totals.len(), 60);
        assert_eq!(h.timestamps.len(), 60);
    }

    #[test]
    fn sparkline_empty_for_unknown_user() {
        let h = TrendHistory::new();
        assert!(h.requests_sparkline("unknown").is_empty());
    }

    #[test]
    fn sparkline_empty_with_single_reading() {
        let mut h = TrendHistory::new();
        h.record(&snapshot(vec![("alice", 5)]));

        // Need at least 2 readings
        assert!(h.requests_sparkline("alice").is_empty());
    }

    #[test]
    fn sparkline_scales_peak_to_top_level() {
        let mut h = TrendHistory::new();

        for count in [0, 3, 6, 9] {
            h.record(&snapshot(vec![("alice", count)]));
        }

        let sparkline = h.requests_sparkline("alice");
        assert_eq!(sparkline.len(), 4);
        assert_eq!(*sparkline.first().unwrap(), 0);
        assert_eq!(*sparkline.last().unwrap(), 7);
    }

    #[test]
    fn sparkline_survives_window_rollover() {
        let mut h = TrendHistory::new();

        // Count climbs and then resets with the window.
        for count in [2, 5, 9, 1] {
            h.record(&snapshot(vec![("alice", count)]));
        }

        let sparkline = h.requests_sparkline("alice");
        assert_eq!(sparkline.len(), 4);
        assert!(sparkline[3] < sparkline[2]);
    }

    #[test]
    fn total_sparkline_tracks_the_whole_gateway() {
        let mut h = TrendHistory::new();

        h.record(&snapshot(vec![("alice", 1), ("bob", 1)]));
        h.record(&snapshot(vec![("alice", 5), ("bob", 9)]));

        let sparkline = h.total_sparkline();
        assert_eq!(sparkline.len(), 2);
        assert!(sparkline[0] < sparkline[1]);
        assert_eq!(sparkline[1], 7);
    }

    #[test]
    fn rate_none_for_unknown_user() {
        let h = TrendHistory::new();
        assert!(h.request_rate("unknown").is_none());
    }

    #[test]
    fn rate_none_with_single_reading() {
        let mut h = TrendHistory::new();
        h.record(&snapshot(vec![("alice", 5)]));

        assert!(h.request_rate("alice").is_none());
    }

    #[test]
    fn rate_calculated_from_last_two_readings() {
        let mut h = TrendHistory::new();

        h.record(&snapshot(vec![("alice", 5)]));

        // Small delay to ensure non-zero elapsed time
        std::thread::sleep(std::time::Duration::from_millis(10));

        h.record(&snapshot(vec![("alice", 8)]));

        let rate = h.request_rate("alice");
        assert!(rate.is_some());
        assert!(rate.unwrap() > 0.0);
    }

    #[test]
    fn rate_reads_zero_across_window_rollover() {
        let mut h = TrendHistory::new();

        h.record(&snapshot(vec![("alice", 9)]));
        std::thread::sleep(std::time::Duration::from_millis(10));
        h.record(&snapshot(vec![("alice", 1)]));

        assert_eq!(h.request_rate("alice"), Some(0.0));
    }

    #[test]
    fn default_is_same_as_new() {
        let h1 = TrendHistory::new();
        let h2 = TrendHistory::default();

        assert_eq!(h1.user_requests.len(), h2.user_requests.len());
        assert_eq!(h1.timestamps.len(), h2.timestamps.len());
    }
}

//! Application state and navigation logic.

use std::time::{Duration, Instant};

use anyhow::Result;

use quotawatch_feed::{
    bucket_events, events_from_logs, flatten, summarize, FlatEvent, LiveFeed, QuotaSummary,
    TrafficBucket,
};
use quotawatch_types::{LogSnapshot, StatusSnapshot, UserStatus};

use crate::data::{Thresholds, TrendHistory};
use crate::ui::overview::SortColumn;
use crate::ui::Theme;

/// Bucket widths the Traffic view cycles through with the `g` key.
const GRANULARITY_STEPS: [Duration; 5] = [
    Duration::from_secs(10),
    Duration::from_secs(30),
    Duration::from_secs(60),
    Duration::from_secs(300),
    Duration::from_secs(900),
];

/// The current view/tab in the TUI.
///
/// User detail is shown as an overlay (controlled by
/// `App::show_detail_overlay`) rather than as a separate view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Every user in the limiter's window, with admission state.
    Overview,
    /// Allowed/blocked request volume in fixed time buckets.
    Traffic,
    /// The gateway's recent request log, newest first.
    Activity,
}

impl View {
    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Overview => View::Traffic,
            View::Traffic => View::Activity,
            View::Activity => View::Overview,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        match self {
            View::Overview => View::Activity,
            View::Traffic => View::Overview,
            View::Activity => View::Traffic,
        }
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Overview => "Users",
            View::Traffic => "Traffic",
            View::Activity => "Activity",
        }
    }
}

/// Everything the views render, derived from the latest snapshots.
///
/// Rebuilt wholesale whenever the feed delivers an update; the UI never
/// reads half-updated state.
#[derive(Debug, Clone)]
pub struct DashboardData {
    /// Status snapshot in server order.
    pub users: StatusSnapshot,
    /// Headline numbers reduced from `users`.
    pub summary: QuotaSummary,
    /// Per-user histories flattened into one timeline, oldest first.
    pub events: Vec<FlatEvent>,
    /// `events` grouped into fixed windows at the current granularity.
    pub buckets: Vec<TrafficBucket>,
    /// Request log as served, newest first.
    pub logs: LogSnapshot,
    pub last_updated: Instant,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,
    pub show_detail_overlay: bool,

    // Data feed
    feed: LiveFeed,
    source: String,
    pub data: Option<DashboardData>,
    pub history: TrendHistory,
    pub load_error: Option<String>,
    pub thresholds: Thresholds,
    pub granularity: Duration,

    // Navigation state
    pub selected_user_index: usize,
    pub selected_bucket_index: usize,
    pub selected_log_index: usize,

    // Sorting (Users view)
    pub sort_column: SortColumn,
    pub sort_ascending: bool,

    // Search/filter
    pub filter_text: String,
    pub filter_active: bool,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App around a running feed.
    ///
    /// `source` is the gateway URL, shown in the status bar while
    /// connecting and in error states.
    pub fn new(feed: LiveFeed, source: String, thresholds: Thresholds, granularity: Duration) -> Self {
        Self {
            running: true,
            current_view: View::Overview,
            show_help: false,
            show_detail_overlay: false,
            feed,
            source,
            data: None,
            history: TrendHistory::new(),
            load_error: None,
            thresholds,
            granularity,
            selected_user_index: 0,
            selected_bucket_index: 0,
            selected_log_index: 0,
            sort_column: SortColumn::default(),
            sort_ascending: true,
            filter_text: String::new(),
            filter_active: false,
            theme: Theme::auto_detect(),
            status_message: None,
        }
    }

    /// Returns a description of the gateway being watched.
    pub fn source_description(&self) -> &str {
        &self.source
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Fold pending feed updates into the dashboard state.
    ///
    /// Returns true if anything arrived (data or a poll error) and the
    /// screen should redraw.
    pub fn refresh(&mut self) -> bool {
        let processed = self.feed.pump();
        if processed == 0 {
            return false;
        }

        self.load_error = self
            .feed
            .status_error()
            .map(|err| err.to_string())
            .or_else(|| self.feed.log_error().map(|err| err.to_string()));

        if self.feed.status().is_some() {
            self.rebuild();
        }
        true
    }

    /// Recompute every derived structure from the feed's latest snapshots.
    fn rebuild(&mut self) {
        let Some(users) = self.feed.status().cloned() else {
            return;
        };
        let logs = self.feed.logs().cloned().unwrap_or_default();

        // Keep the Traffic view pinned to the newest bucket unless the
        // user has scrolled back.
        let was_at_tail = match self.data.as_ref() {
            Some(data) => self.selected_bucket_index + 1 >= data.buckets.len(),
            None => true,
        };

        self.history.record(&users);

        let events = flatten(&users);
        let buckets = bucket_events(&events, self.granularity);
        let summary = summarize(&users);

        let data = DashboardData {
            users,
            summary,
            events,
            buckets,
            logs,
            last_updated: Instant::now(),
        };

        // Clamp selection indices to the new data
        self.selected_user_index = self
            .selected_user_index
            .min(self.filtered_user_count(&data).saturating_sub(1));
        self.selected_log_index = self
            .selected_log_index
            .min(self.filtered_log_count(&data).saturating_sub(1));
        self.selected_bucket_index = if was_at_tail {
            data.buckets.len().saturating_sub(1)
        } else {
            self.selected_bucket_index.min(data.buckets.len().saturating_sub(1))
        };

        self.data = Some(data);
    }

    /// Switch the Traffic view to the next bucket width.
    pub fn cycle_granularity(&mut self) {
        let next = match GRANULARITY_STEPS.iter().position(|g| *g == self.granularity) {
            Some(index) => GRANULARITY_STEPS[(index + 1) % GRANULARITY_STEPS.len()],
            None => GRANULARITY_STEPS[0],
        };
        self.granularity = next;

        if let Some(ref mut data) = self.data {
            data.buckets = bucket_events(&data.events, self.granularity);
            self.selected_bucket_index = data.buckets.len().saturating_sub(1);
        }

        let label = crate::data::duration::format_duration(self.granularity);
        self.set_status_message(format!("Bucket width: {}", label));
    }

    /// Switch to the next view (cycles through Users → Traffic → Activity).
    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        let Some(ref data) = self.data else {
            return;
        };
        match self.current_view {
            View::Overview => {
                let max = self.filtered_user_count(data).saturating_sub(1);
                self.selected_user_index = (self.selected_user_index + n).min(max);
            }
            View::Traffic => {
                let max = data.buckets.len().saturating_sub(1);
                self.selected_bucket_index = (self.selected_bucket_index + n).min(max);
            }
            View::Activity => {
                let max = self.filtered_log_count(data).saturating_sub(1);
                self.selected_log_index = (self.selected_log_index + n).min(max);
            }
        }
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        match self.current_view {
            View::Overview => {
                self.selected_user_index = self.selected_user_index.saturating_sub(n);
            }
            View::Traffic => {
                self.selected_bucket_index = self.selected_bucket_index.saturating_sub(n);
            }
            View::Activity => {
                self.selected_log_index = self.selected_log_index.saturating_sub(n);
            }
        }
    }

    /// Jump to the first item in the list.
    pub fn select_first(&mut self) {
        match self.current_view {
            View::Overview => self.selected_user_index = 0,
            View::Traffic => self.selected_bucket_index = 0,
            View::Activity => self.selected_log_index = 0,
        }
    }

    /// Jump to the last item in the list.
    pub fn select_last(&mut self) {
        let Some(ref data) = self.data else {
            return;
        };
        match self.current_view {
            View::Overview => {
                self.selected_user_index = self.filtered_user_count(data).saturating_sub(1);
            }
            View::Traffic => {
                self.selected_bucket_index = data.buckets.len().saturating_sub(1);
            }
            View::Activity => {
                self.selected_log_index = self.filtered_log_count(data).saturating_sub(1);
            }
        }
    }

    /// Get count of users after applying the filter.
    fn filtered_user_count(&self, data: &DashboardData) -> usize {
        if self.filter_text.is_empty() {
            return data.users.len();
        }
        data.users.iter().filter(|u| self.matches_filter(&u.user_id)).count()
    }

    /// Get count of log records after applying the filter.
    fn filtered_log_count(&self, data: &DashboardData) -> usize {
        if self.filter_text.is_empty() {
            return data.logs.len();
        }
        data.logs
            .iter()
            .filter(|r| self.matches_filter(&r.user_id) || self.matches_filter(&r.endpoint))
            .count()
    }

    /// Get the actual user index from the visual index (after
    /// sorting/filtering).
    ///
    /// The Users view applies sorting and filtering, so the visual row
    /// index differs from the index into `data.users`.
    pub fn get_selected_user_raw_index(&self) -> Option<usize> {
        let data = self.data.as_ref()?;

        match self.current_view {
            View::Overview => {
                let mut users: Vec<(usize, &UserStatus)> = data
                    .users
                    .iter()
                    .enumerate()
                    .filter(|(_, u)| self.matches_filter(&u.user_id))
                    .collect();
                crate::ui::overview::sort_users_by(
                    &mut users,
                    self.sort_column,
                    self.sort_ascending,
                    &self.thresholds,
                );

                users.get(self.selected_user_index).map(|(idx, _)| *idx)
            }
            // Traffic and Activity don't select users.
            View::Traffic | View::Activity => None,
        }
    }

    /// The user the detail overlay should describe, if any.
    pub fn selected_user(&self) -> Option<&UserStatus> {
        let index = self.get_selected_user_raw_index()?;
        self.data.as_ref()?.users.get(index)
    }

    /// Open the detail overlay for the currently selected user.
    pub fn enter_detail(&mut self) {
        if self.current_view == View::Overview && self.selected_user().is_some() {
            self.show_detail_overlay = true;
        }
    }

    /// Navigate back: close overlay first, then return to the Users view.
    pub fn go_back(&mut self) {
        if self.show_detail_overlay {
            self.show_detail_overlay = false;
            return;
        }
        if self.current_view != View::Overview {
            self.current_view = View::Overview;
        }
    }

    /// Close the detail overlay if open.
    pub fn close_overlay(&mut self) {
        self.show_detail_overlay = false;
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Cycle to the next sort column (Users view).
    pub fn cycle_sort(&mut self) {
        if self.current_view == View::Overview {
            self.sort_column = self.sort_column.next();
        }
    }

    /// Toggle sort direction between ascending and descending.
    pub fn toggle_sort_direction(&mut self) {
        if self.current_view == View::Overview {
            self.sort_ascending = !self.sort_ascending;
        }
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.filter_active = true;
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    /// Clear the filter text and exit filter mode.
    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
    }

    /// Append a character to the filter text.
    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
    }

    /// Remove the last character from the filter text.
    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
    }

    /// Check if a name matches the current filter.
    pub fn matches_filter(&self, name: &str) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        name.to_lowercase().contains(&self.filter_text.to_lowercase())
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Stop the feed. Idempotent; the UI keeps its last data.
    pub fn shutdown(&mut self) {
        self.feed.stop();
    }

    /// Export current dashboard state to a file.
    pub fn export_state(&self, path: &std::path::Path) -> Result<()> {
        use std::io::Write;

        let Some(ref data) = self.data else {
            anyhow::bail!("No data to export");
        };

        let mut export = serde_json::Map::new();

        // Summary
        let mut summary = serde_json::Map::new();
        summary.insert(
            "total_users".to_string(),
            serde_json::json!(data.summary.total_users),
        );
        summary.insert(
            "allowed_users".to_string(),
            serde_json::json!(data.summary.allowed_users),
        );
        summary.insert(
            "blocked_users".to_string(),
            serde_json::json!(data.summary.blocked_users),
        );

        let total_requests: u64 = data.users.iter().map(|u| u.requests).sum();
        summary.insert("total_requests".to_string(), serde_json::json!(total_requests));

        export.insert("summary".to_string(), serde_json::Value::Object(summary));

        // Users
        let users: Vec<serde_json::Value> = data
            .users
            .iter()
            .map(|u| {
                serde_json::json!({
                    "user_id": u.user_id,
                    "requests": u.requests,
                    "decision": u.ai_allowed.label(),
                    "ttl_seconds": u.ttl_seconds,
                })
            })
            .collect();
        export.insert("users".to_string(), serde_json::Value::Array(users));

        // Traffic buckets at the current granularity
        export.insert("traffic".to_string(), serde_json::to_value(&data.buckets)?);

        // Request log lifted into chronological events
        export.insert(
            "activity".to_string(),
            serde_json::to_value(events_from_logs(&data.logs))?,
        );

        let json = serde_json::to_string_pretty(&serde_json::Value::Object(export))?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(json.as_bytes())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::DateTime;
    use quotawatch_client::ClientError;
    use quotawatch_feed::FeedConfig;
    use quotawatch_types::{LogRecord, Outcome, RequestRecord};

    fn quiet_feed() -> LiveFeed {
        LiveFeed::start_with(
            FeedConfig::default(),
            || async { Ok::<StatusSnapshot, ClientError>(Vec::new()) },
            || async { Ok::<LogSnapshot, ClientError>(Vec::new()) },
        )
    }

    fn test_app() -> App {
        App::new(
            quiet_feed(),
            "http://localhost:8080".to_string(),
            Thresholds::default(),
            Duration::from_secs(60),
        )
    }

    fn user(user_id: &str, requests: u64, outcome: Outcome) -> UserStatus {
        UserStatus {
            user_id: user_id.to_string(),
            requests,
            ai_allowed: outcome,
            ttl_seconds: 45,
            last_requests: vec![RequestRecord {
                timestamp: DateTime::from_timestamp(30, 0).unwrap(),
                endpoint: "/chat".to_string(),
                ai_allowed: outcome,
            }],
        }
    }

    fn sample_data() -> DashboardData {
        let users = vec![
            user("alice", 5, Outcome::Allowed),
            user("bob", 9, Outcome::Allowed),
            user("carol", 12, Outcome::Blocked),
        ];
        let logs = vec![LogRecord {
            timestamp: DateTime::from_timestamp(40, 0).unwrap(),
            user_id: "carol".to_string(),
            endpoint: "/chat".to_string(),
            allowed: Outcome::Blocked,
        }];
        let events = flatten(&users);
        let buckets = bucket_events(&events, Duration::from_secs(60));
        let summary = summarize(&users);
        DashboardData {
            users,
            summary,
            events,
            buckets,
            logs,
            last_updated: Instant::now(),
        }
    }

    #[test]
    fn views_cycle_in_order() {
        assert_eq!(View::Overview.next(), View::Traffic);
        assert_eq!(View::Traffic.next(), View::Activity);
        assert_eq!(View::Activity.next(), View::Overview);

        assert_eq!(View::Overview.prev(), View::Activity);
        assert_eq!(View::Overview.label(), "Users");
    }

    #[tokio::test(start_paused = true)]
    async fn filter_matches_case_insensitive() {
        let mut app = test_app();
        app.filter_text = "ALI".to_string();

        assert!(app.matches_filter("alice"));
        assert!(!app.matches_filter("bob"));
    }

    #[tokio::test(start_paused = true)]
    async fn selection_clamps_to_filtered_users() {
        let mut app = test_app();
        app.data = Some(sample_data());
        app.filter_text = "alice".to_string();

        app.select_next_n(10);

        assert_eq!(app.selected_user_index, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn selected_user_resolves_through_sort() {
        let mut app = test_app();
        app.data = Some(sample_data());
        app.sort_column = SortColumn::Requests;
        app.sort_ascending = false;
        app.selected_user_index = 0;

        assert_eq!(app.selected_user().unwrap().user_id, "carol");
    }

    #[tokio::test(start_paused = true)]
    async fn detail_opens_only_from_overview() {
        let mut app = test_app();
        app.data = Some(sample_data());

        app.set_view(View::Traffic);
        app.enter_detail();
        assert!(!app.show_detail_overlay);

        app.set_view(View::Overview);
        app.enter_detail();
        assert!(app.show_detail_overlay);
    }

    #[tokio::test(start_paused = true)]
    async fn go_back_closes_overlay_before_changing_view() {
        let mut app = test_app();
        app.data = Some(sample_data());
        app.set_view(View::Activity);
        app.show_detail_overlay = true;

        app.go_back();
        assert!(!app.show_detail_overlay);
        assert_eq!(app.current_view, View::Activity);

        app.go_back();
        assert_eq!(app.current_view, View::Overview);
    }

    #[tokio::test(start_paused = true)]
    async fn granularity_cycles_through_presets() {
        let mut app = test_app();
        assert_eq!(app.granularity, Duration::from_secs(60));

        app.cycle_granularity();
        assert_eq!(app.granularity, Duration::from_secs(300));

        app.cycle_granularity();
        assert_eq!(app.granularity, Duration::from_secs(900));

        app.cycle_granularity();
        assert_eq!(app.granularity, Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn granularity_change_rebuilds_buckets() {
        let mut app = test_app();
        let mut data = sample_data();
        // Two events 50 seconds apart: one bucket at 1m, two at 10s.
        data.events = vec![
            FlatEvent {
                timestamp: DateTime::from_timestamp(5, 0).unwrap(),
                user_id: "alice".to_string(),
                endpoint: "/chat".to_string(),
                outcome: Outcome::Allowed,
            },
            FlatEvent {
                timestamp: DateTime::from_timestamp(55, 0).unwrap(),
                user_id: "bob".to_string(),
                endpoint: "/chat".to_string(),
                outcome: Outcome::Allowed,
            },
        ];
        data.buckets = bucket_events(&data.events, app.granularity);
        assert_eq!(data.buckets.len(), 1);
        app.data = Some(data);

        // 1m -> 5m keeps one bucket; advance to 10s and expect a split.
        app.cycle_granularity();
        app.cycle_granularity();
        app.cycle_granularity();
        assert_eq!(app.granularity, Duration::from_secs(10));
        assert_eq!(app.data.as_ref().unwrap().buckets.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn export_state_writes_dashboard_json() {
        let mut app = test_app();
        app.data = Some(sample_data());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        app.export_state(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert_eq!(value["summary"]["total_users"], 3);
        assert_eq!(value["summary"]["allowed_users"], 2);
        assert_eq!(value["summary"]["blocked_users"], 1);
        assert_eq!(value["summary"]["total_requests"], 26);
        assert!(value["users"].is_array());
        assert!(value["traffic"].is_array());
        assert_eq!(value["activity"][0]["user_id"], "carol");
    }

    #[tokio::test(start_paused = true)]
    async fn export_without_data_fails() {
        let app = test_app();
        let dir = tempfile::tempdir().unwrap();
        assert!(app.export_state(&dir.path().join("out.json")).is_err());
    }
}

//! Wiring both endpoint pollers to their snapshot stores.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::info;

use quotawatch_client::{AdminClient, ClientError};
use quotawatch_types::{LogSnapshot, StatusSnapshot};

use crate::poll::{PollUpdate, Poller};
use crate::store::SnapshotStore;

/// Poll cadence for the two admin endpoints.
///
/// The defaults match the service's own dashboard: status every ten
/// seconds, the request log every five.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub status_interval: Duration,
    pub log_interval: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            status_interval: Duration::from_secs(10),
            log_interval: Duration::from_secs(5),
        }
    }
}

/// Both endpoint feeds behind one handle.
///
/// `start` spawns one poller per endpoint; call [`pump`](Self::pump) from
/// the render loop to fold whatever has arrived into the stores, then read
/// the latest snapshots with [`status`](Self::status) and
/// [`logs`](Self::logs). Each store holds its last good snapshot across
/// fetch failures and stays `None` until the first success.
///
/// [`stop`](Self::stop) is idempotent and final: once it returns, no
/// update reaches the stores, including results already queued or still in
/// flight. Dropping the feed stops both pollers the same way.
#[derive(Debug)]
pub struct LiveFeed {
    status: SnapshotStore<StatusSnapshot>,
    logs: SnapshotStore<LogSnapshot>,
    status_rx: mpsc::Receiver<PollUpdate<StatusSnapshot>>,
    log_rx: mpsc::Receiver<PollUpdate<LogSnapshot>>,
    status_poller: Poller,
    log_poller: Poller,
    status_error: Option<ClientError>,
    log_error: Option<ClientError>,
    active: bool,
}

impl LiveFeed {
    /// Start polling both admin endpoints of the given client.
    pub fn start(client: AdminClient, config: FeedConfig) -> Self {
        let status_client = client.clone();
        let log_client = client;
        Self::start_with(
            config,
            move || {
                let client = status_client.clone();
                async move { client.rate_status().await }
            },
            move || {
                let client = log_client.clone();
                async move { client.logs().await }
            },
        )
    }

    /// Start the feed over arbitrary snapshot sources.
    ///
    /// `start` builds on this; it is public for replays and tests.
    pub fn start_with<SF, SFut, LF, LFut>(config: FeedConfig, fetch_status: SF, fetch_logs: LF) -> Self
    where
        SF: Fn() -> SFut + Send + 'static,
        SFut: Future<Output = Result<StatusSnapshot, ClientError>> + Send + 'static,
        LF: Fn() -> LFut + Send + 'static,
        LFut: Future<Output = Result<LogSnapshot, ClientError>> + Send + 'static,
    {
        let (status_tx, status_rx) = mpsc::channel(8);
        let (log_tx, log_rx) = mpsc::channel(8);

        let status_poller =
            Poller::spawn("rate-status", config.status_interval, status_tx, fetch_status);
        let log_poller = Poller::spawn("logs", config.log_interval, log_tx, fetch_logs);

        info!(
            status_interval_secs = config.status_interval.as_secs(),
            log_interval_secs = config.log_interval.as_secs(),
            "feed started"
        );

        Self {
            status: SnapshotStore::new(),
            logs: SnapshotStore::new(),
            status_rx,
            log_rx,
            status_poller,
            log_poller,
            status_error: None,
            log_error: None,
            active: true,
        }
    }

    /// Fold every pending update into the stores.
    ///
    /// Returns how many updates arrived, failures included; a nonzero
    /// return is the render loop's cue to redraw.
    pub fn pump(&mut self) -> usize {
        if !self.active {
            return 0;
        }

        let mut processed = 0;

        while let Ok(update) = self.status_rx.try_recv() {
            processed += 1;
            match update {
                PollUpdate::Snapshot { seq, value } => {
                    if self.status.apply(seq, value) {
                        self.status_error = None;
                    }
                }
                PollUpdate::Failed { seq: _, error } => {
                    self.status_error = Some(error);
                }
            }
        }

        while let Ok(update) = self.log_rx.try_recv() {
            processed += 1;
            match update {
                PollUpdate::Snapshot { seq, value } => {
                    if self.logs.apply(seq, value) {
                        self.log_error = None;
                    }
                }
                PollUpdate::Failed { seq: _, error } => {
                    self.log_error = Some(error);
                }
            }
        }

        processed
    }

    /// Latest good status snapshot, or `None` before the first success.
    pub fn status(&self) -> Option<&StatusSnapshot> {
        self.status.get()
    }

    /// Latest good request-log snapshot, or `None` before the first
    /// success.
    pub fn logs(&self) -> Option<&LogSnapshot> {
        self.logs.get()
    }

    /// The status endpoint's most recent failure, cleared by the next
    /// successful poll.
    pub fn status_error(&self) -> Option<&ClientError> {
        self.status_error.as_ref()
    }

    /// The log endpoint's most recent failure, cleared by the next
    /// successful poll.
    pub fn log_error(&self) -> Option<&ClientError> {
        self.log_error.as_ref()
    }

    /// Time since the status store last accepted a snapshot.
    pub fn status_age(&self) -> Option<Duration> {
        self.status.updated_at().map(|at| at.elapsed())
    }

    /// Time since the log store last accepted a snapshot.
    pub fn log_age(&self) -> Option<Duration> {
        self.logs.updated_at().map(|at| at.elapsed())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Stop both pollers and seal the stores.
    ///
    /// Already-queued updates are discarded, not applied. Calling this
    /// again is a no-op.
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        self.status_poller.stop();
        self.log_poller.stop();

        self.status_rx.close();
        self.log_rx.close();
        while self.status_rx.try_recv().is_ok() {}
        while self.log_rx.try_recv().is_ok() {}

        info!("feed stopped");
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use quotawatch_types::{Outcome, UserStatus};

    fn snapshot_of(user_ids: &[&str]) -> StatusSnapshot {
        user_ids
            .iter()
            .map(|user_id| UserStatus {
                user_id: user_id.to_string(),
                requests: 1,
                ai_allowed: Outcome::Allowed,
                ttl_seconds: 60,
                last_requests: Vec::new(),
            })
            .collect()
    }

    /// Advance paused time just enough to run every ready task.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    fn quiet_logs() -> impl Fn() -> std::pin::Pin<
        Box<dyn Future<Output = Result<LogSnapshot, ClientError>> + Send>,
    > + Send
           + 'static {
        || Box::pin(async { Ok(Vec::new()) })
    }

    #[tokio::test(start_paused = true)]
    async fn first_snapshots_arrive_through_pump() {
        let mut feed = LiveFeed::start_with(
            FeedConfig::default(),
            || async { Ok(snapshot_of(&["alice", "bob"])) },
            quiet_logs(),
        );

        assert!(feed.status().is_none());

        settle().await;
        assert!(feed.pump() > 0);

        let snapshot = feed.status().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].user_id, "alice");
        assert!(feed.logs().is_some());

        feed.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_poll_keeps_the_last_good_snapshot() {
        let config = FeedConfig {
            status_interval: Duration::from_secs(10),
            log_interval: Duration::from_secs(3600),
        };
        let calls = Arc::new(AtomicU64::new(0));
        let fetch_calls = calls.clone();

        let mut feed = LiveFeed::start_with(
            config,
            move || {
                let calls = fetch_calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Ok(snapshot_of(&["alice"]))
                    } else {
                        Err(ClientError::Status(500))
                    }
                }
            },
            quiet_logs(),
        );

        settle().await;
        feed.pump();
        assert_eq!(feed.status().unwrap().len(), 1);
        assert!(feed.status_error().is_none());

        // Next tick fails; the store must not move.
        tokio::time::sleep(Duration::from_secs(10)).await;
        feed.pump();
        assert_eq!(feed.status().unwrap().len(), 1);
        assert!(matches!(feed.status_error(), Some(ClientError::Status(500))));

        feed.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn error_clears_on_the_next_success() {
        let config = FeedConfig {
            status_interval: Duration::from_secs(10),
            log_interval: Duration::from_secs(3600),
        };
        let calls = Arc::new(AtomicU64::new(0));
        let fetch_calls = calls.clone();

        let mut feed = LiveFeed::start_with(
            config,
            move || {
                let calls = fetch_calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 1 {
                        Err(ClientError::Status(502))
                    } else {
                        Ok(snapshot_of(&["alice"]))
                    }
                }
            },
            quiet_logs(),
        );

        settle().await;
        feed.pump();
        tokio::time::sleep(Duration::from_secs(10)).await;
        feed.pump();
        assert!(feed.status_error().is_some());

        tokio::time::sleep(Duration::from_secs(10)).await;
        feed.pump();
        assert!(feed.status_error().is_none());

        feed.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_discards_queued_updates() {
        let mut feed = LiveFeed::start_with(
            FeedConfig::default(),
            || async { Ok(snapshot_of(&["alice"])) },
            quiet_logs(),
        );

        // Let the first results queue up without pumping them.
        settle().await;

        feed.stop();

        assert_eq!(feed.pump(), 0);
        assert!(feed.status().is_none());
        assert!(feed.logs().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let mut feed = LiveFeed::start_with(
            FeedConfig::default(),
            || async { Ok(snapshot_of(&["alice"])) },
            quiet_logs(),
        );

        feed.stop();
        feed.stop();

        assert!(!feed.is_active());
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(feed.pump(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_feed_stops_its_pollers() {
        let calls = Arc::new(AtomicU64::new(0));
        let fetch_calls = calls.clone();

        let feed = LiveFeed::start_with(
            FeedConfig::default(),
            move || {
                let calls = fetch_calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(snapshot_of(&["alice"]))
                }
            },
            quiet_logs(),
        );

        settle().await;
        drop(feed);
        settle().await;

        let after_drop = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn config_defaults_match_the_dashboard() {
        let config = FeedConfig::default();
        assert_eq!(config.status_interval, Duration::from_secs(10));
        assert_eq!(config.log_interval, Duration::from_secs(5));
    }
}

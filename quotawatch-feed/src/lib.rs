//! # quotawatch-feed
//!
//! The live aggregation feed behind the quotawatch dashboard.
//!
//! Two pollers fetch the rate limiter's admin API on independent schedules
//! and deliver each outcome over a channel; per-endpoint snapshot stores
//! keep the last good value; pure functions derive everything the charts
//! need from whatever the stores currently hold:
//!
//! ```text
//! Poller ──→ SnapshotStore ──┬──→ flatten ──→ bucket_events
//!                            └──→ summarize
//! ```
//!
//! [`LiveFeed`] ties the pieces to the dashboard's lifetime: start it
//! before the first frame, call [`LiveFeed::pump`] every UI tick to drain
//! updates, stop it on exit. Derived data (events, buckets, summaries) is
//! recomputed from the latest snapshot rather than incrementally merged;
//! the admin API offers no cursor, so a fresh snapshot is the only source
//! of truth.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quotawatch_client::AdminClient;
//! use quotawatch_feed::{bucket_events, flatten, summarize, FeedConfig, LiveFeed};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = AdminClient::builder().build();
//!     let mut feed = LiveFeed::start(client, FeedConfig::default());
//!
//!     loop {
//!         if feed.pump() > 0 {
//!             if let Some(snapshot) = feed.status() {
//!                 let summary = summarize(snapshot);
//!                 let buckets = bucket_events(&flatten(snapshot), Duration::from_secs(60));
//!                 println!("{} users, {} buckets", summary.total_users, buckets.len());
//!             }
//!         }
//!         tokio::time::sleep(Duration::from_millis(100)).await;
//!     }
//! }
//! ```

mod bucket;
mod feed;
mod flatten;
mod poll;
mod store;
mod summary;

pub use bucket::{bucket_events, TrafficBucket};
pub use feed::{FeedConfig, LiveFeed};
pub use flatten::{events_from_logs, flatten, FlatEvent};
pub use poll::{PollUpdate, Poller};
pub use store::SnapshotStore;
pub use summary::{summarize, QuotaSummary, UserRequests};

// Re-export types for convenience
pub use quotawatch_types::{LogRecord, LogSnapshot, Outcome, StatusSnapshot, UserStatus};

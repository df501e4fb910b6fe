//! Example: Driving the feed with synthetic fetches
//!
//! This example demonstrates how to run the quotawatch pipeline without a
//! live gateway by injecting fetch closures into the feed.
//!
//! This is useful when you want to:
//! - Exercise the aggregation pipeline without a server
//! - Generate predictable traffic shapes for dashboard work
//! - Replay captured snapshots from any async source
//!
//! # Usage
//!
//! ```bash
//! cargo run --example synthetic_feed
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use quotawatch_client::ClientError;
use quotawatch_feed::{
    bucket_events, flatten, summarize, FeedConfig, LiveFeed, LogRecord, Outcome, UserStatus,
};
use quotawatch_types::RequestRecord;

#[tokio::main]
async fn main() {
    println!("Synthetic feed example");
    println!("Generating admission data without a gateway...\n");

    let round = Arc::new(AtomicU64::new(0));

    // Each status fetch advances one round: alice grows slowly, bob burns
    // through his window and gets cut off.
    let status_round = round.clone();
    let fetch_status = move || {
        let round = status_round.clone();
        async move {
            let round = round.fetch_add(1, Ordering::SeqCst) + 1;
            let now = Utc::now();

            let alice = UserStatus {
                user_id: "demo-alice".to_string(),
                requests: round * 2,
                ai_allowed: Outcome::Allowed,
                ttl_seconds: 60,
                last_requests: vec![RequestRecord {
                    timestamp: now,
                    endpoint: "/v1/chat".to_string(),
                    ai_allowed: Outcome::Allowed,
                }],
            };

            let bob_blocked = round * 5 >= 10;
            let bob = UserStatus {
                user_id: "demo-bob".to_string(),
                requests: round * 5,
                ai_allowed: Outcome::from_bool(!bob_blocked),
                ttl_seconds: 45,
                last_requests: vec![RequestRecord {
                    timestamp: now,
                    endpoint: "/v1/search".to_string(),
                    ai_allowed: Outcome::from_bool(!bob_blocked),
                }],
            };

            Ok::<_, ClientError>(vec![alice, bob])
        }
    };

    let log_round = round.clone();
    let fetch_logs = move || {
        let round = log_round.clone();
        async move {
            let round = round.load(Ordering::SeqCst).max(1);
            Ok::<_, ClientError>(vec![LogRecord {
                timestamp: Utc::now(),
                user_id: "demo-bob".to_string(),
                endpoint: "/v1/search".to_string(),
                allowed: Outcome::from_bool(round * 5 < 10),
            }])
        }
    };

    let config = FeedConfig {
        status_interval: Duration::from_secs(1),
        log_interval: Duration::from_secs(2),
    };
    let mut feed = LiveFeed::start_with(config, fetch_status, fetch_logs);

    println!("Pumping the feed (press Ctrl+C to stop):\n");

    loop {
        if feed.pump() > 0 {
            if let Some(snapshot) = feed.status() {
                let summary = summarize(snapshot);
                let events = flatten(snapshot);
                let buckets = bucket_events(&events, Duration::from_secs(10));

                println!(
                    "{} users ({} allowed, {} blocked), {} events in {} buckets",
                    summary.total_users,
                    summary.allowed_users,
                    summary.blocked_users,
                    events.len(),
                    buckets.len()
                );
                for user in snapshot {
                    println!(
                        "  {}: {} requests, {} ({}s left in window)",
                        user.user_id, user.requests, user.ai_allowed, user.ttl_seconds
                    );
                }
            }
            if let Some(logs) = feed.logs() {
                for record in logs {
                    println!(
                        "  log: {} {} -> {}",
                        record.user_id, record.endpoint, record.allowed
                    );
                }
            }
            println!();
        }

        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

//! # quotawatch-client
//!
//! HTTP client for the AI rate limiter's admin API.
//!
//! The admin API exposes two read-only endpoints: `/admin/rate-status`
//! (per-user quota state with recent request histories) and `/admin/logs`
//! (a bounded, newest-first request log). [`AdminClient`] fetches both and
//! decodes them into the `quotawatch-types` schema; every failure is
//! classified into one of the three [`ClientError`] variants so callers can
//! treat transport problems, bad statuses, and malformed payloads uniformly.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quotawatch_client::AdminClient;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AdminClient::builder()
//!         .base_url("http://localhost:8080")
//!         .timeout(Duration::from_secs(5))
//!         .build();
//!
//!     let snapshot = client.rate_status().await?;
//!     println!("Tracking {} users", snapshot.len());
//!
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod error;

pub use admin::AdminClient;
pub use error::ClientError;

// Re-export types for convenience
pub use quotawatch_types::{LogRecord, LogSnapshot, Outcome, StatusSnapshot, UserStatus};

//! # quotawatch-types
//!
//! Core types for AI rate-limit observability. This crate defines the wire
//! schema of the rate limiter's admin API and the canonical in-memory forms
//! shared by the quotawatch client, feed, and dashboard.
//!
//! ## Design Goals
//!
//! - **One admission-decision type**: The admin API represents allow/block
//!   decisions two ways (a JSON boolean on `/admin/rate-status`, a string on
//!   `/admin/logs`). Both normalize into [`Outcome`] at deserialization time
//!   and the string form never leaks past this crate.
//! - **Tolerant decoding**: Optional fields default rather than fail, and
//!   upstream quirks (negative TTLs for keys without expiry) are absorbed by
//!   accessors instead of being surfaced to every consumer.
//! - **Plain data**: Public fields, `Clone`/`PartialEq` derives, no
//!   behavior beyond small accessors. Aggregation lives downstream.
//!
//! ## Example
//!
//! ```rust
//! use quotawatch_types::{Outcome, UserStatus};
//!
//! let body = r#"[{"user_id": "u1", "requests": 5, "ai_allowed": true, "ttl_seconds": 42}]"#;
//! let snapshot: Vec<UserStatus> = serde_json::from_str(body).unwrap();
//!
//! assert_eq!(snapshot[0].ai_allowed, Outcome::Allowed);
//! assert!(snapshot[0].last_requests.is_empty());
//! ```

mod log;
mod outcome;
mod status;

pub use log::*;
pub use outcome::*;
pub use status::*;

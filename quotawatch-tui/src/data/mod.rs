//! Display-side data processing.
//!
//! The heavy lifting (polling, flattening, bucketing, summarizing) lives in
//! `quotawatch-feed`; what remains here is what only the dashboard cares
//! about.
//!
//! ## Submodules
//!
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "10s", "1m")
//! - [`health`]: Per-user display state derived from the admission decision
//!   and a request-count warning threshold
//! - [`history`]: Per-user request trends across snapshots for sparklines
//!   and rate calculations

pub mod duration;
pub mod health;
pub mod history;

pub use health::{classify, Thresholds, UserHealth};
pub use history::TrendHistory;

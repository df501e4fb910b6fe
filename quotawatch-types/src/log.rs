//! Flat request-log records as reported by `GET /admin/logs`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::outcome::{self, Outcome};

/// The request log as of one successful poll, newest first (the upstream
/// prepends entries and serves a bounded window of 50).
pub type LogSnapshot = Vec<LogRecord>;

/// One logged request.
///
/// Unlike the nested `/admin/rate-status` histories, these arrive already
/// flat and encode the decision as a string; [`outcome::string_repr`]
/// normalizes it on the way in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// When the request was made.
    pub timestamp: DateTime<Utc>,

    /// Who made the request.
    pub user_id: String,

    /// The endpoint the request targeted.
    pub endpoint: String,

    /// Whether the request was admitted. The wire value is the literal
    /// string `"true"` or anything else (blocked).
    #[serde(with = "outcome::string_repr")]
    pub allowed: Outcome,
}

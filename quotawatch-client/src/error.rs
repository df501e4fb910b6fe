//! Error types for admin API fetches.

use thiserror::Error;

/// Errors that can occur when fetching from the admin API.
///
/// All three variants are handled the same way at the polling boundary:
/// the failure is reported and the poll schedule continues, so the variant
/// only matters for display and for tests.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a usable response: connect failure,
    /// timeout, or request-level I/O error.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The server answered with a non-success HTTP status.
    #[error("API returned status {0}")]
    Status(u16),

    /// The body did not decode as the expected payload shape.
    #[error("Failed to decode response: {0}")]
    Schema(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Schema(err.to_string())
        } else {
            // Timeouts, connect failures, and request-level I/O all
            // classify as transport problems.
            ClientError::Transport(err.to_string())
        }
    }
}

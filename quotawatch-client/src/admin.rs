//! Admin API client.
//!
//! Wraps the rate limiter's two admin endpoints behind typed fetch methods.
//! The client is cheap to clone (it shares one connection pool) and carries
//! no auth: the admin API is an unauthenticated read surface.
//!
//! ## Example
//!
//! ```rust,no_run
//! use quotawatch_client::AdminClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AdminClient::builder().build();
//!
//!     for user in client.rate_status().await? {
//!         println!("{}: {} requests ({})", user.user_id, user.requests, user.ai_allowed);
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use quotawatch_types::{LogSnapshot, StatusSnapshot};

use crate::ClientError;

/// Client for the rate limiter's admin API.
#[derive(Debug, Clone)]
pub struct AdminClient {
    client: Client,
    base_url: String,
}

impl AdminClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> AdminClientBuilder {
        AdminClientBuilder::default()
    }

    /// The base URL requests are issued against, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the per-user quota table from `GET /admin/rate-status`.
    pub async fn rate_status(&self) -> Result<StatusSnapshot, ClientError> {
        self.get_json("/admin/rate-status").await
    }

    /// Fetch the recent request log from `GET /admin/logs`.
    ///
    /// Entries arrive newest first, bounded upstream to 50.
    pub async fn logs(&self) -> Result<LogSnapshot, ClientError> {
        self.get_json("/admin/logs").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

/// Builder for [`AdminClient`].
#[derive(Debug, Default)]
pub struct AdminClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl AdminClientBuilder {
    /// Set the admin API base URL (default: "http://localhost:8080").
    /// A trailing slash is trimmed.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the per-request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> AdminClient {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        let base_url = self
            .base_url
            .unwrap_or_else(|| "http://localhost:8080".to_string());

        AdminClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

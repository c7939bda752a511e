//! Search-engine notification for updated sitemap indexes.

use crate::{Error, Result};
use futures::future::join_all;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument, warn};
use url::Url;

/// Ping endpoints notified when none are configured.
pub const DEFAULT_PING_ENDPOINTS: [&str; 2] =
    ["http://www.google.com/ping", "http://www.bing.com/ping"];

/// Default per-request timeout in seconds.
pub const DEFAULT_PING_TIMEOUT_SECS: u64 = 10;

/// Result of notifying one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PingOutcome {
    /// Endpoint that was notified.
    pub endpoint: String,
    /// HTTP status, if a response arrived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Failure description, if the ping did not succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PingOutcome {
    /// Whether the endpoint answered with a success status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, Some(200..=299))
    }
}

/// Sends `GET {endpoint}?sitemap={index_url}` to a set of endpoints.
#[derive(Debug, Clone)]
pub struct Pinger {
    client: Client,
    endpoints: Vec<Url>,
}

impl Pinger {
    /// Create a pinger for `endpoints`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] for an endpoint that is not a URL, or
    /// [`Error::Network`] if the HTTP client cannot be built.
    pub fn new<S: AsRef<str>>(endpoints: &[S], timeout: Duration) -> Result<Self> {
        let endpoints = endpoints
            .iter()
            .map(|endpoint| {
                Url::parse(endpoint.as_ref())
                    .map_err(|e| Error::InvalidUrl(format!("{}: {e}", endpoint.as_ref())))
            })
            .collect::<Result<Vec<_>>>()?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sitemapper/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Network)?;

        Ok(Self { client, endpoints })
    }

    /// Pinger for [`DEFAULT_PING_ENDPOINTS`].
    pub fn with_defaults() -> Result<Self> {
        Self::new(
            &DEFAULT_PING_ENDPOINTS,
            Duration::from_secs(DEFAULT_PING_TIMEOUT_SECS),
        )
    }

    /// Notify every endpoint concurrently. Failures are reported, never retried.
    #[instrument(skip(self), fields(endpoints = self.endpoints.len()))]
    pub async fn ping(&self, index_url: &str) -> Vec<PingOutcome> {
        join_all(
            self.endpoints
                .iter()
                .map(|endpoint| self.ping_one(endpoint, index_url)),
        )
        .await
    }

    async fn ping_one(&self, endpoint: &Url, index_url: &str) -> PingOutcome {
        let mut url = endpoint.clone();
        url.query_pairs_mut().append_pair("sitemap", index_url);

        let outcome = match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                PingOutcome {
                    endpoint: endpoint.to_string(),
                    status: Some(status.as_u16()),
                    error: (!status.is_success()).then(|| format!("HTTP {status}")),
                }
            },
            Err(e) => PingOutcome {
                endpoint: endpoint.to_string(),
                status: None,
                error: Some(e.to_string()),
            },
        };

        if outcome.is_success() {
            info!(endpoint = %outcome.endpoint, "Pinged search engine");
        } else {
            warn!(
                endpoint = %outcome.endpoint,
                error = outcome.error.as_deref().unwrap_or_default(),
                "Search engine ping failed"
            );
        }
        outcome
    }
}

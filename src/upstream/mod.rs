pub mod tmdb;
pub mod trakt;

#[cfg(test)]
pub mod fake;

pub use tmdb::TmdbClient;
pub use trakt::TraktClient;

use crate::config::AppConfig;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// `Ok(None)` means the provider had nothing for us: a `null` body, or the
/// provider is not configured and no request was sent.
pub type FetchResult = Result<Option<Value>, UpstreamError>;

#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("{provider} returned HTTP {status}")]
    Status { provider: &'static str, status: u16 },

    #[error("{provider} request timed out after {after:?}")]
    Timeout {
        provider: &'static str,
        after: Duration,
    },

    #[error("{provider} request failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} returned an unreadable body: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },
}

impl UpstreamError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, UpstreamError::Status { status: 404, .. })
    }

    fn from_reqwest(provider: &'static str, err: reqwest::Error, after: Duration) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout { provider, after }
        } else if err.is_decode() {
            UpstreamError::Decode {
                provider,
                message: err.to_string(),
            }
        } else {
            UpstreamError::Transport {
                provider,
                message: err.to_string(),
            }
        }
    }
}

/// The two providers the aggregator reads from.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Authenticated GET against the catalog/ratings provider.
    async fn fetch_catalog(
        &self,
        path: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> FetchResult;

    /// GET against the image provider. Returns `Ok(None)` without any
    /// network call when no image credential is configured.
    async fn fetch_image_meta(
        &self,
        path: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> FetchResult;

    fn catalog_configured(&self) -> bool;

    fn image_configured(&self) -> bool;
}

/// Production [`Upstream`] backed by reqwest.
pub struct HttpUpstream {
    trakt: TraktClient,
    tmdb: TmdbClient,
}

impl HttpUpstream {
    pub fn new(trakt: TraktClient, tmdb: TmdbClient) -> Self {
        Self { trakt, tmdb }
    }

    pub fn from_config(config: &AppConfig) -> reqwest::Result<Self> {
        let trakt = TraktClient::new(
            &config.trakt.base_url,
            config.trakt_key().unwrap_or_default(),
        )?;
        let tmdb = TmdbClient::new(&config.tmdb.base_url, config.tmdb.api_key.clone())?;
        Ok(Self::new(trakt, tmdb))
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch_catalog(
        &self,
        path: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> FetchResult {
        self.trakt.get(path, query, timeout).await
    }

    async fn fetch_image_meta(
        &self,
        path: &str,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> FetchResult {
        self.tmdb.get(path, query, timeout).await
    }

    fn catalog_configured(&self) -> bool {
        self.trakt.is_configured()
    }

    fn image_configured(&self) -> bool {
        self.tmdb.is_configured()
    }
}

/// Send a prepared GET and read a JSON body. Callers decide how loudly a
/// failure is reported.
async fn send_json(
    provider: &'static str,
    path: &str,
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> FetchResult {
    let result = read_json(provider, request, timeout).await;
    if let Err(err) = &result {
        debug!(provider, path, error = %err, "Upstream request failed");
    }
    result
}

async fn read_json(
    provider: &'static str,
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> FetchResult {
    let response = request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| UpstreamError::from_reqwest(provider, e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        return Err(UpstreamError::Status {
            provider,
            status: status.as_u16(),
        });
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| UpstreamError::from_reqwest(provider, e, timeout))?;

    Ok((!body.is_null()).then_some(body))
}

//! Preload Data Sources
//!
//! The asynchronous boundary to the external data collaborator. The HTTP
//! implementation retries transient failures with exponential backoff; any
//! terminal failure surfaces as an error the cache layer degrades to
//! "no data" (the caller falls back to a normal fetch).

use crate::{Error, Result};
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::warn;

/// Boxed fetch future returned by a source
pub type FetchFuture = Pin<Box<dyn Future<Output = Result<serde_json::Value>> + Send>>;

/// Asynchronous provider of speculative payloads.
pub trait PreloadSource: Send + Sync {
    /// Fetch the payload for `key`. The future must not borrow the source.
    fn fetch(&self, key: &str, params: &serde_json::Value) -> FetchFuture;
}

/// HTTP-backed source posting `{key, params}` to a collaborator endpoint.
pub struct HttpPreloadSource {
    client: Client,
    endpoint: String,
    max_retries: u32,
}

impl HttpPreloadSource {
    pub fn new(endpoint: impl Into<String>, max_retries: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Preload(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            max_retries,
        })
    }
}

impl PreloadSource for HttpPreloadSource {
    fn fetch(&self, key: &str, params: &serde_json::Value) -> FetchFuture {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let max_retries = self.max_retries;
        let body = serde_json::json!({ "key": key, "params": params });
        let key = key.to_string();

        Box::pin(async move {
            for attempt in 0..max_retries {
                let result = client.post(&endpoint).json(&body).send().await;

                match result {
                    Ok(resp) => {
                        let status = resp.status();
                        if status.is_success() {
                            return resp
                                .json::<serde_json::Value>()
                                .await
                                .map_err(|e| Error::Preload(format!("{key}: bad payload: {e}")));
                        } else if status == StatusCode::TOO_MANY_REQUESTS {
                            // Longer backoff for rate limiting
                            let delay = Duration::from_secs(2u64.pow(attempt + 1));
                            warn!("preload {key}: rate limited (429), retrying in {delay:?}");
                            tokio::time::sleep(delay).await;
                        } else if status.is_server_error() {
                            let delay = Duration::from_secs(2u64.pow(attempt));
                            warn!("preload {key}: server error ({status}), retrying in {delay:?}");
                            tokio::time::sleep(delay).await;
                        } else {
                            return Err(Error::Preload(format!(
                                "{key}: non-retriable status {status}"
                            )));
                        }
                    }
                    Err(e) if e.is_timeout() || e.is_connect() => {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        warn!("preload {key}: network error ({e}), retrying in {delay:?}");
                        tokio::time::sleep(delay).await;
                    }
                    Err(e) => {
                        return Err(Error::Preload(format!("{key}: request failed: {e}")));
                    }
                }
            }
            Err(Error::Preload(format!(
                "{key}: failed after {max_retries} retries"
            )))
        })
    }
}

/// In-memory source serving canned payloads. Used by trace replay and tests.
///
/// Keys without a canned payload resolve to an echo object so offline replay
/// never depends on the network.
#[derive(Debug, Default)]
pub struct StaticPreloadSource {
    payloads: HashMap<String, serde_json::Value>,
}

impl StaticPreloadSource {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_map(payloads: HashMap<String, serde_json::Value>) -> Self {
        Self { payloads }
    }

    pub fn insert(&mut self, key: impl Into<String>, payload: serde_json::Value) {
        self.payloads.insert(key.into(), payload);
    }
}

impl PreloadSource for StaticPreloadSource {
    fn fetch(&self, key: &str, params: &serde_json::Value) -> FetchFuture {
        let payload = self
            .payloads
            .get(key)
            .cloned()
            .unwrap_or_else(|| serde_json::json!({ "key": key, "params": params }));
        Box::pin(async move { Ok(payload) })
    }
}

/// Source that always fails. Used to test degradation paths.
#[derive(Debug, Default)]
pub struct FailingPreloadSource;

impl PreloadSource for FailingPreloadSource {
    fn fetch(&self, key: &str, _params: &serde_json::Value) -> FetchFuture {
        let key = key.to_string();
        Box::pin(async move { Err(Error::Preload(format!("{key}: unavailable"))) })
    }
}

//! Source image retrieval
//!
//! On a cache miss the service pulls the original bytes from the site's own
//! origin (static files or the dynamic generation endpoint — never a
//! third-party host). The `SourceFetcher` trait is the seam that keeps the
//! pipeline testable without a network; `ReqwestFetcher` is the production
//! implementation and `MockFetcher` the canned-response double used by
//! integration tests to count fetch calls.

use crate::errors::FetchError;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Fetches full source-image bytes from a resolved URL
#[async_trait::async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch the body at `url`, failing on transport errors, non-2xx
    /// statuses, and empty bodies
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

/// Default fetcher backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Create a fetcher with default client configuration
    ///
    /// No subsystem-owned timeout is applied; cancellation is governed by the
    /// surrounding runtime (a dropped request future aborts the fetch).
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("imgd/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl SourceFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        debug!(%url, "fetching source image");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| FetchError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if bytes.is_empty() {
            return Err(FetchError::EmptyBody {
                url: url.to_string(),
            });
        }

        debug!(%url, size_bytes = bytes.len(), "source image fetched");
        Ok(bytes)
    }
}

/// Canned response for one URL registered with a `MockFetcher`
#[derive(Debug, Clone)]
enum MockResponse {
    Body(Bytes),
    Status(u16),
}

/// Test double recording every fetch call
///
/// URLs without a registered response answer 404, so tests asserting "no
/// network I/O happened" can rely on the call counter alone.
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: Mutex<HashMap<String, MockResponse>>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a successful body for a URL
    pub fn add_response(&self, url: impl Into<String>, body: impl Into<Bytes>) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.into(), MockResponse::Body(body.into()));
    }

    /// Register a bare status code for a URL
    pub fn add_status(&self, url: impl Into<String>, status: u16) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.into(), MockResponse::Status(status));
    }

    /// Number of fetch calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SourceFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let response = self.responses.lock().unwrap().get(url).cloned();
        match response {
            Some(MockResponse::Body(bytes)) => Ok(bytes),
            Some(MockResponse::Status(status)) if (200..300).contains(&status) => {
                Err(FetchError::EmptyBody {
                    url: url.to_string(),
                })
            }
            Some(MockResponse::Status(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

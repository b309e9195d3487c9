//! HTTP session abstraction.
//!
//! Fetchers issue their requests through an [`HttpSession`] so that transport
//! concerns (user agent, timeouts, rate limiting) stay with the session and
//! tests can substitute an in-memory implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::Result;

/// A shared HTTP session used to issue GET requests.
#[async_trait]
pub trait HttpSession: Send + Sync + Debug {
    /// Issues a GET request and returns the response body.
    ///
    /// Returns `Ok(None)` when the service answered but had nothing usable
    /// (a non-success status or an empty body).
    ///
    /// # Errors
    ///
    /// Returns [`FactsError::Network`](crate::FactsError::Network) when the
    /// request could not be completed.
    async fn get(&self, url: &str) -> Result<Option<Vec<u8>>>;
}

#[async_trait]
impl<S: HttpSession + ?Sized> HttpSession for Arc<S> {
    async fn get(&self, url: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(url).await
    }
}

/// In-memory session for testing and development.
///
/// Responses are registered per URL; any URL without a registered response
/// answers `Ok(None)`, the same as a non-success status from a real service.
/// Every requested URL is recorded in order.
#[derive(Debug, Default)]
pub struct MemorySession {
    responses: RwLock<HashMap<String, Vec<u8>>>,
    requests: RwLock<Vec<String>>,
}

impl MemorySession {
    /// Create a new session with no registered responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the body returned for `url`.
    pub async fn insert(&self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.responses.write().await.insert(url.into(), body.into());
    }

    /// URLs requested so far, in order.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl HttpSession for MemorySession {
    #[instrument(skip(self))]
    async fn get(&self, url: &str) -> Result<Option<Vec<u8>>> {
        self.requests.write().await.push(url.to_string());

        let body = self
            .responses
            .read()
            .await
            .get(url)
            .filter(|body| !body.is_empty())
            .cloned();

        debug!(found = body.is_some(), "In-memory GET");
        Ok(body)
    }
}

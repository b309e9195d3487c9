#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/facts/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC EDGAR company facts fetcher.
//!
//! # Example
//!
//! ```no_run
//! use facts_core::{Cik, flatten_facts};
//! use facts_edgar::{EdgarFetcher, ReqwestSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = ReqwestSession::new("MyApp/1.0 (contact@example.com)")?;
//!     let fetcher = EdgarFetcher::new(session);
//!
//!     let facts = fetcher.fetch_company_facts(&Cik::new("1321655")?).await?;
//!     let table = flatten_facts(&facts)?;
//!     println!("{} rows for {}", table.len(), table.entity_name());
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use facts_core::{Cik, FactResponse, FactsError, HttpSession, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// SEC EDGAR API base URL
pub const EDGAR_BASE_URL: &str = "https://data.sec.gov";

/// Placeholder replaced by the zero-padded CIK in URL templates.
pub const CIK_PLACEHOLDER: &str = "##########";

/// Company facts endpoint, relative to the base URL.
pub const COMPANY_FACTS_TEMPLATE: &str = "/api/xbrl/companyfacts/CIK##########.json";

/// Company concept endpoint (one taxonomy/tag pair), relative to the base URL.
pub const COMPANY_CONCEPT_TEMPLATE: &str = "/api/xbrl/companyconcept/CIK##########";

/// Filing history and company metadata endpoint, relative to the base URL.
pub const SUBMISSIONS_TEMPLATE: &str = "/submissions/CIK##########.json";

/// Default rate limit: 10 requests per second (SEC requirement)
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(100);

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Substitutes a CIK into a URL template.
#[must_use]
pub fn expand_template(template: &str, cik: &Cik) -> String {
    template.replace(CIK_PLACEHOLDER, cik.as_str())
}

/// Rate limiter to ensure we don't exceed SEC's rate limits
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// HTTP session backed by `reqwest`.
///
/// The SEC requires an identifying user agent and at most 10 requests per
/// second; both are enforced here so that fetchers never deal with them.
#[derive(Debug, Clone)]
pub struct ReqwestSession {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl ReqwestSession {
    /// Create a new session with the specified user agent.
    ///
    /// The user agent should follow the SEC's format:
    /// "AppName/Version (contact@email.com)"
    ///
    /// # Errors
    ///
    /// Returns [`FactsError::Network`] if the HTTP client cannot be built.
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| FactsError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client))
    }

    /// Create a new session around a pre-configured client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(DEFAULT_RATE_LIMIT))),
        }
    }
}

#[async_trait]
impl HttpSession for ReqwestSession {
    async fn get(&self, url: &str) -> Result<Option<Vec<u8>>> {
        // Rate limit
        self.rate_limiter.lock().await.wait().await;

        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FactsError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, url, "Request did not succeed");
            return Ok(None);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FactsError::Network(e.to_string()))?;

        Ok((!body.is_empty()).then(|| body.to_vec()))
    }
}

/// Fetches company facts from the EDGAR XBRL API.
#[derive(Debug)]
pub struct EdgarFetcher<S> {
    session: S,
    base_url: String,
}

impl<S: HttpSession> EdgarFetcher<S> {
    /// Create a fetcher that talks to the public EDGAR API.
    #[must_use]
    pub fn new(session: S) -> Self {
        Self::with_base_url(session, EDGAR_BASE_URL)
    }

    /// Create a fetcher against a different host, e.g. a mirror or a test
    /// server. A trailing slash is ignored.
    #[must_use]
    pub fn with_base_url(session: S, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { session, base_url }
    }

    /// The session requests are issued through.
    #[must_use]
    pub const fn session(&self) -> &S {
        &self.session
    }

    /// URL of the company facts document for a CIK.
    #[must_use]
    pub fn company_facts_url(&self, cik: &Cik) -> String {
        format!(
            "{}{}",
            self.base_url,
            expand_template(COMPANY_FACTS_TEMPLATE, cik)
        )
    }

    /// URL of a single concept (taxonomy/tag) for a CIK.
    #[must_use]
    pub fn company_concept_url(&self, cik: &Cik, taxonomy: &str, tag: &str) -> String {
        format!(
            "{}{}/{}/{}.json",
            self.base_url,
            expand_template(COMPANY_CONCEPT_TEMPLATE, cik),
            taxonomy,
            tag
        )
    }

    /// URL of the submissions (filing history) document for a CIK.
    #[must_use]
    pub fn submissions_url(&self, cik: &Cik) -> String {
        format!(
            "{}{}",
            self.base_url,
            expand_template(SUBMISSIONS_TEMPLATE, cik)
        )
    }

    /// Fetch all XBRL facts reported by a company.
    ///
    /// # Errors
    ///
    /// Returns [`FactsError::NoData`] if the service had nothing for the CIK,
    /// [`FactsError::Parse`] if the body is not JSON, and any network error
    /// raised by the session.
    pub async fn fetch_company_facts(&self, cik: &Cik) -> Result<FactResponse> {
        info!(%cik, "Extracting company facts");
        let url = self.company_facts_url(cik);
        let body = self.get_or_no_data(&url, cik).await?;
        FactResponse::from_slice(&body)
    }

    /// Fetch one concept (a single financial-statement line item) for a
    /// company, e.g. `us-gaap` / `AccountsPayableCurrent`.
    ///
    /// # Errors
    ///
    /// Same as [`EdgarFetcher::fetch_company_facts`].
    pub async fn fetch_company_concept(
        &self,
        cik: &Cik,
        taxonomy: &str,
        tag: &str,
    ) -> Result<Value> {
        info!(%cik, taxonomy, tag, "Extracting company concept");
        let url = self.company_concept_url(cik, taxonomy, tag);
        let body = self.get_or_no_data(&url, cik).await?;
        serde_json::from_slice(&body)
            .map_err(|e| FactsError::Parse(format!("Failed to parse company concept: {}", e)))
    }

    /// Fetch the current accounts payable concept for a company.
    ///
    /// # Errors
    ///
    /// Same as [`EdgarFetcher::fetch_company_facts`].
    pub async fn fetch_accounts_payable(&self, cik: &Cik) -> Result<Value> {
        self.fetch_company_concept(cik, "us-gaap", "AccountsPayableCurrent")
            .await
    }

    /// Fetch a company's submissions document: tickers, exchanges and the
    /// recent filing index.
    ///
    /// # Errors
    ///
    /// Same as [`EdgarFetcher::fetch_company_facts`].
    pub async fn fetch_submissions(&self, cik: &Cik) -> Result<Value> {
        info!(%cik, "Extracting submissions");
        let url = self.submissions_url(cik);
        let body = self.get_or_no_data(&url, cik).await?;
        serde_json::from_slice(&body)
            .map_err(|e| FactsError::Parse(format!("Failed to parse submissions: {}", e)))
    }

    async fn get_or_no_data(&self, url: &str, cik: &Cik) -> Result<Vec<u8>> {
        debug!("Fetching {}", url);
        match self.session.get(url).await? {
            Some(body) => Ok(body),
            None => {
                warn!(%cik, "No data found");
                Err(FactsError::NoData {
                    cik: cik.to_string(),
                })
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

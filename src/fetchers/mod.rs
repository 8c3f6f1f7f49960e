//! Page fetching: plain HTTP, WebDriver-rendered, or HTTP with a browser
//! fallback for client-rendered sites.

pub mod browser;
pub mod http;

pub use browser::BrowserFetcher;
pub use http::HttpFetcher;

use crate::config::{FetchConfig, FetchMode};
use crate::parsers::html::anchor_count;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

/// Errors that can occur while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Timeout after {0:?}")]
    Timeout(Duration),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("Response body exceeds {0} bytes")]
    TooLarge(usize),
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),
    #[error("WebDriver unavailable: {0}")]
    WebDriver(String),
    #[error("Browser navigation failed: {0}")]
    Navigation(String),
    #[error("Failed to parse URL: {0}")]
    InvalidUrl(String),
}

/// A fetched page, ready for link collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects, used as the base for relative links
    pub url: String,
    /// Page HTML
    pub body: String,
    /// Whether a browser rendered the page
    pub js_rendered: bool,
}

/// Something that can turn a URL into page content
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;
}

/// HTTP first, then a browser render when the HTTP attempt fails, runs
/// past its budget or returns a page without any anchors
#[derive(Debug, Clone)]
pub struct TieredFetcher<H = HttpFetcher, B = BrowserFetcher> {
    http: H,
    browser: B,
    http_budget: Duration,
}

impl TieredFetcher {
    /// Splits the configured timeout between the two tiers
    pub fn from_config(config: &FetchConfig) -> Result<Self, FetchError> {
        let (http_budget, browser_budget) = config.tier_budgets();
        Ok(Self::new(
            HttpFetcher::with_timeout(config, http_budget)?,
            BrowserFetcher::with_timeout(config, browser_budget),
            http_budget,
        ))
    }
}

impl<H: PageFetcher, B: PageFetcher> TieredFetcher<H, B> {
    pub fn new(http: H, browser: B, http_budget: Duration) -> Self {
        Self {
            http,
            browser,
            http_budget,
        }
    }
}

impl<H: PageFetcher, B: PageFetcher> PageFetcher for TieredFetcher<H, B> {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let attempt = match timeout(self.http_budget, self.http.fetch(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.http_budget)),
        };

        match attempt {
            Ok(page) if anchor_count(&page.body) > 0 => return Ok(page),
            Ok(_) => {
                ::log::info!("No anchors in static HTML of {}, rendering with browser", url);
            }
            Err(e) => {
                ::log::info!("HTTP fetch of {} failed ({}), rendering with browser", url, e);
            }
        }
        self.browser.fetch(url).await
    }
}

/// Fetcher selected by [`FetchMode`]
#[derive(Debug, Clone)]
pub enum AnyFetcher {
    Http(HttpFetcher),
    Browser(BrowserFetcher),
    Tiered(TieredFetcher),
}

impl AnyFetcher {
    /// Builds the fetcher for the configured mode
    pub fn from_config(config: &FetchConfig) -> Result<Self, FetchError> {
        let fetcher = match config.mode {
            FetchMode::Http => AnyFetcher::Http(HttpFetcher::new(config)?),
            FetchMode::Browser => AnyFetcher::Browser(BrowserFetcher::new(config)),
            FetchMode::Auto => AnyFetcher::Tiered(TieredFetcher::from_config(config)?),
        };
        ::log::debug!("Using {:?} fetch mode", config.mode);
        Ok(fetcher)
    }
}

impl PageFetcher for AnyFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        match self {
            AnyFetcher::Http(f) => f.fetch(url).await,
            AnyFetcher::Browser(f) => f.fetch(url).await,
            AnyFetcher::Tiered(f) => f.fetch(url).await,
        }
    }
}

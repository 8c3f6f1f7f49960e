use crate::rank::RankingResult;
use serde::{Deserialize, Serialize};

/// What menu discovery found for one site
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    /// URL discovery was started from
    pub url: String,

    /// URL the fetcher ended up on (after redirects), if the fetch succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_url: Option<String>,

    /// Whether the page had to be rendered in a browser
    pub js_rendered: bool,

    /// Why the page could not be fetched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub result: RankingResult,
}

impl DiscoveryReport {
    /// A report for a page that could not be fetched: no candidates
    pub fn failed(url: &str, error: impl ToString) -> Self {
        Self {
            url: url.to_string(),
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    /// The URL the surrounding pipeline should scrape next, if any
    pub fn menu_url(&self) -> Option<&str> {
        self.result.preferred().map(|l| l.url())
    }
}

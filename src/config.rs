use crate::classify::KeywordTable;
use crate::filter::ScopeConfig;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// How pages are fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Plain HTTP GET, no JavaScript
    Http,
    /// Full render through a WebDriver browser session
    Browser,
    /// HTTP first, browser when the page looks client-rendered
    #[default]
    Auto,
}

/// Configuration for the page fetcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default)]
    pub mode: FetchMode,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Upper bound for fetching one page, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How long to let a rendered page settle after load, in milliseconds
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// User agent sent with HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Largest HTTP response body read, in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Top-level configuration for menu discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinderConfig {
    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub scope: ScopeConfig,

    /// Classification and scoring tables
    #[serde(default)]
    pub keywords: KeywordTable,

    /// Maximum number of sites fetched at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

/// Default value for max_concurrency
fn default_max_concurrency() -> usize {
    4
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_settle_ms() -> u64 {
    1500
}

fn default_user_agent() -> String {
    format!("menu-finder/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_body_bytes() -> usize {
    5 * 1024 * 1024
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            mode: FetchMode::default(),
            webdriver_url: default_webdriver_url(),
            timeout_secs: default_timeout_secs(),
            settle_ms: default_settle_ms(),
            user_agent: default_user_agent(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            scope: ScopeConfig::default(),
            keywords: KeywordTable::default(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Splits the page timeout between the HTTP attempt and the browser
    /// fallback in auto mode. The rest covers closing the browser session.
    pub fn tier_budgets(&self) -> (Duration, Duration) {
        let total = self.timeout();
        (total / 4, total * 2 / 3)
    }
}

impl FinderConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Box<dyn Error>> {
        let config: Self = serde_json::from_str(json)?;
        if config.max_concurrency == 0 {
            return Err("max_concurrency must be at least 1".into());
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Category;
    use std::io::Write;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = FinderConfig::from_json("{}").unwrap();
        assert_eq!(config, FinderConfig::default());
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.fetch.mode, FetchMode::Auto);
        assert_eq!(config.fetch.webdriver_url, "http://localhost:4444");
        assert_eq!(config.fetch.timeout(), Duration::from_secs(30));
        assert!(config.scope.allow_external);
        assert_eq!(config.fetch.max_body_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_tier_budgets_fit_in_timeout() {
        let config = FetchConfig::default();
        let (http, browser) = config.tier_budgets();
        assert_eq!(http, Duration::from_millis(7500));
        assert_eq!(browser, Duration::from_secs(20));
        assert!(http + browser < config.timeout());

        let config = FetchConfig {
            timeout_secs: 0,
            ..FetchConfig::default()
        };
        assert_eq!(config.tier_budgets(), (Duration::ZERO, Duration::ZERO));
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{
            "fetch": { "mode": "browser", "timeout_secs": 10 },
            "scope": { "allow_external": false },
            "keywords": { "reject": ["order-online"] },
            "max_concurrency": 2
        }"#;
        let config = FinderConfig::from_json(json).unwrap();
        assert_eq!(config.fetch.mode, FetchMode::Browser);
        assert_eq!(config.fetch.timeout_secs, 10);
        assert_eq!(config.fetch.settle_ms, 1500);
        assert!(!config.scope.allow_external);
        assert_eq!(config.scope.allowed_schemes, vec!["http", "https"]);
        assert_eq!(config.keywords.reject, vec!["order-online"]);
        assert_eq!(config.keywords.categories[0].category, Category::Dinner);
        assert_eq!(config.max_concurrency, 2);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(FinderConfig::from_json("{ nope").is_err());
        assert!(FinderConfig::from_json(r#"{"fetch": {"mode": "telnet"}}"#).is_err());
        assert!(FinderConfig::from_json(r#"{"max_concurrency": 0}"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("menu-finder-config-{}.json", std::process::id()));
        {
            let mut file = File::create(&path).unwrap();
            write!(file, r#"{{"fetch": {{"mode": "http"}}}}"#).unwrap();
        }
        let config = FinderConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.fetch.mode, FetchMode::Http);

        assert!(FinderConfig::from_file("/nonexistent/menu-finder.json").is_err());
    }
}

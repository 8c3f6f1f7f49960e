use crate::parsers::CandidateLink;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for which candidate links are worth ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Whether links to other hosts are kept (menus often live on
    /// ordering platforms or file hosts)
    #[serde(default = "default_allow_external")]
    pub allow_external: bool,

    /// URL schemes that are kept
    #[serde(default = "default_allowed_schemes")]
    pub allowed_schemes: Vec<String>,

    /// Regex patterns for URLs to drop
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
}

fn default_allow_external() -> bool {
    true
}

fn default_allowed_schemes() -> Vec<String> {
    vec!["http".to_string(), "https".to_string()]
}

fn default_exclude_patterns() -> Vec<String> {
    // Assets never hold a menu; PDFs are deliberately not in this list
    vec![r"(?i)\.(jpg|jpeg|png|gif|webp|css|js|ico|svg|woff|woff2|ttf|eot)(\?|$)".to_string()]
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            allow_external: default_allow_external(),
            allowed_schemes: default_allowed_schemes(),
            exclude_patterns: default_exclude_patterns(),
        }
    }
}

/// Drops candidates that can't be menu pages before they are ranked
#[derive(Debug)]
pub struct ScopeFilter {
    config: ScopeConfig,
    root_host: Option<String>,
    exclude_regexes: Vec<Regex>,
}

impl ScopeFilter {
    /// Create a new scope filter for links found on `root_url`
    pub fn new(config: ScopeConfig, root_url: &str) -> Result<Self, regex::Error> {
        let mut exclude_regexes = Vec::with_capacity(config.exclude_patterns.len());
        for pattern in &config.exclude_patterns {
            exclude_regexes.push(Regex::new(pattern)?);
        }

        Ok(Self {
            config,
            root_host: root_host(root_url),
            exclude_regexes,
        })
    }

    /// Same rules, scoped to links found on another page
    pub fn with_root(&self, root_url: &str) -> Self {
        Self {
            config: self.config.clone(),
            root_host: root_host(root_url),
            exclude_regexes: self.exclude_regexes.clone(),
        }
    }

    /// Determine if a candidate should be ranked
    pub fn accepts(&self, link: &CandidateLink) -> bool {
        let Ok(url) = Url::parse(&link.normalized_url) else {
            ::log::debug!("Scope filter rejected unparseable: {}", link.normalized_url);
            return false;
        };

        if !self
            .config
            .allowed_schemes
            .iter()
            .any(|s| s.eq_ignore_ascii_case(url.scheme()))
        {
            ::log::debug!("Scope filter rejected scheme: {}", url);
            return false;
        }

        if !self.is_in_host_scope(&url) {
            ::log::debug!("Scope filter rejected external: {}", url);
            return false;
        }

        // Check regex exclusions
        let url_str = url.as_str();
        if self.exclude_regexes.iter().any(|r| r.is_match(url_str)) {
            ::log::debug!("Scope filter rejected by pattern: {}", url);
            return false;
        }

        true
    }

    /// Keeps the accepted candidates, preserving order
    pub fn retain(&self, links: Vec<CandidateLink>) -> Vec<CandidateLink> {
        let before = links.len();
        let kept: Vec<_> = links.into_iter().filter(|l| self.accepts(l)).collect();
        ::log::debug!("Scope filter kept {} of {} candidates", kept.len(), before);
        kept
    }

    fn is_in_host_scope(&self, url: &Url) -> bool {
        if self.config.allow_external {
            return true;
        }
        match (&self.root_host, url.host_str()) {
            (Some(root), Some(host)) => site_host(host) == *root,
            // Without a known root host there is nothing to compare against
            (None, _) => true,
            (Some(_), None) => false,
        }
    }
}

fn root_host(root_url: &str) -> Option<String> {
    Url::parse(root_url)
        .ok()
        .and_then(|u| u.host_str().map(site_host))
}

/// Host with a leading `www.` removed
fn site_host(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

pub mod classify;
pub mod config;
pub mod fetchers;
pub mod filter;
pub mod normalize;
pub mod parsers;
pub mod rank;
pub mod results;

// Re-export commonly used types for convenience
pub use classify::{Category, KeywordTable, classify, score};
pub use config::{FetchConfig, FetchMode, FinderConfig};
pub use fetchers::{AnyFetcher, FetchError, FetchedPage, PageFetcher};
pub use normalize::normalize;
pub use parsers::CandidateLink;
pub use parsers::html::collect_links;
pub use rank::{RankingResult, ScoredLink, rank};
pub use results::DiscoveryReport;

use filter::ScopeFilter;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Finds the menu pages linked from restaurant websites.
///
/// Each discovery fetches one page, collects its anchors, drops links that
/// are out of scope and ranks the rest. Discoveries share no mutable state,
/// so one finder can serve many sites at once.
pub struct MenuFinder<F: PageFetcher = AnyFetcher> {
    config: FinderConfig,
    fetcher: F,
    scope: ScopeFilter,
}

impl MenuFinder<AnyFetcher> {
    /// Create a finder using the fetcher selected by `config.fetch.mode`
    pub fn new(config: FinderConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let fetcher = AnyFetcher::from_config(&config.fetch)?;
        Self::with_fetcher(config, fetcher)
    }
}

impl<F: PageFetcher> MenuFinder<F> {
    /// Create a finder with a custom page fetcher
    pub fn with_fetcher(
        config: FinderConfig,
        fetcher: F,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let scope = ScopeFilter::new(config.scope.clone(), "")?;
        Ok(Self {
            config,
            fetcher,
            scope,
        })
    }

    /// Set the maximum number of sites fetched concurrently
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Ranks the menu links of already-fetched HTML. No I/O.
    pub fn discover_in_html(&self, html: &str, base_url: &str) -> RankingResult {
        let candidates = parsers::html::collect_links_from_url(html, base_url);
        let in_scope = self.scope.with_root(base_url).retain(candidates);
        rank::rank_with(&self.config.keywords, &in_scope)
    }

    /// Fetches `url` and ranks its menu links.
    ///
    /// Never fails: a page that can't be fetched within the configured
    /// timeout produces a report with an error and no candidates.
    pub async fn discover(&self, url: &str) -> DiscoveryReport {
        ::log::info!("Discovering menu links on {}", url);
        let deadline = self.config.fetch.timeout();

        let page = match tokio::time::timeout(deadline, self.fetcher.fetch(url)).await {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                ::log::warn!("Failed to fetch {}: {}", url, e);
                return DiscoveryReport::failed(url, e);
            }
            Err(_) => {
                ::log::warn!("Timed out fetching {} after {:?}", url, deadline);
                return DiscoveryReport::failed(url, FetchError::Timeout(deadline));
            }
        };

        let result = self.discover_in_html(&page.body, &page.url);
        match result.preferred() {
            Some(best) => ::log::info!(
                "Best menu link on {}: {} ({}, {})",
                url,
                best.url(),
                best.category,
                best.score
            ),
            None => ::log::info!("No menu link found on {}", url),
        }

        DiscoveryReport {
            url: url.to_string(),
            fetched_url: Some(page.url),
            js_rendered: page.js_rendered,
            error: None,
            result,
        }
    }
}

impl<F: PageFetcher + 'static> MenuFinder<F> {
    /// Discovers menu links on several sites concurrently, at most
    /// `max_concurrency` at a time. Reports come back in input order.
    pub async fn discover_many(self: &Arc<Self>, urls: Vec<String>) -> Vec<DiscoveryReport> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (index, url) in urls.iter().cloned().enumerate() {
            let finder = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // The semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                (index, finder.discover(&url).await)
            });
        }

        let mut reports: Vec<Option<DiscoveryReport>> = vec![None; urls.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, report)) => reports[index] = Some(report),
                Err(e) => ::log::error!("Discovery task failed: {}", e),
            }
        }

        reports
            .into_iter()
            .zip(urls)
            .map(|(report, url)| {
                report.unwrap_or_else(|| DiscoveryReport::failed(&url, "discovery task failed"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves canned pages; unknown URLs fail like a refused connection
    struct CannedFetcher {
        pages: HashMap<String, String>,
        delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl CannedFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(u, b)| (u.to_string(), b.to_string()))
                    .collect(),
                delay: Duration::ZERO,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    impl PageFetcher for CannedFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match self.pages.get(url) {
                Some(body) => Ok(FetchedPage {
                    url: url.to_string(),
                    body: body.clone(),
                    js_rendered: false,
                }),
                None => Err(FetchError::Status(404)),
            }
        }
    }

    const HOME: &str = r#"<html><body><nav>
        <a href="/catering">Catering</a>
        <a href="/menu/dinner">Dinner</a>
        <a href="/menu/lunch/">Lunch</a>
        <a href="/menus.pdf">Download our menus</a>
        <a href="/menu/dinner#wine">Dinner (again)</a>
        <a href="mailto:hello@r.com">Email us</a>
        <a href="/img/hero.jpg">Hero</a>
    </nav></body></html>"#;

    fn finder(fetcher: CannedFetcher) -> MenuFinder<CannedFetcher> {
        MenuFinder::with_fetcher(FinderConfig::default(), fetcher).unwrap()
    }

    #[test]
    fn test_discover_in_html() {
        let finder = finder(CannedFetcher::new(&[]));
        let result = finder.discover_in_html(HOME, "https://r.com/");

        let urls: Vec<&str> = result.ranked.iter().map(|l| l.url()).collect();
        assert_eq!(
            urls,
            vec![
                "https://r.com/menu/dinner",
                "https://r.com/menu/lunch",
                "https://r.com/menus.pdf",
                "https://r.com/catering",
            ]
        );
        assert_eq!(result.best_for(Category::Dinner).unwrap().link.source_text, "Dinner");
        assert_eq!(result.best_for(Category::Pdf).unwrap().score, 60);
        assert_eq!(result.best_for(Category::Lunch).unwrap().link.raw_url, "/menu/lunch/");
        assert!(result.best_for(Category::Reject).is_none());
    }

    #[tokio::test]
    async fn test_discover_reports_best_link() {
        let finder = finder(CannedFetcher::new(&[("https://r.com/", HOME)]));
        let report = finder.discover("https://r.com/").await;

        assert!(report.error.is_none());
        assert_eq!(report.fetched_url.as_deref(), Some("https://r.com/"));
        assert_eq!(report.menu_url(), Some("https://r.com/menu/dinner"));
    }

    #[tokio::test]
    async fn test_fetch_failure_degrades_to_empty_result() {
        let finder = finder(CannedFetcher::new(&[]));
        let report = finder.discover("https://gone.example/").await;

        assert_eq!(report.error.as_deref(), Some("HTTP status 404"));
        assert!(report.result.is_empty());
        assert!(report.result.best.is_empty());
        assert!(report.menu_url().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout_degrades_to_empty_result() {
        let mut fetcher = CannedFetcher::new(&[("https://slow.example/", HOME)]);
        fetcher.delay = Duration::from_secs(120);
        let finder = finder(fetcher);

        let report = finder.discover("https://slow.example/").await;
        assert!(report.error.as_deref().unwrap().starts_with("Timeout"));
        assert!(report.result.is_empty());
    }

    #[tokio::test]
    async fn test_custom_keywords_from_config() {
        let config = FinderConfig::from_json(
            r#"{"keywords": {"reject": ["dinner"]}, "scope": {"allow_external": false}}"#,
        )
        .unwrap();
        let html = r#"<a href="/menu/dinner">Dinner</a><a href="https://other.com/menu">Menu</a><a href="/food">Food</a>"#;
        let finder =
            MenuFinder::with_fetcher(config, CannedFetcher::new(&[("https://r.com/", html)]))
                .unwrap();

        let report = finder.discover("https://r.com/").await;
        let ranked: Vec<(&str, Category)> = report
            .result
            .ranked
            .iter()
            .map(|l| (l.url(), l.category))
            .collect();
        assert_eq!(
            ranked,
            vec![
                ("https://r.com/menu/dinner", Category::Reject),
                ("https://r.com/food", Category::Menu),
            ]
        );
        assert_eq!(report.menu_url(), Some("https://r.com/food"));
    }

    #[test]
    fn test_invalid_scope_pattern_is_rejected() {
        let config = FinderConfig::from_json(r#"{"scope": {"exclude_patterns": ["[a-"]}}"#).unwrap();
        assert!(MenuFinder::with_fetcher(config, CannedFetcher::new(&[])).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_many_keeps_order_and_bounds_concurrency() {
        let pages: Vec<(String, String)> = (0..6)
            .map(|i| (format!("https://site{i}.com/"), HOME.to_string()))
            .collect();
        let refs: Vec<(&str, &str)> = pages.iter().map(|(u, b)| (u.as_str(), b.as_str())).collect();
        let mut fetcher = CannedFetcher::new(&refs);
        fetcher.delay = Duration::from_millis(100);

        let finder = Arc::new(finder(fetcher).with_max_concurrency(2));
        let mut urls: Vec<String> = pages.iter().map(|(u, _)| u.clone()).collect();
        urls.push("https://missing.com/".to_string());

        let reports = finder.discover_many(urls.clone()).await;

        assert_eq!(reports.len(), 7);
        for (report, url) in reports.iter().zip(&urls) {
            assert_eq!(&report.url, url);
        }
        assert!(reports[..6].iter().all(|r| r.error.is_none()));
        assert_eq!(
            reports[3].menu_url(),
            Some("https://site3.com/menu/dinner")
        );
        assert!(reports[6].error.is_some());
        assert!(finder.fetcher.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_discover_many_empty() {
        let finder = Arc::new(finder(CannedFetcher::new(&[])));
        assert!(finder.discover_many(Vec::new()).await.is_empty());
    }
}

use crate::config::FetchConfig;
use crate::fetchers::{FetchError, FetchedPage, PageFetcher};
use fantoccini::{Client, ClientBuilder};
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Alternatives tried when the configured WebDriver URL is unreachable
const FALLBACK_WEBDRIVER_URLS: [&str; 3] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4444", // geckodriver / Selenium default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// How often document.readyState is polled while a page loads
const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Renders pages in a WebDriver-controlled browser so client-side
/// JavaScript runs before links are read
#[derive(Debug, Clone)]
pub struct BrowserFetcher {
    webdriver_url: String,
    timeout: Duration,
    settle: Duration,
}

impl BrowserFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        Self::with_timeout(config, config.timeout())
    }

    /// Same driver and settle delay with a different page budget
    pub fn with_timeout(config: &FetchConfig, timeout: Duration) -> Self {
        Self {
            webdriver_url: config.webdriver_url.clone(),
            timeout,
            settle: config.settle(),
        }
    }

    /// Connects a new session, trying the well-known local ports if needed
    async fn connect(&self) -> Result<Client, FetchError> {
        let first_error = match new_session(&self.webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", self.webdriver_url);
                return Ok(client);
            }
            Err(e) => {
                ::log::warn!(
                    "Failed to connect to WebDriver at {}: {}",
                    self.webdriver_url,
                    e
                );
                e
            }
        };

        for url in FALLBACK_WEBDRIVER_URLS {
            if url == self.webdriver_url {
                continue;
            }
            ::log::debug!("Trying fallback WebDriver URL: {}", url);
            // Fallback failures aren't logged to avoid log spam
            if let Ok(client) = new_session(url).await {
                ::log::info!("Connected to fallback WebDriver at {}", url);
                return Ok(client);
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(FetchError::WebDriver(first_error))
    }

    /// Navigates, waits for the page to settle and reads the rendered source
    async fn render(&self, client: &Client, url: &str) -> Result<FetchedPage, FetchError> {
        client
            .goto(url)
            .await
            .map_err(|e| navigation_error(e, "accessing", url))?;

        self.wait_until_loaded(client).await;

        let body = client
            .source()
            .await
            .map_err(|e| navigation_error(e, "getting source for", url))?;

        let final_url = match client.current_url().await {
            Ok(current) => current.to_string(),
            Err(e) => {
                ::log::debug!("Could not read current URL for {}: {}", url, e);
                url.to_string()
            }
        };

        Ok(FetchedPage {
            url: final_url,
            body,
            js_rendered: true,
        })
    }

    /// Polls readyState until "complete", then waits the settle delay so
    /// late XHR-driven rendering can finish
    async fn wait_until_loaded(&self, client: &Client) {
        let deadline = Instant::now() + self.timeout / 2;
        while Instant::now() < deadline {
            match client.execute("return document.readyState", Vec::new()).await {
                Ok(Value::String(state)) if state == "complete" => break,
                Ok(_) => {}
                Err(e) => {
                    ::log::debug!("readyState check failed: {}", e);
                    break;
                }
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
        tokio::time::sleep(self.settle).await;
    }
}

impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let start = Instant::now();
        ::log::debug!("RENDER: {}", url);

        let client = timeout(self.timeout, self.connect())
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;

        // Connecting and rendering share one budget
        let remaining = self.timeout.saturating_sub(start.elapsed());
        let result = match timeout(remaining, self.render(&client, url)).await {
            Ok(result) => result,
            Err(_) => {
                ::log::error!("Timeout rendering: {}", url);
                Err(FetchError::Timeout(self.timeout))
            }
        };

        // One session per page, always closed
        if let Err(e) = client.close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }

        if let Ok(page) = &result {
            ::log::debug!(
                "Rendered {} ({} bytes) in {:.2} seconds",
                page.url,
                page.body.len(),
                start.elapsed().as_secs_f64()
            );
        }
        result
    }
}

/// Capabilities requesting a headless browser from Chrome or Firefox drivers
fn headless_capabilities() -> serde_json::Map<String, Value> {
    let caps = json!({
        "goog:chromeOptions": { "args": ["--headless=new", "--disable-gpu", "--no-sandbox"] },
        "moz:firefoxOptions": { "args": ["-headless"] },
    });
    match caps {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}

async fn new_session(webdriver_url: &str) -> Result<Client, String> {
    let mut builder = ClientBuilder::native();
    builder.capabilities(headless_capabilities());
    builder
        .connect(webdriver_url)
        .await
        .map_err(|e| e.to_string())
}

/// Maps a WebDriver command error, noting lost sessions separately
fn navigation_error(error: fantoccini::error::CmdError, context: &str, url: &str) -> FetchError {
    let message = error.to_string();
    if message.contains("Unable to find session") {
        ::log::warn!("Lost session while {} {}", context, url);
    } else {
        ::log::error!("Failed {} {}: {}", context, url, message);
    }
    FetchError::Navigation(format!("{context} {url}: {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_capabilities() {
        let caps = headless_capabilities();
        assert!(caps.contains_key("goog:chromeOptions"));
        assert_eq!(caps["moz:firefoxOptions"]["args"][0], "-headless");
    }

    #[test]
    fn test_new_reads_config() {
        let config = FetchConfig {
            webdriver_url: "http://driver:4444".to_string(),
            timeout_secs: 12,
            settle_ms: 250,
            ..FetchConfig::default()
        };
        let fetcher = BrowserFetcher::new(&config);
        assert_eq!(fetcher.webdriver_url, "http://driver:4444");
        assert_eq!(fetcher.timeout, Duration::from_secs(12));
        assert_eq!(fetcher.settle, Duration::from_millis(250));

        let fetcher = BrowserFetcher::with_timeout(&config, Duration::from_secs(8));
        assert_eq!(fetcher.timeout, Duration::from_secs(8));
        assert_eq!(fetcher.webdriver_url, "http://driver:4444");
    }
}

use crate::config::FetchConfig;
use crate::fetchers::{FetchError, FetchedPage, PageFetcher};
use std::time::Duration;
use url::Url;

/// Static fetch: one GET, no JavaScript
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        Self::with_timeout(config, config.timeout())
    }

    /// Same client settings with a different request timeout
    pub fn with_timeout(config: &FetchConfig, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            timeout,
            max_body_bytes: config.max_body_bytes,
        })
    }

    fn request_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Http(e)
        }
    }
}

fn is_markup(content_type: &str) -> bool {
    content_type.contains("text/html")
        || content_type.contains("application/xhtml")
        || content_type.contains("text/plain")
}

/// Appends a body chunk unless it would take the body past `limit`
fn append_capped(body: &mut Vec<u8>, chunk: &[u8], limit: usize) -> Result<(), FetchError> {
    if body.len() + chunk.len() > limit {
        return Err(FetchError::TooLarge(limit));
    }
    body.extend_from_slice(chunk);
    Ok(())
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
        let start = std::time::Instant::now();
        ::log::debug!("GET {}", parsed);

        let mut response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_ascii_lowercase();
        if !is_markup(&content_type) {
            return Err(FetchError::InvalidContentType(content_type));
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_body_bytes as u64)
        {
            ::log::warn!("Skipping {}: declared body exceeds {} bytes", url, self.max_body_bytes);
            return Err(FetchError::TooLarge(self.max_body_bytes));
        }

        let final_url = response.url().to_string();
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.request_error(e))? {
            append_capped(&mut bytes, &chunk, self.max_body_bytes)?;
        }
        let body = String::from_utf8_lossy(&bytes).into_owned();

        ::log::debug!(
            "Fetched {} ({} bytes) in {:.2} seconds",
            final_url,
            body.len(),
            start.elapsed().as_secs_f64()
        );

        Ok(FetchedPage {
            url: final_url,
            body,
            js_rendered: false,
        })
    }
}

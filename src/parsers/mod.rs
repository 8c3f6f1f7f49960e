pub mod html;
pub mod text;


use serde::{Deserialize, Serialize};

/// Enum to represent the kinds of content a fetched URL can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserType {
    /// HTML page, searched for anchors
    Html,
    /// Plain text or YAML
    Text,
    /// PDF document (a menu itself, never a source of links)
    Pdf,
    /// Images, stylesheets and scripts
    Other,
}

impl ParserType {
    /// Determines the parser type based on the URL's path
    pub fn from_url(url: &str) -> Self {
        let path = url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .to_ascii_lowercase();

        if path.ends_with(".pdf") {
            ::log::debug!("Classifying as PDF: {}", url);
            ParserType::Pdf
        } else if path.ends_with(".txt") || path.ends_with(".yaml") || path.ends_with(".yml") {
            ::log::debug!("Classifying as Text: {}", url);
            ParserType::Text
        } else if [".jpg", ".jpeg", ".png", ".gif", ".webp", ".css", ".js"]
            .iter()
            .any(|ext| path.ends_with(ext))
        {
            ::log::debug!("Classifying as Other: {}", url);
            ParserType::Other
        } else {
            // Default to HTML for most URLs
            ParserType::Html
        }
    }

    /// Returns if the content should be searched for links
    pub fn should_extract_links(&self) -> bool {
        matches!(self, ParserType::Html)
    }
}

/// A link found on a page that may point at a menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateLink {
    /// The literal href attribute value
    pub raw_url: String,

    /// Canonical form of the resolved URL, used as the dedup key
    pub normalized_url: String,

    /// Visible anchor text, whitespace collapsed
    pub source_text: String,
}

impl CandidateLink {
    pub fn new(
        raw_url: impl Into<String>,
        normalized_url: impl Into<String>,
        source_text: impl Into<String>,
    ) -> Self {
        Self {
            raw_url: raw_url.into(),
            normalized_url: normalized_url.into(),
            source_text: source_text.into(),
        }
    }

    /// Creates a candidate from an absolute URL, normalizing it
    pub fn from_url(url: &str, source_text: impl Into<String>) -> Self {
        Self::new(url, crate::normalize::normalize(url), source_text)
    }
}

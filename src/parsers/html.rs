use crate::normalize::normalize;
use crate::parsers::{CandidateLink, ParserType, text};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("static selector is valid"));

/// Extracts one candidate per anchor element, in document order.
///
/// Anchors without an href are skipped. Absolute hrefs are kept as they
/// are; everything else is resolved against `base_url`. Duplicate targets
/// are preserved.
pub fn collect_links(html: &str, base_url: &str) -> Vec<CandidateLink> {
    if html.trim().is_empty() {
        return Vec::new();
    }

    let base = match Url::parse(base_url) {
        Ok(base) => Some(base),
        Err(e) => {
            ::log::warn!("Base URL {} is not absolute ({}), relative links stay as-is", base_url, e);
            None
        }
    };

    let doc = Html::parse_document(html);
    let links = doc
        .select(&ANCHOR_SELECTOR)
        .filter_map(|anchor| candidate_from_anchor(anchor, base.as_ref()))
        .collect::<Vec<_>>();

    ::log::debug!("HTML parser found {} links on {}", links.len(), base_url);
    if !links.is_empty() {
        ::log::trace!(
            "First few links: {:?}",
            links.iter().take(5).map(|l| &l.normalized_url).collect::<Vec<_>>()
        );
    }

    links
}

/// Collects links only when the URL holds HTML content
pub fn collect_links_from_url(content: &str, url: &str) -> Vec<CandidateLink> {
    let parser_type = ParserType::from_url(url);
    if !parser_type.should_extract_links() {
        ::log::debug!("Not searching {:?} content for links: {}", parser_type, url);
        return Vec::new();
    }
    collect_links(content, url)
}

/// Counts anchors carrying an href
pub fn anchor_count(html: &str) -> usize {
    let doc = Html::parse_document(html);
    doc.select(&ANCHOR_SELECTOR)
        .filter(|a| a.value().attr("href").is_some_and(|h| !h.trim().is_empty()))
        .count()
}

fn candidate_from_anchor(anchor: ElementRef<'_>, base: Option<&Url>) -> Option<CandidateLink> {
    let raw = anchor.value().attr("href")?;
    let href = raw.trim();
    if href.is_empty() {
        return None;
    }

    let resolved = resolve_href(href, base);
    let visible = text::join_fragments(anchor.text());
    let source_text = if visible.is_empty() {
        text::first_non_empty([anchor.value().attr("aria-label"), anchor.value().attr("title")])
    } else {
        visible
    };

    Some(CandidateLink {
        raw_url: raw.to_string(),
        normalized_url: normalize(&resolved),
        source_text,
    })
}

/// Resolves an href to absolute form when it is not already absolute
pub fn resolve_href(href: &str, base: Option<&Url>) -> String {
    if Url::parse(href).is_ok() {
        return href.to_string();
    }

    match base.map(|b| b.join(href)) {
        Some(Ok(joined)) => joined.to_string(),
        Some(Err(e)) => {
            ::log::debug!("Could not resolve href {}: {}", href, e);
            href.to_string()
        }
        None => href.to_string(),
    }
}

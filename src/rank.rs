use crate::classify::{Category, DEFAULT_TABLE, KeywordTable};
use crate::parsers::CandidateLink;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A candidate link with its category and relevance score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredLink {
    #[serde(flatten)]
    pub link: CandidateLink,
    pub category: Category,
    pub score: i32,
}

impl ScoredLink {
    pub fn url(&self) -> &str {
        &self.link.normalized_url
    }
}

/// Outcome of ranking one page's candidate links
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingResult {
    /// Highest-scoring link per non-reject category
    pub best: BTreeMap<Category, ScoredLink>,

    /// Every deduplicated candidate, best score first (rejects included)
    pub ranked: Vec<ScoredLink>,
}

impl RankingResult {
    /// True when no candidates were found at all
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    pub fn best_for(&self, category: Category) -> Option<&ScoredLink> {
        self.best.get(&category)
    }

    /// The highest-ranked link that is not a reject
    pub fn preferred(&self) -> Option<&ScoredLink> {
        self.ranked.iter().find(|l| l.category != Category::Reject)
    }
}

/// Ranks links with the default keyword table
pub fn rank(links: &[CandidateLink]) -> RankingResult {
    rank_with(&DEFAULT_TABLE, links)
}

/// Classifies, scores, deduplicates and orders a page's candidate links.
///
/// Discovery order decides which duplicate survives and breaks every tie.
pub fn rank_with(table: &KeywordTable, links: &[CandidateLink]) -> RankingResult {
    let mut seen = HashSet::new();
    let mut ranked = Vec::with_capacity(links.len());

    for link in links {
        if !seen.insert(link.normalized_url.as_str()) {
            ::log::trace!("Dropping duplicate candidate: {}", link.normalized_url);
            continue;
        }
        ranked.push(score_link(table, link));
    }

    let mut best: BTreeMap<Category, ScoredLink> = BTreeMap::new();
    for scored in ranked.iter().filter(|l| l.category != Category::Reject) {
        // Strictly greater, so the earliest link keeps a tie
        let replace = best
            .get(&scored.category)
            .is_none_or(|current| scored.score > current.score);
        if replace {
            best.insert(scored.category, scored.clone());
        }
    }

    // Vec::sort_by is stable
    ranked.sort_by(|a, b| b.score.cmp(&a.score));

    ::log::debug!(
        "Ranked {} unique candidates ({} input), {} categories selected",
        ranked.len(),
        links.len(),
        best.len()
    );

    RankingResult { best, ranked }
}

fn score_link(table: &KeywordTable, link: &CandidateLink) -> ScoredLink {
    let category = table.classify(link);
    let score = table.score(link);
    ::log::trace!("{} -> {} ({})", link.normalized_url, category, score);
    ScoredLink {
        link: link.clone(),
        category,
        score,
    }
}

use crate::parsers::CandidateLink;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// The kind of menu content a candidate link points at.
///
/// Variant order is the classification priority order, which also keeps
/// `BTreeMap<Category, _>` output in a stable and readable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Dinner,
    Lunch,
    Brunch,
    Drinks,
    Pdf,
    Menu,
    /// Not a menu link (or explicitly unwanted, like catering or careers)
    Reject,
}

impl Category {
    /// All categories, in priority order
    pub const ALL: [Category; 7] = [
        Category::Dinner,
        Category::Lunch,
        Category::Brunch,
        Category::Drinks,
        Category::Pdf,
        Category::Menu,
        Category::Reject,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Dinner => "dinner",
            Category::Lunch => "lunch",
            Category::Brunch => "brunch",
            Category::Drinks => "drinks",
            Category::Pdf => "pdf",
            Category::Menu => "menu",
            Category::Reject => "reject",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keywords that put a link into one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: Category,
    pub keywords: Vec<String>,
}

/// A weighted scoring term. Counts once if any of its keywords matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTerm {
    pub keywords: Vec<String>,
    pub weight: i32,
}

/// Keyword and weight tables driving classification and scoring.
///
/// Keywords are matched as lowercase substrings of the link's normalized
/// URL joined with its anchor text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordTable {
    /// Keywords that reject a link outright, ahead of every category rule
    #[serde(default = "default_reject_keywords")]
    pub reject: Vec<String>,

    /// Category rules, checked in order (first match wins)
    #[serde(default = "default_category_rules")]
    pub categories: Vec<CategoryRule>,

    /// Scoring terms, all of which are summed
    #[serde(default = "default_score_terms")]
    pub weights: Vec<ScoreTerm>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn default_reject_keywords() -> Vec<String> {
    words(&[
        "catering",
        "careers",
        "jobs",
        "blog",
        "gift",
        "franchise",
        "private-event",
        "events",
    ])
}

fn default_category_rules() -> Vec<CategoryRule> {
    let rule = |category, keywords: &[&str]| CategoryRule {
        category,
        keywords: words(keywords),
    };
    vec![
        rule(Category::Dinner, &["dinner"]),
        rule(Category::Lunch, &["lunch"]),
        rule(Category::Brunch, &["brunch"]),
        rule(Category::Drinks, &["drinks", "cocktail", "wine"]),
        rule(Category::Pdf, &[".pdf"]),
        rule(Category::Menu, &["menu", "menus", "food", "eat", "dining"]),
    ]
}

fn default_score_terms() -> Vec<ScoreTerm> {
    let term = |keywords: &[&str], weight| ScoreTerm {
        keywords: words(keywords),
        weight,
    };
    vec![
        term(&["menu"], 50),
        term(&["dinner"], 30),
        term(&["lunch"], 20),
        term(&["brunch"], 20),
        term(&["drinks"], 10),
        term(&[".pdf"], 10),
        term(&["catering"], -30),
        term(&["events"], -20),
        term(&["careers", "jobs"], -50),
    ]
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self {
            reject: default_reject_keywords(),
            categories: default_category_rules(),
            weights: default_score_terms(),
        }
    }
}

pub(crate) static DEFAULT_TABLE: LazyLock<KeywordTable> = LazyLock::new(KeywordTable::default);

/// Text the keyword tables are matched against
pub fn match_text(link: &CandidateLink) -> String {
    format!("{} {}", link.normalized_url, link.source_text).to_lowercase()
}

fn contains_any(haystack: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|k| !k.is_empty() && haystack.contains(&k.to_lowercase()))
}

impl KeywordTable {
    /// Assigns a link to exactly one category
    pub fn classify(&self, link: &CandidateLink) -> Category {
        self.classify_text(&match_text(link))
    }

    /// Sums every matching scoring term
    pub fn score(&self, link: &CandidateLink) -> i32 {
        self.score_text(&match_text(link))
    }

    /// Classifies already-lowercased match text
    pub fn classify_text(&self, text: &str) -> Category {
        if contains_any(text, &self.reject) {
            return Category::Reject;
        }

        self.categories
            .iter()
            .find(|rule| contains_any(text, &rule.keywords))
            .map_or(Category::Reject, |rule| rule.category)
    }

    /// Scores already-lowercased match text
    pub fn score_text(&self, text: &str) -> i32 {
        self.weights
            .iter()
            .filter(|term| contains_any(text, &term.keywords))
            .map(|term| term.weight)
            .sum()
    }
}

/// Classifies a link with the default keyword table
pub fn classify(link: &CandidateLink) -> Category {
    DEFAULT_TABLE.classify(link)
}

/// Scores a link with the default keyword table
pub fn score(link: &CandidateLink) -> i32 {
    DEFAULT_TABLE.score(link)
}

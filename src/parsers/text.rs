/// Collapses every run of whitespace into a single space and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Concatenates text nodes (as yielded by a DOM walk) into one collapsed
/// string. Nodes are not separated: whitespace between inline elements
/// already lives in the text nodes themselves.
pub fn join_fragments<'a>(fragments: impl IntoIterator<Item = &'a str>) -> String {
    let joined = fragments.into_iter().collect::<String>();
    collapse_whitespace(&joined)
}

/// Returns the first candidate that is non-empty after collapsing whitespace
pub fn first_non_empty<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> String {
    candidates
        .into_iter()
        .flatten()
        .map(collapse_whitespace)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

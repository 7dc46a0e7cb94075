//! Tokenization shared by relevance scoring and result metadata.

use std::collections::BTreeSet;

use crate::models::target::TargetSpec;

/// Filler that carries no signal when matching a résumé against a posting.
const STOPWORDS: &[&str] = &[
    "a", "ability", "about", "across", "an", "and", "are", "as", "at", "be", "by", "deep",
    "etc", "excellent", "experience", "familiarity", "for", "from", "good", "hands", "have",
    "in", "including", "into", "is", "it", "its", "knowledge", "least", "more", "must", "of",
    "on", "or", "other", "our", "plus", "preferred", "proficiency", "proficient", "required",
    "requirements", "skill", "skills", "solid", "strong", "such", "that", "the", "their",
    "this", "to", "understanding", "use", "using", "we", "who", "will", "with", "work",
    "working", "year", "years", "you", "your",
];

/// Lowercased content tokens of `text`, deduplicated and ordered.
///
/// Keeps `+`, `#` and inner `.` so that "C++", "C#" and "Node.js" survive.
/// Drops stopwords, bare numbers and single characters.
pub fn tokens(text: &str) -> BTreeSet<String> {
    words(text).into_iter().filter(|t| is_content_token(t)).collect()
}

/// Lowercased words of `text` in order, split the same way as `tokens` but
/// without any filtering.
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|raw| raw.trim_matches('.').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Whether the words of `phrase` occur contiguously in `haystack`.
pub fn contains_phrase(haystack: &[String], phrase: &str) -> bool {
    let needle = words(phrase);
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle.as_slice())
}

fn is_content_token(token: &str) -> bool {
    if token.is_empty() || STOPWORDS.contains(&token) {
        return false;
    }
    if token.chars().all(|c| c.is_ascii_digit() || c == '+' || c == '.') {
        return false;
    }
    token.chars().count() > 1
}

/// Keyword tokens of a target posting.
///
/// Explicit `keywords` win. Otherwise the title and requirements are used,
/// falling back to the free-text description when both are empty.
pub fn target_keywords(target: &TargetSpec) -> BTreeSet<String> {
    if !target.keywords.is_empty() {
        return target.keywords.iter().flat_map(|k| tokens(k)).collect();
    }

    let mut keywords = tokens(&target.title);
    for requirement in &target.requirements {
        keywords.extend(tokens(requirement));
    }
    if keywords.is_empty() {
        keywords = tokens(&target.description);
    }
    keywords
}

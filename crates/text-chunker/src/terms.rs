//! Lexical term extraction shared by BM25 scoring and diversity signatures.

use std::collections::{BTreeSet, HashSet};

/// Terms shorter than this are dropped.
pub const MIN_TERM_CHARS: usize = 3;

// Only words of MIN_TERM_CHARS or more matter; shorter ones never survive extraction.
const STOPWORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "and", "any", "are", "because",
    "been", "before", "being", "below", "between", "both", "but", "can", "could", "did", "does",
    "doing", "down", "during", "each", "few", "for", "from", "further", "had", "has", "have",
    "having", "her", "here", "hers", "him", "his", "how", "into", "its", "itself", "just", "more",
    "most", "not", "now", "off", "once", "only", "other", "our", "ours", "out", "over", "own",
    "same", "she", "should", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "then", "there", "these", "they", "this", "those", "through", "too", "under", "until", "very",
    "was", "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will",
    "with", "would", "you", "your", "yours",
];

#[must_use]
pub fn is_stopword(term: &str) -> bool {
    STOPWORDS.binary_search(&term).is_ok()
}

fn raw_terms(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| part.len() >= MIN_TERM_CHARS)
        .map(str::to_ascii_lowercase)
}

/// Lowercased `[a-z0-9]+` runs of at least three characters, stopwords removed, in order.
#[must_use]
pub fn extract_terms(text: &str) -> Vec<String> {
    raw_terms(text).filter(|term| !is_stopword(term)).collect()
}

/// Query terms deduplicated in first-seen order.
#[must_use]
pub fn unique_terms(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    extract_terms(text)
        .into_iter()
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

/// Bag of lowercase alphanumeric tokens (three or more characters) used for redundancy checks.
#[must_use]
pub fn diversity_signature(text: &str) -> BTreeSet<String> {
    raw_terms(text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stopword_table_is_sorted() {
        let mut sorted = STOPWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOPWORDS.to_vec());
    }

    #[test]
    fn extracts_lowercase_alphanumeric_runs() {
        assert_eq!(
            extract_terms("The BM25-score of GPT4 is (very) high; an ok result"),
            vec!["bm25", "score", "gpt4", "high", "result"]
        );
    }

    #[test]
    fn non_ascii_letters_split_terms() {
        assert_eq!(extract_terms("naïve bayes"), vec!["bayes"]);
    }

    #[test]
    fn unique_terms_keep_first_occurrence_order() {
        assert_eq!(
            unique_terms("result common result COMMON summary"),
            vec!["result", "common", "summary"]
        );
    }

    #[test]
    fn signature_keeps_stopwords_but_drops_short_tokens() {
        let sig = diversity_signature("The cat and a dog");
        assert!(sig.contains("the"));
        assert!(sig.contains("cat"));
        assert!(!sig.contains("a"));
    }
}

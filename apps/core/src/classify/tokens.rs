//! Word tokenization shared by the statistical classifiers.

use std::collections::HashSet;
use std::sync::LazyLock;

/// English stopwords dropped before any counting.
const STOPWORDS_EN: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "nor", "for", "yet", "so", "i", "you", "he", "she", "it",
    "we", "they", "me", "him", "her", "us", "them", "my", "your", "his", "its", "our", "their",
    "mine", "yours", "hers", "ours", "theirs", "this", "that", "these", "those", "who", "whom",
    "which", "what", "whose", "is", "am", "are", "was", "were", "be", "been", "being", "have",
    "has", "had", "having", "do", "does", "did", "doing", "will", "would", "shall", "should",
    "can", "could", "may", "might", "must", "in", "on", "at", "to", "from", "by", "with", "about",
    "against", "between", "into", "through", "during", "before", "after", "above", "below", "up",
    "down", "out", "off", "over", "under", "again", "further", "here", "there", "where", "when",
    "why", "how", "all", "each", "every", "both", "few", "more", "most", "other", "some", "any",
    "no", "not", "only", "own", "same", "than", "too", "very", "just", "also", "now", "then",
    "once", "always", "never", "if", "because", "as", "until", "while", "although", "though",
    "yes", "maybe", "s", "t", "ve", "re", "ll", "d", "m", "won", "don", "doesn", "isn",
];

static STOPWORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORDS_EN.iter().copied().collect());

/// Minimum token length in characters.
const MIN_WORD_LENGTH: usize = 2;

/// Lower-cases `text` and splits it into content words.
///
/// Non-alphanumeric characters separate tokens; stopwords, purely numeric tokens and
/// tokens shorter than two characters are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| {
            word.chars().count() >= MIN_WORD_LENGTH
                && !STOPWORDS.contains(word)
                && !word.chars().all(|c| c.is_numeric())
        })
        .map(|word| word.to_string())
        .collect()
}

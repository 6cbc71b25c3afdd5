// Repetition
// N-gram reuse and vocabulary diversity over lower-cased whitespace tokens.

use crate::models::RepetitionSignal;
use std::collections::HashSet;
use tracing::debug;

fn tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

/// (total - unique) / total over contiguous n-grams; 0 when there are fewer than n tokens.
pub fn ngram_repetition(tokens: &[String], n: usize) -> f64 {
    if n == 0 || tokens.len() < n {
        return 0.0;
    }
    let total = tokens.len() - n + 1;
    let unique: HashSet<&[String]> = tokens.windows(n).collect();
    (total - unique.len()) as f64 / total as f64
}

/// Unique tokens / total tokens. Empty input counts as fully diverse.
pub fn token_diversity(tokens: &[String]) -> f64 {
    if tokens.is_empty() {
        return 1.0;
    }
    let unique: HashSet<&String> = tokens.iter().collect();
    unique.len() as f64 / tokens.len() as f64
}

pub fn calculate_repetition(text: &str) -> RepetitionSignal {
    let tokens = tokens(text);
    let bigram = ngram_repetition(&tokens, 2);
    let trigram = ngram_repetition(&tokens, 3);
    let diversity = token_diversity(&tokens);
    let combined = (0.3 * bigram + 0.3 * trigram + 0.4 * (1.0 - diversity)).clamp(0.0, 1.0);

    debug!(combined, bigram, trigram, diversity, "repetition");
    RepetitionSignal {
        bigram,
        trigram,
        diversity,
        combined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_unique_tokens() {
        let rep = calculate_repetition("the quick brown fox jumps over a lazy dog");
        assert_eq!(rep.bigram, 0.0);
        assert_eq!(rep.trigram, 0.0);
        assert_eq!(rep.diversity, 1.0);
        assert_eq!(rep.combined, 0.0);
    }

    #[test]
    fn test_case_insensitive() {
        let rep = calculate_repetition("Alpha beta ALPHA BETA");
        assert_eq!(rep.diversity, 0.5);
        // bigrams: (alpha beta), (beta alpha), (alpha beta)
        assert!((rep.bigram - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_text_has_no_ngrams() {
        let rep = calculate_repetition("hello");
        assert_eq!(rep.bigram, 0.0);
        assert_eq!(rep.trigram, 0.0);
        assert_eq!(rep.diversity, 1.0);
    }

    #[test]
    fn test_empty_text() {
        let rep = calculate_repetition("   ");
        assert_eq!(rep.combined, 0.0);
        assert_eq!(rep.diversity, 1.0);
    }

    #[test]
    fn test_verbatim_repeat_is_highly_repetitive() {
        let text = "The system processes the data efficiently. ".repeat(5);
        let rep = calculate_repetition(&text);
        assert!(rep.combined > 0.7, "combined = {}", rep.combined);
    }
}

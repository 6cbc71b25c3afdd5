// Stylometry
// Sentence length profile, lexical diversity and function-word density.

use crate::models::StylometryFeatures;
use std::collections::HashSet;

use super::stats::{mean, variance};

const STOPWORDS: [&str; 17] = [
    "the", "a", "an", "in", "on", "at", "for", "with", "and", "or", "but", "is", "are", "was", "were", "to", "of",
];

pub fn compute_stylometry<S: AsRef<str>>(text: &str, sentences: &[S]) -> StylometryFeatures {
    let words: Vec<String> = text.split_whitespace().map(|w| w.to_lowercase()).collect();
    if words.is_empty() || sentences.is_empty() {
        return StylometryFeatures::default();
    }

    let lengths: Vec<f64> = sentences
        .iter()
        .map(|s| s.as_ref().split_whitespace().count() as f64)
        .collect();

    let unique: HashSet<&str> = words.iter().map(String::as_str).collect();
    let stopwords: HashSet<&str> = STOPWORDS.into_iter().collect();
    let stop_count = words.iter().filter(|w| stopwords.contains(w.as_str())).count();

    StylometryFeatures {
        avg_sentence_length: mean(&lengths),
        sentence_length_var: variance(&lengths),
        lexical_diversity: unique.len() as f64 / words.len() as f64,
        stopword_ratio: stop_count as f64 / words.len() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_features() {
        let sentences = ["The cat sat on the mat.", "It was warm."];
        let text = sentences.join(" ");
        let f = compute_stylometry(&text, &sentences);
        assert_eq!(f.avg_sentence_length, 4.5);
        assert_eq!(f.sentence_length_var, 2.25);
        // the, cat, sat, on, mat., it, was, warm. -> 8 unique of 9
        assert!((f.lexical_diversity - 8.0 / 9.0).abs() < 1e-9);
        // the, on, the, was
        assert!((f.stopword_ratio - 4.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_text_is_zero() {
        let f = compute_stylometry::<&str>("", &[]);
        assert_eq!(f, StylometryFeatures::default());
        let g = compute_stylometry("words but no sentences", &[] as &[&str]);
        assert_eq!(g, StylometryFeatures::default());
    }
}

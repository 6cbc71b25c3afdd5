// Sentence Scores
// Per-sentence highlight scores: local perplexity blended with the document score.

use crate::models::SentenceScore;
use crate::services::config_store::NormalizationBounds;

use super::normalize::normalize_perplexity;
use super::perplexity::SentencePerplexity;

/// Local normalized perplexity score for each scored sentence, as
/// (sentence index, perplexity, local score). Skipped sentences are omitted.
pub fn local_scores(outcomes: &[SentencePerplexity], bounds: &NormalizationBounds) -> Vec<(usize, f64, f64)> {
    outcomes
        .iter()
        .enumerate()
        .filter_map(|(idx, o)| o.as_ref().ok().map(|&ppl| (idx, ppl)))
        .map(|(idx, ppl)| {
            (
                idx,
                ppl,
                normalize_perplexity(ppl, bounds.min_perplexity, bounds.max_perplexity),
            )
        })
        .collect()
}

/// `local_weight * local + (1 - local_weight) * final`, one entry per scored sentence.
pub fn score_sentences(
    sentences: &[String],
    locals: &[(usize, f64, f64)],
    final_score: f64,
    local_weight: f64,
) -> Vec<SentenceScore> {
    locals
        .iter()
        .filter_map(|&(idx, ppl, local)| {
            sentences.get(idx).map(|text| SentenceScore {
                index: idx,
                text: text.clone(),
                perplexity: ppl,
                score: (local_weight * local + (1.0 - local_weight) * final_score).clamp(0.0, 100.0),
            })
        })
        .collect()
}

// Perplexity & Distribution
// Document perplexity with length calibration, per-sentence perplexities and
// the shape of their distribution.

use crate::error::ScoringError;
use crate::models::PerplexityDistribution;
use crate::services::config_store::LengthCalibration;
use crate::services::providers::LanguageModelScorer;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::stats::{mean, skewness, std_dev};

/// Why a sentence has no local perplexity.
#[derive(Debug, Clone, PartialEq)]
pub enum Skipped {
    TooFewTokens(usize),
    Unscoreable(String),
}

pub type SentencePerplexity = Result<f64, Skipped>;

/// Short texts get their perplexity raised (short predictable text is not
/// inherently AI-like); long texts get a mild log-length reduction.
pub fn calibrate_for_length(perplexity: f64, word_count: usize, cfg: &LengthCalibration) -> f64 {
    if word_count < cfg.short_text_words {
        let shortfall = (cfg.short_text_words - word_count) as f64 / cfg.short_text_words as f64;
        perplexity * (1.0 + cfg.short_text_boost * shortfall)
    } else if word_count > cfg.long_text_words {
        let excess = (word_count as f64 / cfg.long_text_words as f64).ln();
        perplexity / (1.0 + cfg.long_text_penalty * excess)
    } else {
        perplexity
    }
}

/// Returns (raw, calibrated) document perplexity.
pub async fn document_perplexity<S: LanguageModelScorer>(
    scorer: &S,
    text: &str,
    word_count: usize,
    max_tokens: usize,
    cfg: &LengthCalibration,
) -> Result<(f64, f64), ScoringError> {
    let raw = scorer.perplexity(text, max_tokens).await?;
    if !(raw.is_finite() && raw > 0.0) {
        return Err(ScoringError::InvalidOutput(raw));
    }
    let calibrated = calibrate_for_length(raw, word_count, cfg);
    debug!(raw, calibrated, word_count, "document perplexity");
    Ok((raw, calibrated))
}

/// Scores every sentence independently, at most `concurrency` at a time.
/// Output is parallel to `sentences`. Sentences under the token floor, or
/// rejected by the scorer as unscoreable, come back as `Err(Skipped)`; any
/// other scorer failure aborts the whole call.
pub async fn sentence_perplexities<S: LanguageModelScorer + 'static>(
    scorer: Arc<S>,
    sentences: &[String],
    min_tokens: usize,
    max_tokens: usize,
    concurrency: usize,
) -> Result<Vec<SentencePerplexity>, ScoringError> {
    let started = Instant::now();
    let mut outcomes: Vec<Option<SentencePerplexity>> = vec![None; sentences.len()];
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut join_set: JoinSet<(usize, Result<f64, ScoringError>)> = JoinSet::new();

    for (idx, sentence) in sentences.iter().enumerate() {
        let tokens = scorer.count_tokens(sentence);
        if tokens < min_tokens {
            outcomes[idx] = Some(Err(Skipped::TooFewTokens(tokens)));
            continue;
        }

        let scorer = scorer.clone();
        let semaphore = semaphore.clone();
        let sentence = sentence.clone();
        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            (idx, scorer.perplexity(&sentence, max_tokens).await)
        });
    }

    while let Some(res) = join_set.join_next().await {
        let (idx, result) = res.map_err(|e| ScoringError::Unavailable(format!("sentence task failed: {}", e)))?;
        outcomes[idx] = Some(match result {
            Ok(ppl) if ppl.is_finite() && ppl > 0.0 => Ok(ppl),
            Ok(ppl) => return Err(ScoringError::InvalidOutput(ppl)),
            Err(e) if e.is_input_specific() => Err(Skipped::Unscoreable(e.to_string())),
            Err(e) => return Err(e),
        });
    }

    let outcomes: Vec<SentencePerplexity> = outcomes
        .into_iter()
        .map(|o| o.unwrap_or_else(|| Err(Skipped::Unscoreable("not scored".to_string()))))
        .collect();

    let skipped = outcomes.iter().filter(|o| o.is_err()).count();
    if skipped > 0 {
        warn!(
            skipped,
            total = sentences.len(),
            "partial sentence coverage: some sentences were not scored"
        );
    }
    info!(
        sentences = sentences.len(),
        scored = sentences.len() - skipped,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "sentence perplexities done"
    );
    Ok(outcomes)
}

/// Std, coefficient of variation and skewness of sentence perplexities.
pub fn perplexity_distribution(values: &[f64]) -> PerplexityDistribution {
    let std = std_dev(values);
    let m = mean(values);
    let cv = if m > 0.0 { std / m } else { 0.0 };
    PerplexityDistribution {
        std,
        cv,
        skew: skewness(values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    enum Entry {
        Value(f64),
        Unscoreable,
        Offline,
    }

    struct TableScorer {
        table: HashMap<String, Entry>,
    }

    impl LanguageModelScorer for TableScorer {
        async fn perplexity(&self, text: &str, _max_tokens: usize) -> Result<f64, ScoringError> {
            match self.table.get(text) {
                Some(Entry::Value(v)) => Ok(*v),
                Some(Entry::Unscoreable) => Err(ScoringError::Unscoreable("tokenizer".to_string())),
                Some(Entry::Offline) => Err(ScoringError::Unavailable("model offline".to_string())),
                None => Ok(40.0),
            }
        }
    }

    fn s(v: &str) -> String {
        v.to_string()
    }

    #[test]
    fn test_length_calibration() {
        let cfg = LengthCalibration::default();
        assert_eq!(calibrate_for_length(20.0, 300, &cfg), 20.0);
        assert_eq!(calibrate_for_length(20.0, 150, &cfg), 20.0);
        assert_eq!(calibrate_for_length(20.0, 500, &cfg), 20.0);
        // Shorter text gets a bigger boost.
        let short = calibrate_for_length(20.0, 10, &cfg);
        let shorter = calibrate_for_length(20.0, 5, &cfg);
        assert!(short > 20.0 && shorter > short);
        assert!(shorter <= 30.0);
        // Long text is penalized mildly.
        let long = calibrate_for_length(20.0, 1000, &cfg);
        assert!(long < 20.0 && long > 18.0);
    }

    #[test]
    fn test_distribution() {
        let d = perplexity_distribution(&[10.0, 10.0, 10.0, 70.0]);
        assert!(d.std > 0.0);
        assert!((d.cv - d.std / 25.0).abs() < 1e-9);
        assert!(d.skew > 0.0);

        let empty = perplexity_distribution(&[]);
        assert_eq!(empty, PerplexityDistribution::default());

        let two = perplexity_distribution(&[10.0, 20.0]);
        assert_eq!(two.skew, 0.0);
    }

    #[tokio::test]
    async fn test_sentence_outcomes_keep_order_and_skips() {
        let mut table = HashMap::new();
        table.insert(s("first sentence here"), Entry::Value(12.0));
        table.insert(s("broken sentence here"), Entry::Unscoreable);
        table.insert(s("third sentence here"), Entry::Value(30.0));
        let scorer = Arc::new(TableScorer { table });
        let sentences = vec![
            s("first sentence here"),
            s("too short"),
            s("broken sentence here"),
            s("third sentence here"),
        ];

        let out = sentence_perplexities(scorer, &sentences, 3, 64, 2).await.unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], Ok(12.0));
        assert_eq!(out[1], Err(Skipped::TooFewTokens(2)));
        assert!(matches!(out[2], Err(Skipped::Unscoreable(_))));
        assert_eq!(out[3], Ok(30.0));
    }

    #[tokio::test]
    async fn test_scorer_outage_fails_the_call() {
        let mut table = HashMap::new();
        table.insert(s("second one fails"), Entry::Offline);
        let scorer = Arc::new(TableScorer { table });
        let sentences = vec![s("first one works"), s("second one fails")];
        let err = sentence_perplexities(scorer, &sentences, 3, 64, 4).await.unwrap_err();
        assert!(matches!(err, ScoringError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_document_perplexity_calibrates() {
        let scorer = TableScorer { table: HashMap::new() };
        let cfg = LengthCalibration::default();
        let (raw, calibrated) = document_perplexity(&scorer, "some text", 75, 128, &cfg).await.unwrap();
        assert_eq!(raw, 40.0);
        assert!((calibrated - 50.0).abs() < 1e-9);
    }
}

// Analysis Pipeline
// One request end to end: normalize -> extract -> normalize scores ->
// aggregate -> decide -> sentence scores.

use crate::error::{AnalysisError, InputError};
use crate::models::{AnalysisResult, Coverage, Document, SignalBundle};
use crate::services::config_store::{InferenceConfig, ScoringProfile};
use crate::services::providers::{AiClassifier, LanguageModelScorer};
use crate::services::text_processor::TextNormalizer;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use super::aggregation::{aggregate, EnsembleInputs};
use super::burstiness::calculate_burstiness;
use super::decision::{decide, is_reliable};
use super::modality::detect_modality;
use super::normalize::normalize_signals;
use super::perplexity::{document_perplexity, perplexity_distribution, sentence_perplexities};
use super::repetition::calculate_repetition;
use super::sentence_scores::{local_scores, score_sentences};
use super::stylometry::compute_stylometry;

/// Request limits and concurrency for calls into the scorer and classifier.
#[derive(Debug, Clone)]
pub struct CallSettings {
    pub max_tokens: usize,
    pub sentence_max_tokens: usize,
    pub sentence_concurrency: usize,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self::from(&InferenceConfig::default())
    }
}

impl From<&InferenceConfig> for CallSettings {
    fn from(config: &InferenceConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            sentence_max_tokens: config.sentence_max_tokens,
            sentence_concurrency: config.sentence_concurrency,
        }
    }
}

/// Holds the injected capabilities and the scoring profile. Nothing here is
/// mutated by an analysis, so one analyzer can serve concurrent requests.
pub struct Analyzer<N, S, C> {
    normalizer: N,
    scorer: Arc<S>,
    classifier: Arc<C>,
    profile: ScoringProfile,
    calls: CallSettings,
}

impl<N, S, C> Analyzer<N, S, C>
where
    N: TextNormalizer,
    S: LanguageModelScorer + 'static,
    C: AiClassifier,
{
    /// Fails if the profile does not validate.
    pub fn new(
        normalizer: N,
        scorer: Arc<S>,
        classifier: Arc<C>,
        profile: ScoringProfile,
        calls: CallSettings,
    ) -> Result<Self, AnalysisError> {
        profile.validate()?;
        Ok(Self {
            normalizer,
            scorer,
            classifier,
            profile,
            calls,
        })
    }

    pub fn profile(&self) -> &ScoringProfile {
        &self.profile
    }

    pub async fn analyze(&self, raw_text: &str) -> Result<AnalysisResult, AnalysisError> {
        if raw_text.trim().is_empty() {
            return Err(InputError::EmptyText.into());
        }
        let document = self.normalizer.normalize(raw_text);
        if document.sentences.is_empty() {
            return Err(InputError::NoValidSentences.into());
        }
        self.analyze_document(raw_text, &document).await
    }

    /// Scores an already-normalized document. `raw_text` is only used for
    /// modality detection, which needs the original line structure.
    pub async fn analyze_document(
        &self,
        raw_text: &str,
        document: &Document,
    ) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();
        let analysis_id = Uuid::new_v4();
        let profile = &self.profile;
        if document.text.trim().is_empty() {
            return Err(InputError::EmptyText.into());
        }
        if document.sentences.is_empty() {
            return Err(InputError::NoValidSentences.into());
        }

        info!(
            %analysis_id,
            chars = document.char_len(),
            words = document.word_count(),
            sentences = document.sentences.len(),
            "analysis.start"
        );

        let modality = detect_modality(raw_text);

        let (raw_perplexity, perplexity) = document_perplexity(
            self.scorer.as_ref(),
            &document.text,
            document.word_count(),
            self.calls.max_tokens,
            &profile.length_calibration,
        )
        .await?;

        let outcomes = sentence_perplexities(
            self.scorer.clone(),
            &document.sentences,
            profile.min_sentence_tokens,
            self.calls.sentence_max_tokens,
            self.calls.sentence_concurrency,
        )
        .await?;

        let classifier_prob = self
            .classifier
            .classify(&document.text, self.calls.max_tokens)
            .await?;
        if !(classifier_prob.is_finite() && (0.0..=1.0).contains(&classifier_prob)) {
            return Err(crate::error::ScoringError::InvalidOutput(classifier_prob).into());
        }

        let scored_ppl: Vec<f64> = outcomes.iter().filter_map(|o| o.as_ref().ok().copied()).collect();
        let signals = SignalBundle {
            perplexity,
            raw_perplexity,
            burstiness: calculate_burstiness(&document.sentences),
            repetition: calculate_repetition(&document.text),
            distribution: perplexity_distribution(&scored_ppl),
            stylometry: compute_stylometry(&document.text, &document.sentences),
            classifier_ai_prob: classifier_prob * 100.0,
            modality,
        };
        let normalized = normalize_signals(&signals, &profile.bounds);

        let locals = local_scores(&outcomes, &profile.bounds);
        let local_values: Vec<f64> = locals.iter().map(|&(_, _, score)| score).collect();
        let ensemble = aggregate(
            &EnsembleInputs {
                normalized: &normalized,
                local_scores: &local_values,
                modality: signals.modality.modality,
                perplexity_std: signals.distribution.std,
                burstiness: signals.burstiness,
            },
            profile,
        );

        let (label, confidence) = decide(ensemble.score, &profile.decision);
        let reliable = is_reliable(
            document.char_len(),
            signals.modality.modality,
            profile.reliability_min_chars,
        );
        let sentence_scores = score_sentences(
            &document.sentences,
            &locals,
            ensemble.score,
            profile.sentence_local_weight,
        );

        let coverage = Coverage {
            sentences: document.sentences.len(),
            scored: locals.len(),
            skipped: document.sentences.len() - locals.len(),
        };

        info!(
            %analysis_id,
            score = ensemble.score,
            label = label.as_str(),
            modality = signals.modality.modality.as_str(),
            is_reliable = reliable,
            scored = coverage.scored,
            skipped = coverage.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis.done"
        );

        Ok(AnalysisResult {
            analysis_id,
            score: ensemble.score,
            label,
            confidence,
            is_reliable: reliable,
            modality: signals.modality.modality,
            sentence_scores,
            signals,
            normalized,
            consensus: ensemble.consensus,
            overrides: ensemble.overrides,
            coverage,
        })
    }
}

// Ensemble Aggregation
// Combines normalized sub-scores, sentence consensus and the classifier
// probability into one final score.
//
// Order: statistical base -> modality branch -> statistical floor ->
// structural-variety credit -> clamp.

use crate::models::{Modality, NormalizedScores, OverrideTrace, SentenceConsensus};
use crate::services::config_store::{ConsensusConfig, ScoringProfile, SignalWeights};
use tracing::debug;

/// Used for ai_ratio and mean_prob when no sentence could be scored.
const NEUTRAL_CONSENSUS: f64 = 50.0;

pub struct EnsembleInputs<'a> {
    pub normalized: &'a NormalizedScores,
    /// Local normalized perplexity score of each scored sentence, in order.
    pub local_scores: &'a [f64],
    pub modality: Modality,
    /// Raw std of sentence perplexities.
    pub perplexity_std: f64,
    /// Raw burstiness in [0, 1].
    pub burstiness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnsembleOutcome {
    pub score: f64,
    pub consensus: SentenceConsensus,
    pub overrides: OverrideTrace,
}

pub fn sentence_consensus(local_scores: &[f64], cfg: &ConsensusConfig) -> SentenceConsensus {
    if local_scores.is_empty() {
        return SentenceConsensus {
            flagged: 0,
            scored: 0,
            ai_ratio: NEUTRAL_CONSENSUS,
            mean_prob: NEUTRAL_CONSENSUS,
            max_streak: 0,
            streak_bonus: 0.0,
        };
    }

    let mut flagged = 0usize;
    let mut streak = 0usize;
    let mut max_streak = 0usize;
    for &score in local_scores {
        if score >= cfg.flag_threshold {
            flagged += 1;
            streak += 1;
            max_streak = max_streak.max(streak);
        } else {
            streak = 0;
        }
    }

    let scored = local_scores.len();
    let streak_bonus =
        (max_streak as f64 / cfg.streak_saturation.max(1) as f64).min(1.0) * cfg.streak_bonus_cap;

    SentenceConsensus {
        flagged,
        scored,
        ai_ratio: flagged as f64 / scored as f64 * 100.0,
        mean_prob: local_scores.iter().sum::<f64>() / scored as f64,
        max_streak,
        streak_bonus,
    }
}

/// Weighted mean of sub-scores plus the streak bonus, capped at 100.
pub fn statistical_base(
    normalized: &NormalizedScores,
    consensus: &SentenceConsensus,
    weights: &SignalWeights,
) -> f64 {
    let weighted = normalized.perplexity * weights.perplexity
        + consensus.ai_ratio * weights.ai_ratio
        + consensus.mean_prob * weights.mean_prob
        + normalized.repetition * weights.repetition
        + normalized.cv * weights.cv
        + normalized.skew * weights.skew
        + normalized.burstiness * weights.burstiness
        + normalized.variance * weights.variance
        + normalized.sentence_length_var * weights.sentence_length_var
        + normalized.lexical_diversity * weights.lexical_diversity;

    let total = weights.total();
    let base = if total > 0.0 { weighted / total } else { 0.0 };
    (base + consensus.streak_bonus).clamp(0.0, 100.0)
}

pub fn aggregate(inputs: &EnsembleInputs<'_>, profile: &ScoringProfile) -> EnsembleOutcome {
    let n = inputs.normalized;
    let consensus = sentence_consensus(inputs.local_scores, &profile.consensus);

    // Modality branch: the classifier is prose-trained and ignored on code.
    let (base, mut score, classifier_blended) = match inputs.modality {
        Modality::Technical => {
            let base = statistical_base(n, &consensus, &profile.technical_weights);
            (base, base, false)
        }
        Modality::Prose => {
            let base = statistical_base(n, &consensus, &profile.prose_weights);
            let w = profile.classifier_weight;
            (base, w * n.classifier + (1.0 - w) * base, true)
        }
    };

    // Statistical floor: overwhelming statistics outvote a low blend.
    let floor = &profile.floor;
    let floor_triggered = n.perplexity > floor.perplexity_trigger || n.repetition > floor.repetition_trigger;
    let floor_applied = floor_triggered && score < floor.ceiling;
    if floor_applied {
        score = floor.base + score * floor.scale;
    }

    // Structural-variety credit, unless the classifier is itself confident.
    let variety = &profile.variety;
    let varied = inputs.perplexity_std > variety.std_trigger || inputs.burstiness > variety.burstiness_trigger;
    let variety_credit_applied = varied && n.classifier < variety.classifier_max;
    if variety_credit_applied {
        score *= variety.factor;
    }

    let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 100.0) };

    debug!(
        score,
        base,
        modality = inputs.modality.as_str(),
        ai_ratio = consensus.ai_ratio,
        mean_prob = consensus.mean_prob,
        max_streak = consensus.max_streak,
        floor_applied,
        variety_credit_applied,
        "ensemble"
    );

    EnsembleOutcome {
        score,
        consensus,
        overrides: OverrideTrace {
            statistical_base: base,
            classifier_blended,
            floor_applied,
            variety_credit_applied,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(perplexity: f64, repetition: f64, classifier: f64) -> NormalizedScores {
        NormalizedScores {
            perplexity,
            burstiness: 50.0,
            repetition,
            variance: 50.0,
            cv: 50.0,
            skew: 50.0,
            sentence_length_var: 50.0,
            lexical_diversity: 50.0,
            classifier,
        }
    }

    fn inputs<'a>(n: &'a NormalizedScores, local: &'a [f64], modality: Modality) -> EnsembleInputs<'a> {
        EnsembleInputs {
            normalized: n,
            local_scores: local,
            modality,
            perplexity_std: 5.0,
            burstiness: 0.2,
        }
    }

    #[test]
    fn test_consensus_streak() {
        let cfg = ConsensusConfig::default();
        let c = sentence_consensus(&[70.0, 80.0, 10.0, 66.0, 65.0, 90.0, 20.0], &cfg);
        assert_eq!(c.flagged, 5);
        assert_eq!(c.max_streak, 3);
        assert!((c.ai_ratio - 500.0 / 7.0).abs() < 1e-9);
        assert!((c.streak_bonus - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_streak_bonus_caps() {
        let cfg = ConsensusConfig::default();
        let c = sentence_consensus(&[90.0; 12], &cfg);
        assert_eq!(c.max_streak, 12);
        assert_eq!(c.streak_bonus, 15.0);
        assert_eq!(c.ai_ratio, 100.0);
    }

    #[test]
    fn test_consensus_without_sentences_is_neutral() {
        let c = sentence_consensus(&[], &ConsensusConfig::default());
        assert_eq!(c.ai_ratio, 50.0);
        assert_eq!(c.mean_prob, 50.0);
        assert_eq!(c.streak_bonus, 0.0);
    }

    #[test]
    fn test_reference_weights_sum() {
        let n = scores(80.0, 20.0, 0.0);
        let consensus = SentenceConsensus {
            ai_ratio: 60.0,
            mean_prob: 70.0,
            ..SentenceConsensus::default()
        };
        let core_only = SignalWeights {
            burstiness: 0.0,
            sentence_length_var: 0.0,
            lexical_diversity: 0.0,
            ..SignalWeights::prose()
        };
        let base = statistical_base(&n, &consensus, &core_only);
        let expected = 80.0 * 0.30 + 60.0 * 0.30 + 70.0 * 0.20 + 20.0 * 0.10 + 50.0 * 0.05 + 50.0 * 0.05;
        assert!((base - expected).abs() < 1e-9);
    }

    #[test]
    fn test_technical_ignores_classifier() {
        let profile = ScoringProfile::default();
        let local = [50.0, 50.0];
        let a = scores(60.0, 20.0, 0.0);
        let b = scores(60.0, 20.0, 100.0);
        let out_a = aggregate(&inputs(&a, &local, Modality::Technical), &profile);
        let out_b = aggregate(&inputs(&b, &local, Modality::Technical), &profile);
        assert!(!out_a.overrides.classifier_blended);
        assert_eq!(out_a.score, out_a.overrides.statistical_base);
        // Only the variety gate reads the classifier; neither input is varied here.
        assert_eq!(out_a.score, out_b.score);
    }

    #[test]
    fn test_prose_blends_classifier() {
        let profile = ScoringProfile::default();
        let local = [50.0, 50.0];
        let n = scores(60.0, 20.0, 90.0);
        let out = aggregate(&inputs(&n, &local, Modality::Prose), &profile);
        let expected = 0.5 * 90.0 + 0.5 * out.overrides.statistical_base;
        assert!((out.score - expected).abs() < 1e-9);
        assert!(!out.overrides.floor_applied);
    }

    #[test]
    fn test_statistical_floor_lifts_into_uncertain_band() {
        let mut profile = ScoringProfile::default();
        profile.classifier_weight = 1.0;
        let local = [95.0, 95.0];
        let n = scores(95.0, 10.0, 10.0);
        let out = aggregate(&inputs(&n, &local, Modality::Prose), &profile);
        assert!(out.overrides.floor_applied);
        assert!((out.score - (40.0 + 10.0 * 0.2)).abs() < 1e-9);
    }

    #[test]
    fn test_variety_credit_requires_unconfident_classifier() {
        let profile = ScoringProfile::default();
        let local = [40.0, 60.0];
        let n = scores(50.0, 10.0, 40.0);
        let mut varied = inputs(&n, &local, Modality::Prose);
        varied.burstiness = 0.6;
        let out = aggregate(&varied, &profile);
        assert!(out.overrides.variety_credit_applied);
        let plain = aggregate(&inputs(&n, &local, Modality::Prose), &profile);
        assert!((out.score - plain.score * 0.85).abs() < 1e-9);

        let confident = scores(50.0, 10.0, 80.0);
        let mut varied = inputs(&confident, &local, Modality::Prose);
        varied.perplexity_std = 45.0;
        assert!(!aggregate(&varied, &profile).overrides.variety_credit_applied);
    }

    #[test]
    fn test_adversarial_combinations_stay_in_range() {
        let profile = ScoringProfile::default();
        let extremes = [0.0, 100.0];
        for &p in &extremes {
            for &r in &extremes {
                for &c in &extremes {
                    for modality in [Modality::Prose, Modality::Technical] {
                        for local in [&[][..], &[100.0; 8][..], &[0.0, 100.0, 0.0][..]] {
                            let n = NormalizedScores {
                                perplexity: p,
                                burstiness: 100.0 - p,
                                repetition: r,
                                variance: p,
                                cv: r,
                                skew: c,
                                sentence_length_var: p,
                                lexical_diversity: r,
                                classifier: c,
                            };
                            let mut i = inputs(&n, local, modality);
                            i.perplexity_std = 100.0;
                            i.burstiness = 1.0;
                            let out = aggregate(&i, &profile);
                            assert!((0.0..=100.0).contains(&out.score), "score {}", out.score);
                        }
                    }
                }
            }
        }
    }
}

// Normalizers
// Map raw metrics to 0-100 AI-likelihood sub-scores. Every output is clamped.

use crate::models::{NormalizedScores, SignalBundle};
use crate::services::config_store::NormalizationBounds;

#[inline]
fn clamp_score(v: f64) -> f64 {
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(0.0, 100.0)
}

/// Inverted ratio score: 100 at 0, falling linearly to 0 at `ceiling`.
#[inline]
fn inverted(value: f64, ceiling: f64) -> f64 {
    clamp_score(100.0 * (1.0 - (value / ceiling).clamp(0.0, 1.0)))
}

/// Low variation is AI-like.
pub fn normalize_burstiness(burstiness: f64) -> f64 {
    clamp_score(100.0 * (1.0 - burstiness))
}

pub fn normalize_repetition(repetition: f64) -> f64 {
    clamp_score(100.0 * repetition)
}

/// Clamp into [min_ppl, max_ppl], then invert: lower perplexity scores higher.
pub fn normalize_perplexity(perplexity: f64, min_ppl: f64, max_ppl: f64) -> f64 {
    let p = perplexity.clamp(min_ppl, max_ppl);
    clamp_score(100.0 * (1.0 - (p - min_ppl) / (max_ppl - min_ppl)))
}

pub fn normalize_variance(std: f64, ceiling: f64) -> f64 {
    inverted(std, ceiling)
}

/// Human text has a wider spread of sentence perplexities.
pub fn normalize_cv(cv: f64, ceiling: f64) -> f64 {
    inverted(cv, ceiling)
}

/// Human text has a long right tail of surprising sentences; zero or
/// negative skew scores as fully AI-like.
pub fn normalize_skew(skew: f64, ceiling: f64) -> f64 {
    inverted(skew, ceiling)
}

pub fn normalize_sentence_length_var(var: f64, ceiling: f64) -> f64 {
    inverted(var, ceiling)
}

pub fn normalize_lexical_diversity(ttr: f64) -> f64 {
    inverted(ttr, 1.0)
}

pub fn normalize_signals(signals: &SignalBundle, bounds: &NormalizationBounds) -> NormalizedScores {
    NormalizedScores {
        perplexity: normalize_perplexity(signals.perplexity, bounds.min_perplexity, bounds.max_perplexity),
        burstiness: normalize_burstiness(signals.burstiness),
        repetition: normalize_repetition(signals.repetition.combined),
        variance: normalize_variance(signals.distribution.std, bounds.variance_ceiling),
        cv: normalize_cv(signals.distribution.cv, bounds.cv_ceiling),
        skew: normalize_skew(signals.distribution.skew, bounds.skew_ceiling),
        sentence_length_var: normalize_sentence_length_var(
            signals.stylometry.sentence_length_var,
            bounds.length_var_ceiling,
        ),
        lexical_diversity: normalize_lexical_diversity(signals.stylometry.lexical_diversity),
        classifier: clamp_score(signals.classifier_ai_prob),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perplexity_clamps_and_inverts() {
        assert_eq!(normalize_perplexity(10.0, 10.0, 300.0), 100.0);
        assert_eq!(normalize_perplexity(300.0, 10.0, 300.0), 0.0);
        assert_eq!(normalize_perplexity(1000.0, 10.0, 300.0), 0.0);
        assert_eq!(normalize_perplexity(1.0, 10.0, 300.0), 100.0);
        assert!((normalize_perplexity(155.0, 10.0, 300.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_perplexity_strictly_decreasing_in_range() {
        let mut prev = f64::INFINITY;
        for p in (10..=300).step_by(10) {
            let s = normalize_perplexity(p as f64, 10.0, 300.0);
            assert!(s < prev);
            prev = s;
        }
    }

    #[test]
    fn test_reference_range_matches_legacy_expectations() {
        let b = NormalizationBounds::default();
        let low = normalize_perplexity(10.0, b.min_perplexity, b.max_perplexity);
        let high = normalize_perplexity(90.0, b.min_perplexity, b.max_perplexity);
        let mid = normalize_perplexity(50.0, b.min_perplexity, b.max_perplexity);
        assert!((80.0..=100.0).contains(&low));
        assert!((0.0..=20.0).contains(&high));
        assert!((40.0..=60.0).contains(&mid));
    }

    #[test]
    fn test_burstiness_strictly_decreasing() {
        let mut prev = f64::INFINITY;
        for i in 0..=10 {
            let s = normalize_burstiness(i as f64 / 10.0);
            assert!(s < prev);
            prev = s;
        }
        assert!(normalize_burstiness(0.8) <= 30.0);
        assert!(normalize_burstiness(0.2) >= 70.0);
    }

    #[test]
    fn test_out_of_range_inputs_are_clamped() {
        assert_eq!(normalize_repetition(1.7), 100.0);
        assert_eq!(normalize_burstiness(-0.5), 100.0);
        assert_eq!(normalize_variance(90.0, 30.0), 0.0);
        assert_eq!(normalize_skew(-1.2, 2.0), 100.0);
        assert_eq!(normalize_cv(0.5, 1.0), 50.0);
        assert_eq!(normalize_lexical_diversity(1.0), 0.0);
        assert_eq!(normalize_sentence_length_var(0.0, 100.0), 100.0);
    }
}

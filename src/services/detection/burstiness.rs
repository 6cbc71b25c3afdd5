// Burstiness
// Sentence length variation; human writing varies more than model output.

use super::stats::{mean, std_dev};
use tracing::debug;

/// Returned when there are too few sentences to measure variation.
pub const NEUTRAL_BURSTINESS: f64 = 0.5;

/// Coefficient of variation of sentence word counts, clamped to [0, 1].
pub fn calculate_burstiness<S: AsRef<str>>(sentences: &[S]) -> f64 {
    if sentences.len() < 2 {
        return NEUTRAL_BURSTINESS;
    }

    let lengths: Vec<f64> = sentences
        .iter()
        .map(|s| s.as_ref().split_whitespace().count() as f64)
        .collect();

    let mean_length = mean(&lengths);
    let std = std_dev(&lengths);
    let cv = if mean_length > 0.0 { std / mean_length } else { 0.0 };
    let burstiness = cv.clamp(0.0, 1.0);

    debug!(burstiness, std, mean = mean_length, "burstiness");
    burstiness
}

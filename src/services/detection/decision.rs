// Decision
// Final score -> label and confidence, plus the reliability caveat.
// Reliability never changes the score; it only tells the caller how far to
// trust it.

use crate::models::{Confidence, Label, Modality};
use crate::services::config_store::DecisionThresholds;

pub fn decide(score: f64, thresholds: &DecisionThresholds) -> (Label, Confidence) {
    if score >= thresholds.ai {
        let confidence = if score >= thresholds.ai_high {
            Confidence::High
        } else {
            Confidence::Medium
        };
        (Label::AiGenerated, confidence)
    } else if score <= thresholds.human {
        let confidence = if score <= thresholds.human_high {
            Confidence::High
        } else {
            Confidence::Medium
        };
        (Label::HumanWritten, confidence)
    } else {
        (Label::Uncertain, Confidence::Low)
    }
}

pub fn is_reliable(char_len: usize, modality: Modality, min_chars: usize) -> bool {
    char_len >= min_chars && modality == Modality::Prose
}

// Detection Module
// AI-likelihood scoring core, organized into specialized submodules:
// - burstiness / repetition / stylometry / modality: text-only extractors
// - perplexity: document and per-sentence language-model signals
// - normalize: raw signals -> 0..100 sub-scores
// - aggregation: ensemble of sub-scores, sentence consensus and classifier
// - decision: score -> label, confidence and reliability
// - sentence_scores: per-sentence highlight scores
// - pipeline: one analysis end to end

pub mod stats;
pub mod burstiness;
pub mod repetition;
pub mod perplexity;
pub mod stylometry;
pub mod modality;
pub mod normalize;
pub mod aggregation;
pub mod decision;
pub mod sentence_scores;
pub mod pipeline;

// Re-export commonly used functions
pub use burstiness::calculate_burstiness;
pub use repetition::calculate_repetition;
pub use perplexity::{
    calibrate_for_length,
    document_perplexity,
    perplexity_distribution,
    sentence_perplexities,
    SentencePerplexity,
    Skipped,
};
pub use stylometry::compute_stylometry;
pub use modality::detect_modality;
pub use normalize::normalize_signals;
pub use aggregation::{aggregate, sentence_consensus, EnsembleInputs, EnsembleOutcome};
pub use decision::{decide, is_reliable};
pub use sentence_scores::{local_scores, score_sentences};
pub use pipeline::{Analyzer, CallSettings};

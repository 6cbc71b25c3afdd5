// Analysis Data Models
// Typed records for signals, normalized scores and the analysis result

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============ Document ============

/// Cleaned text plus the sentences produced by the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub text: String,
    pub sentences: Vec<String>,
}

impl Document {
    pub fn new(text: impl Into<String>, sentences: Vec<String>) -> Self {
        Self {
            text: text.into(),
            sentences,
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Length in Unicode scalar values, not UTF-8 bytes.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

// ============ Modality ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Prose,
    Technical,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prose => "PROSE",
            Self::Technical => "TECHNICAL",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalityReport {
    #[serde(rename = "type")]
    pub modality: Modality,
    pub confidence: f64,
    pub pattern_matches: usize,
    pub symbol_density: f64,
    pub indent_density: f64,
}

// ============ Signals ============

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepetitionSignal {
    pub bigram: f64,
    pub trigram: f64,
    pub diversity: f64,
    /// 0.3 * bigram + 0.3 * trigram + 0.4 * (1 - diversity)
    pub combined: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerplexityDistribution {
    pub std: f64,
    pub cv: f64,
    pub skew: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StylometryFeatures {
    pub avg_sentence_length: f64,
    pub sentence_length_var: f64,
    pub lexical_diversity: f64,
    pub stopword_ratio: f64,
}

/// Raw extractor outputs for one analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalBundle {
    /// Document perplexity after length calibration.
    pub perplexity: f64,
    pub raw_perplexity: f64,
    pub burstiness: f64,
    pub repetition: RepetitionSignal,
    pub distribution: PerplexityDistribution,
    pub stylometry: StylometryFeatures,
    /// External classifier probability on the 0-100 scale.
    pub classifier_ai_prob: f64,
    pub modality: ModalityReport,
}

/// Every field is an AI-likelihood sub-score in [0, 100].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedScores {
    pub perplexity: f64,
    pub burstiness: f64,
    pub repetition: f64,
    pub variance: f64,
    pub cv: f64,
    pub skew: f64,
    pub sentence_length_var: f64,
    pub lexical_diversity: f64,
    pub classifier: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SentenceConsensus {
    pub flagged: usize,
    pub scored: usize,
    pub ai_ratio: f64,
    pub mean_prob: f64,
    pub max_streak: usize,
    pub streak_bonus: f64,
}

/// Which override rules fired while aggregating.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverrideTrace {
    pub statistical_base: f64,
    pub classifier_blended: bool,
    pub floor_applied: bool,
    pub variety_credit_applied: bool,
}

// ============ Decision ============

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "AI-generated")]
    AiGenerated,
    #[serde(rename = "Human-written")]
    HumanWritten,
    #[serde(rename = "Uncertain")]
    Uncertain,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AiGenerated => "AI-generated",
            Self::HumanWritten => "Human-written",
            Self::Uncertain => "Uncertain",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

// ============ Sentence Scores ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceScore {
    /// Position in the input sentence list.
    pub index: usize,
    pub text: String,
    pub perplexity: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Coverage {
    pub sentences: usize,
    pub scored: usize,
    pub skipped: usize,
}

// ============ Analysis Result ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub analysis_id: Uuid,
    pub score: f64,
    pub label: Label,
    pub confidence: Confidence,
    pub is_reliable: bool,
    pub modality: Modality,
    pub sentence_scores: Vec<SentenceScore>,
    pub signals: SignalBundle,
    pub normalized: NormalizedScores,
    pub consensus: SentenceConsensus,
    pub overrides: OverrideTrace,
    pub coverage: Coverage,
}

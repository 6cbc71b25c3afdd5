// Configuration Storage Service
// Scoring profile, inference settings, config file read/write and backups

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENDPOINT_ENV: &str = "AI_LIKELIHOOD_ENDPOINT";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub profile: ScoringProfile,
    #[serde(default)]
    pub inference: InferenceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            profile: ScoringProfile::default(),
            inference: InferenceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    /// Base URL of the inference service; falls back to AI_LIKELIHOOD_ENDPOINT.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub lm_model: Option<String>,
    #[serde(default)]
    pub classifier_model: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_sentence_max_tokens")]
    pub sentence_max_tokens: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_sentence_concurrency")]
    pub sentence_concurrency: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            lm_model: None,
            classifier_model: None,
            max_tokens: default_max_tokens(),
            sentence_max_tokens: default_sentence_max_tokens(),
            timeout_secs: default_timeout_secs(),
            sentence_concurrency: default_sentence_concurrency(),
        }
    }
}

impl InferenceConfig {
    pub fn resolved_endpoint(&self) -> Option<String> {
        self.endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| std::env::var(ENDPOINT_ENV).ok().filter(|e| !e.trim().is_empty()))
    }
}

// ============ Scoring Profile ============

/// Weights for the statistical base score. They are combined as a weighted
/// mean, so a set summing to 1.0 yields the plain weighted sum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SignalWeights {
    pub perplexity: f64,
    pub ai_ratio: f64,
    pub mean_prob: f64,
    pub repetition: f64,
    pub cv: f64,
    pub skew: f64,
    pub burstiness: f64,
    pub variance: f64,
    pub sentence_length_var: f64,
    pub lexical_diversity: f64,
}

impl SignalWeights {
    pub fn prose() -> Self {
        Self {
            perplexity: 0.30,
            ai_ratio: 0.30,
            mean_prob: 0.20,
            repetition: 0.10,
            cv: 0.05,
            skew: 0.05,
            burstiness: 0.10,
            variance: 0.0,
            sentence_length_var: 0.05,
            lexical_diversity: 0.05,
        }
    }

    /// Perplexity-derived signals come from a prose-trained model, so code
    /// leans more on distribution shape and structure.
    pub fn technical() -> Self {
        Self {
            perplexity: 0.20,
            ai_ratio: 0.20,
            mean_prob: 0.15,
            repetition: 0.10,
            cv: 0.10,
            skew: 0.10,
            burstiness: 0.15,
            variance: 0.0,
            sentence_length_var: 0.0,
            lexical_diversity: 0.0,
        }
    }

    pub fn total(&self) -> f64 {
        self.values().iter().sum()
    }

    fn values(&self) -> [f64; 10] {
        [
            self.perplexity,
            self.ai_ratio,
            self.mean_prob,
            self.repetition,
            self.cv,
            self.skew,
            self.burstiness,
            self.variance,
            self.sentence_length_var,
            self.lexical_diversity,
        ]
    }
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self::prose()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NormalizationBounds {
    pub min_perplexity: f64,
    pub max_perplexity: f64,
    /// Sentence perplexity std at which the variance score reaches 0.
    pub variance_ceiling: f64,
    pub cv_ceiling: f64,
    pub skew_ceiling: f64,
    /// Sentence length variance (words squared) at which the score reaches 0.
    pub length_var_ceiling: f64,
}

impl Default for NormalizationBounds {
    fn default() -> Self {
        Self {
            min_perplexity: 5.0,
            max_perplexity: 100.0,
            variance_ceiling: 30.0,
            cv_ceiling: 1.0,
            skew_ceiling: 2.0,
            length_var_ceiling: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LengthCalibration {
    pub short_text_words: usize,
    pub short_text_boost: f64,
    pub long_text_words: usize,
    pub long_text_penalty: f64,
}

impl Default for LengthCalibration {
    fn default() -> Self {
        Self {
            short_text_words: 150,
            short_text_boost: 0.5,
            long_text_words: 500,
            long_text_penalty: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsensusConfig {
    /// Local score at or above which a sentence counts as AI-flagged.
    pub flag_threshold: f64,
    /// Streak length that earns the full bonus.
    pub streak_saturation: usize,
    pub streak_bonus_cap: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            flag_threshold: 65.0,
            streak_saturation: 5,
            streak_bonus_cap: 15.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FloorConfig {
    pub perplexity_trigger: f64,
    pub repetition_trigger: f64,
    /// Final scores below this are lifted when a trigger fires.
    pub ceiling: f64,
    pub base: f64,
    pub scale: f64,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            perplexity_trigger: 90.0,
            repetition_trigger: 70.0,
            ceiling: 40.0,
            base: 40.0,
            scale: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct VarietyConfig {
    pub std_trigger: f64,
    pub burstiness_trigger: f64,
    /// Credit only applies while the classifier probability stays below this.
    pub classifier_max: f64,
    pub factor: f64,
}

impl Default for VarietyConfig {
    fn default() -> Self {
        Self {
            std_trigger: 20.0,
            burstiness_trigger: 0.4,
            classifier_max: 65.0,
            factor: 0.85,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DecisionThresholds {
    pub ai: f64,
    pub human: f64,
    pub ai_high: f64,
    pub human_high: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            ai: 65.0,
            human: 35.0,
            ai_high: 85.0,
            human_high: 15.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringProfile {
    pub prose_weights: SignalWeights,
    pub technical_weights: SignalWeights,
    pub bounds: NormalizationBounds,
    pub length_calibration: LengthCalibration,
    pub min_sentence_tokens: usize,
    pub consensus: ConsensusConfig,
    /// Share of the classifier probability in the prose blend.
    pub classifier_weight: f64,
    pub floor: FloorConfig,
    pub variety: VarietyConfig,
    pub decision: DecisionThresholds,
    pub reliability_min_chars: usize,
    /// Share of the local perplexity score in per-sentence scores.
    pub sentence_local_weight: f64,
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self {
            prose_weights: SignalWeights::prose(),
            technical_weights: SignalWeights::technical(),
            bounds: NormalizationBounds::default(),
            length_calibration: LengthCalibration::default(),
            min_sentence_tokens: 3,
            consensus: ConsensusConfig::default(),
            classifier_weight: 0.5,
            floor: FloorConfig::default(),
            variety: VarietyConfig::default(),
            decision: DecisionThresholds::default(),
            reliability_min_chars: 150,
            sentence_local_weight: 0.7,
        }
    }
}

impl ScoringProfile {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, weights) in [("prose", &self.prose_weights), ("technical", &self.technical_weights)] {
            if weights.values().iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(invalid(format!("{name} weights must be finite and non-negative")));
            }
            if weights.total() <= 0.0 {
                return Err(invalid(format!("{name} weights must not all be zero")));
            }
        }

        let b = &self.bounds;
        if !(b.min_perplexity > 0.0 && b.max_perplexity > b.min_perplexity) {
            return Err(invalid(format!(
                "perplexity range [{}, {}] must be positive and increasing",
                b.min_perplexity, b.max_perplexity
            )));
        }
        if [b.variance_ceiling, b.cv_ceiling, b.skew_ceiling, b.length_var_ceiling]
            .iter()
            .any(|c| !(*c > 0.0))
        {
            return Err(invalid("normalization ceilings must be positive"));
        }

        let lc = &self.length_calibration;
        if lc.short_text_words == 0 || lc.long_text_words < lc.short_text_words {
            return Err(invalid("length calibration word thresholds out of order"));
        }
        if lc.short_text_boost < 0.0 || lc.long_text_penalty < 0.0 {
            return Err(invalid("length calibration factors must be non-negative"));
        }

        if self.consensus.streak_saturation == 0 {
            return Err(invalid("streak saturation must be at least 1"));
        }
        if !unit(self.classifier_weight) || !unit(self.sentence_local_weight) || !unit(self.variety.factor) {
            return Err(invalid("blend weights and variety factor must lie in [0, 1]"));
        }

        let d = &self.decision;
        if !(d.human_high <= d.human && d.human < d.ai && d.ai <= d.ai_high) {
            return Err(invalid(format!(
                "decision thresholds out of order: {} <= {} < {} <= {}",
                d.human_high, d.human, d.ai, d.ai_high
            )));
        }
        Ok(())
    }
}

fn unit(v: f64) -> bool {
    (0.0..=1.0).contains(&v)
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

fn default_version() -> String { env!("CARGO_PKG_VERSION").to_string() }
fn default_max_tokens() -> usize { 1024 }
fn default_sentence_max_tokens() -> usize { 512 }
fn default_timeout_secs() -> u64 { 60 }
fn default_sentence_concurrency() -> usize { 4 }

// ============ Store ============

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Store backed by an explicit file; backups go next to it.
    pub fn from_file(config_file: PathBuf) -> Self {
        let config_dir = config_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self { config_dir, config_file }
    }

    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ai-likelihood"))
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn ensure_dir(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.config_dir)?;
        Ok(())
    }

    /// Load configuration; a missing file yields the defaults.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.profile.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        config.profile.validate()?;
        self.ensure_dir()?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_file, content)?;
        Ok(())
    }

    fn create_backup(&self) -> Result<(), ConfigError> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir)?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%.3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));
        fs::copy(&self.config_file, &backup_file)?;

        // Keep only last 10 backups
        self.cleanup_old_backups(&backup_dir, 10)
    }

    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), ConfigError> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Oldest first
        entries.sort_by_key(|e| {
            e.metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
        });

        for entry in entries.iter().take(entries.len() - keep) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }
}

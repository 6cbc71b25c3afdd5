// Error taxonomy
// Input problems, external scorer failures and bad configuration.

use thiserror::Error;

/// Rejected before any scoring happens; no partial result is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("text is empty or whitespace-only")]
    EmptyText,
    #[error("no valid sentences found in text")]
    NoValidSentences,
}

/// Failure of the language-model scorer or the classifier.
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("cannot score empty input")]
    EmptyInput,
    #[error("input cannot be scored: {0}")]
    Unscoreable(String),
    #[error("scorer returned an invalid value: {0}")]
    InvalidOutput(f64),
    #[error("scorer unavailable: {0}")]
    Unavailable(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

impl ScoringError {
    /// Errors tied to one particular input rather than to the scorer itself.
    /// A sentence that fails this way is skipped instead of failing the analysis.
    pub fn is_input_specific(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::Unscoreable(_))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid scoring profile: {0}")]
    Invalid(String),
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_specific_errors() {
        assert!(ScoringError::EmptyInput.is_input_specific());
        assert!(ScoringError::Unscoreable("tokenizer".into()).is_input_specific());
        assert!(!ScoringError::Unavailable("down".into()).is_input_specific());
        assert!(!ScoringError::InvalidOutput(f64::NAN).is_input_specific());
    }

    #[test]
    fn test_analysis_error_wraps_input() {
        let err: AnalysisError = InputError::NoValidSentences.into();
        assert_eq!(err.to_string(), "no valid sentences found in text");
    }
}

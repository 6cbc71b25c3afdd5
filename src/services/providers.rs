// Scoring Providers
// Language-model scorer and classifier capabilities, plus an HTTP-backed
// implementation that talks to a remote inference service.

use crate::error::ScoringError;
use crate::services::config_store::InferenceConfig;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;

/// Produces perplexity values for text. Implementations must fail on empty or
/// unscoreable input instead of returning a placeholder value.
pub trait LanguageModelScorer: Send + Sync {
    /// Token count used for the per-sentence token floor.
    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }

    fn perplexity(
        &self,
        text: &str,
        max_tokens: usize,
    ) -> impl Future<Output = Result<f64, ScoringError>> + Send;
}

/// Produces a document-level AI probability in [0, 1].
pub trait AiClassifier: Send + Sync {
    fn classify(
        &self,
        text: &str,
        max_tokens: usize,
    ) -> impl Future<Output = Result<f64, ScoringError>> + Send;
}

/// perplexity = exp(loss), rejected unless finite and positive.
pub fn perplexity_from_loss(loss: f64) -> Result<f64, ScoringError> {
    let ppl = loss.exp();
    if ppl.is_finite() && ppl > 0.0 {
        Ok(ppl)
    } else {
        Err(ScoringError::InvalidOutput(loss))
    }
}

pub fn validate_probability(p: f64) -> Result<f64, ScoringError> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(ScoringError::InvalidOutput(p))
    }
}

// ============ HTTP inference client ============

#[derive(Debug, Clone, Serialize)]
struct ScoreRequest<'a> {
    text: &'a str,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
struct PerplexityResponse {
    loss: Option<f64>,
    perplexity: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct ClassifyResponse {
    ai_probability: f64,
}

/// Client for an inference service exposing `POST /perplexity` (returns the
/// mean token loss) and `POST /classify` (returns an AI probability).
#[derive(Clone)]
pub struct InferenceClient {
    client: Client,
    base_url: String,
    lm_model: Option<String>,
    classifier_model: Option<String>,
}

impl InferenceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ScoringError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            lm_model: None,
            classifier_model: None,
        })
    }

    pub fn from_config(config: &InferenceConfig) -> Result<Self, ScoringError> {
        let endpoint = config.resolved_endpoint().ok_or_else(|| {
            ScoringError::Unavailable("no inference endpoint configured".to_string())
        })?;
        let mut client = Self::new(endpoint, Duration::from_secs(config.timeout_secs))?;
        client.lm_model = config.lm_model.clone();
        client.classifier_model = config.classifier_model.clone();
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &ScoreRequest<'_>,
    ) -> Result<T, ScoringError> {
        let url = format!("{}/{}", self.base_url, path);
        let started = Instant::now();
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(map_status(status, message));
        }

        let parsed = response.json::<T>().await?;
        debug!(
            path,
            chars = body.text.chars().count(),
            latency_ms = started.elapsed().as_millis() as u64,
            "inference.call"
        );
        Ok(parsed)
    }
}

/// 400/422 mean the service rejected this particular text.
fn map_status(status: StatusCode, message: String) -> ScoringError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ScoringError::Unscoreable(message),
        _ => ScoringError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

impl LanguageModelScorer for InferenceClient {
    async fn perplexity(&self, text: &str, max_tokens: usize) -> Result<f64, ScoringError> {
        if text.trim().is_empty() {
            return Err(ScoringError::EmptyInput);
        }
        let body = ScoreRequest {
            text,
            max_tokens,
            model: self.lm_model.as_deref(),
        };
        let response: PerplexityResponse = self.post("perplexity", &body).await?;
        match (response.loss, response.perplexity) {
            (Some(loss), _) => perplexity_from_loss(loss),
            (None, Some(ppl)) if ppl.is_finite() && ppl > 0.0 => Ok(ppl),
            (None, Some(ppl)) => Err(ScoringError::InvalidOutput(ppl)),
            (None, None) => Err(ScoringError::Unavailable(
                "perplexity response carried neither loss nor perplexity".to_string(),
            )),
        }
    }
}

impl AiClassifier for InferenceClient {
    async fn classify(&self, text: &str, max_tokens: usize) -> Result<f64, ScoringError> {
        if text.trim().is_empty() {
            return Err(ScoringError::EmptyInput);
        }
        let body = ScoreRequest {
            text,
            max_tokens,
            model: self.classifier_model.as_deref(),
        };
        let response: ClassifyResponse = self.post("classify", &body).await?;
        validate_probability(response.ai_probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perplexity_from_loss() {
        assert!((perplexity_from_loss(0.0).unwrap() - 1.0).abs() < 1e-12);
        assert!((perplexity_from_loss(2.0).unwrap() - 2.0f64.exp()).abs() < 1e-9);
        assert!(perplexity_from_loss(f64::NAN).is_err());
        assert!(perplexity_from_loss(1e6).is_err());
    }

    #[test]
    fn test_validate_probability() {
        assert_eq!(validate_probability(0.25).unwrap(), 0.25);
        assert!(validate_probability(1.2).is_err());
        assert!(validate_probability(-0.1).is_err());
    }

    #[test]
    fn test_status_mapping() {
        assert!(map_status(StatusCode::UNPROCESSABLE_ENTITY, "too short".into()).is_input_specific());
        assert!(!map_status(StatusCode::SERVICE_UNAVAILABLE, "loading".into()).is_input_specific());
    }

    #[test]
    fn test_from_config_requires_endpoint() {
        let config = InferenceConfig {
            endpoint: Some("http://localhost:8000/".to_string()),
            ..InferenceConfig::default()
        };
        let client = InferenceClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected_before_request() {
        let client = InferenceClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        assert!(matches!(client.perplexity("  ", 16).await, Err(ScoringError::EmptyInput)));
        assert!(matches!(client.classify("", 16).await, Err(ScoringError::EmptyInput)));
    }
}

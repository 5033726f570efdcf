//! Gemini REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::error::{AiError, AiResult};
use crate::prompts::{caption_prompt, clean_response, overlay_prompt, DEFAULT_BRAND_HASHTAG};
use crate::types::{GenerateContentRequest, GenerateContentResponse, GeneratedCopy};

/// Produces overlay text and a caption for a video description.
#[async_trait]
pub trait CaptionGenerator: Send + Sync {
    /// `manual_text`, when non-blank, is used as the overlay instead of generating one.
    async fn generate(
        &self,
        api_key: &str,
        description: &str,
        manual_text: Option<&str>,
    ) -> AiResult<GeneratedCopy>;
}

/// Run `generator`, folding any failure into the `AI Error:` sentinel.
pub async fn generate_copy(
    generator: &dyn CaptionGenerator,
    api_key: &str,
    description: &str,
    manual_text: Option<&str>,
) -> GeneratedCopy {
    match generator.generate(api_key, description, manual_text).await {
        Ok(copy) => copy,
        Err(e) => {
            warn!("Caption generation failed: {}", e);
            GeneratedCopy::failed(&e)
        }
    }
}

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API root, without the `/v1beta` suffix
    pub base_url: String,
    /// Models tried in order
    pub models: Vec<String>,
    pub timeout: Duration,
    pub brand_hashtag: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            models: vec!["gemini-2.5-flash".to_string(), "gemini-1.5-flash".to_string()],
            timeout: Duration::from_secs(60),
            brand_hashtag: DEFAULT_BRAND_HASHTAG.to_string(),
        }
    }
}

impl GeminiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            models: std::env::var("GEMINI_MODELS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|m| m.trim().to_string())
                        .filter(|m| !m.is_empty())
                        .collect::<Vec<_>>()
                })
                .filter(|models| !models.is_empty())
                .unwrap_or(defaults.models),
            timeout: std::env::var("GEMINI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            brand_hashtag: std::env::var("BRAND_HASHTAG")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.brand_hashtag),
        }
    }
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> AiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(AiError::Network)?;

        Ok(Self { http, config })
    }

    pub fn from_env() -> AiResult<Self> {
        Self::new(GeminiConfig::from_env())
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Send `prompt` to each configured model until one answers.
    pub async fn complete(&self, api_key: &str, prompt: &str) -> AiResult<String> {
        if api_key.trim().is_empty() {
            return Err(AiError::MissingApiKey);
        }

        let mut last_error = None;
        for model in &self.config.models {
            debug!("Attempting Gemini model {}", model);
            match self.call_model(model, api_key, prompt).await {
                Ok(text) => {
                    info!(model = %model, "Gemini response received");
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Gemini model {} failed: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AiError::request_failed("no Gemini models configured")))
    }

    async fn call_model(&self, model: &str, api_key: &str, prompt: &str) -> AiResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&GenerateContentRequest::prompt(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout(self.config.timeout.as_secs())
                } else {
                    AiError::Network(e.without_url())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::request_failed(format!(
                "Gemini returned {}: {}",
                status,
                body.chars().take(300).collect::<String>()
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AiError::invalid_response(e.without_url().to_string()))?;

        let text = body.text().ok_or(AiError::EmptyResponse)?;
        let text = clean_response(&text);
        if text.is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl CaptionGenerator for GeminiClient {
    async fn generate(
        &self,
        api_key: &str,
        description: &str,
        manual_text: Option<&str>,
    ) -> AiResult<GeneratedCopy> {
        let overlay_text = match manual_text.map(str::trim).filter(|t| !t.is_empty()) {
            Some(text) => text.to_string(),
            None => self.complete(api_key, &overlay_prompt(description)).await?,
        };
        let caption = self
            .complete(api_key, &caption_prompt(description, &self.config.brand_hashtag))
            .await?;

        Ok(GeneratedCopy::new(overlay_text, caption))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(AiResult<GeneratedCopy>);

    #[async_trait]
    impl CaptionGenerator for Fixed {
        async fn generate(&self, _: &str, _: &str, _: Option<&str>) -> AiResult<GeneratedCopy> {
            match &self.0 {
                Ok(copy) => Ok(copy.clone()),
                Err(_) => Err(AiError::EmptyResponse),
            }
        }
    }

    #[test]
    fn test_default_config() {
        let config = GeminiConfig::default();
        assert_eq!(config.models, vec!["gemini-2.5-flash", "gemini-1.5-flash"]);
        assert_eq!(config.brand_hashtag, "#bluffinbob");
    }

    #[tokio::test]
    async fn test_generate_copy_passes_success_through() {
        let generator = Fixed(Ok(GeneratedCopy::new("Hook", "#tags")));
        let copy = generate_copy(&generator, "k", "desc", None).await;
        assert_eq!(copy, GeneratedCopy::new("Hook", "#tags"));
    }

    #[tokio::test]
    async fn test_generate_copy_folds_errors_into_sentinel() {
        let generator = Fixed(Err(AiError::EmptyResponse));
        let copy = generate_copy(&generator, "k", "desc", None).await;
        assert!(copy.is_error());
    }

    #[tokio::test]
    async fn test_blank_key_is_rejected_without_request() {
        let client = GeminiClient::new(GeminiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..GeminiConfig::default()
        })
        .unwrap();
        let err = client.complete("  ", "prompt").await.unwrap_err();
        assert!(matches!(err, AiError::MissingApiKey));
    }
}

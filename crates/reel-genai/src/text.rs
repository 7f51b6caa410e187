//! Generative text service client.
//!
//! Used for storyboard drafting, prompt refinement and caption copy.
//! Requests walk an ordered model-fallback list; the first model that
//! answers wins.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{GenAiError, GenAiResult};

/// Configuration for the text service client.
#[derive(Debug, Clone)]
pub struct TextServiceConfig {
    /// Base URL of the text generation API
    pub base_url: String,
    /// API key; absent means the client is unavailable and callers use
    /// their structural fallbacks
    pub api_key: Option<String>,
    /// Models to try, in order
    pub models: Vec<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for TextServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            models: vec![
                "gemini-2.5-flash".to_string(),
                "gemini-2.5-flash-lite".to_string(),
                "gemini-2.5-pro".to_string(),
            ],
            timeout: Duration::from_secs(60),
        }
    }
}

impl TextServiceConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("REEL_TEXT_SERVICE_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("REEL_TEXT_API_KEY")
                .or_else(|_| std::env::var("GEMINI_API_KEY"))
                .ok()
                .filter(|k| !k.is_empty()),
            models: defaults.models,
            timeout: defaults.timeout,
        }
    }
}

#[derive(Debug, Serialize)]
struct TextRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct TextResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

/// Client for the generative text service.
pub struct TextServiceClient {
    http: Client,
    config: TextServiceConfig,
}

impl TextServiceClient {
    /// Create a new client.
    pub fn new(config: TextServiceConfig) -> GenAiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GenAiError::Network)?;
        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> GenAiResult<Self> {
        Self::new(TextServiceConfig::from_env())
    }

    /// Whether the service can be called at all.
    pub fn is_available(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Generate text for the given instructions and context, walking
    /// the model fallback list.
    pub async fn generate(&self, instructions: &str, context: &str) -> GenAiResult<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| GenAiError::MissingCredentials("text service API key".to_string()))?;

        let prompt = format!("{instructions}\n\nCONTEXT:\n{context}");
        let mut last_error = None;

        for model in &self.config.models {
            match self.call_model(model, api_key, &prompt).await {
                Ok(text) => {
                    info!(model = %model, "Text service responded");
                    return Ok(text);
                }
                Err(e) => {
                    warn!(model = %model, error = %e, "Text model failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| GenAiError::request_failed("all text models failed")))
    }

    async fn call_model(&self, model: &str, api_key: &str, prompt: &str) -> GenAiResult<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url, model, api_key
        );

        let request = TextRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(GenAiError::Network)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenAiError::request_failed(format!(
                "text service returned {}: {}",
                status, body
            )));
        }

        let payload: TextResponse = response
            .json()
            .await
            .map_err(|e| GenAiError::invalid_response(format!("text payload: {}", e)))?;

        payload
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| GenAiError::invalid_response("no content in text response"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn candidate_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": text}]}}]
        })
    }

    #[test]
    fn unavailable_without_api_key() {
        let client = TextServiceClient::new(TextServiceConfig::default()).unwrap();
        assert!(!client.is_available());
    }

    #[tokio::test]
    async fn missing_key_is_reported_not_retried() {
        let client = TextServiceClient::new(TextServiceConfig::default()).unwrap();
        let result = client.generate("draft a storyboard", "brief").await;
        assert!(matches!(result, Err(GenAiError::MissingCredentials(_))));
    }

    #[tokio::test]
    async fn falls_back_to_next_model_on_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash-lite:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body("{\"ok\":true}")))
            .mount(&server)
            .await;

        let config = TextServiceConfig {
            base_url: server.uri(),
            api_key: Some("key".to_string()),
            models: vec![
                "gemini-2.5-flash".to_string(),
                "gemini-2.5-flash-lite".to_string(),
            ],
            timeout: Duration::from_secs(5),
        };

        let client = TextServiceClient::new(config).unwrap();
        let text = client.generate("instructions", "context").await.unwrap();
        assert_eq!(text, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn exhausting_all_models_surfaces_last_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let config = TextServiceConfig {
            base_url: server.uri(),
            api_key: Some("key".to_string()),
            models: vec!["gemini-2.5-flash".to_string()],
            timeout: Duration::from_secs(5),
        };

        let client = TextServiceClient::new(config).unwrap();
        let result = client.generate("instructions", "context").await;
        assert!(matches!(result, Err(GenAiError::RequestFailed(_))));
    }
}

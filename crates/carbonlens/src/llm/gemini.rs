//! Google Gemini API provider implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{CarbonLensError, Result};

use super::prompts;
use super::provider::{Generation, LlmConfig, TextGenerator};

/// Gemini API base; the model and method are appended.
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Google Gemini provider.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    config: LlmConfig,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let config = LlmConfig::default().with_model("gemini-1.5-flash");
        Self::with_config(api_key, config)
    }

    /// Create a new Gemini provider with custom configuration.
    pub fn with_config(api_key: impl Into<String>, config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| CarbonLensError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
        })
    }

    /// Create from environment variable.
    pub fn from_env(config: LlmConfig) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            CarbonLensError::Config("GEMINI_API_KEY environment variable not set".to_string())
        })?;
        Self::with_config(api_key, config)
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| CarbonLensError::Config(format!("Invalid API key: {}", e)))?,
        );
        Ok(headers)
    }

    async fn send_message(&self, user_prompt: &str) -> Result<String> {
        let url = format!("{}/{}:generateContent", API_BASE, self.config.model);
        let body = json!({
            "systemInstruction": {
                "parts": [{ "text": prompts::system_prompt() }]
            },
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": user_prompt }]
                }
            ],
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": self.config.max_tokens,
                "responseMimeType": "application/json"
            }
        });

        let response = self
            .client
            .post(&url)
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| CarbonLensError::Generation(format!("API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(CarbonLensError::Generation(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let api_response: GeminiResponse = response.json().await.map_err(|e| {
            CarbonLensError::Generation(format!("Failed to parse API response: {}", e))
        })?;

        let text: String = api_response
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(CarbonLensError::Generation(
                "Gemini returned no usable text".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Generation {
        Generation::from_result(self.send_message(prompt).await)
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }
}

/// Gemini API response structure.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

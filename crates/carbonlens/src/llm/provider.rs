//! Text generator trait and types.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{CarbonLensError, Result};

/// Outcome of a single generation call.
///
/// Providers never return an error for a failed call; they report
/// [`Generation::Failure`] and let the caller fall back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// The model answered with this text.
    Success(String),
    /// The call failed; the string says why.
    Failure(String),
}

impl Generation {
    pub fn is_success(&self) -> bool {
        matches!(self, Generation::Success(_))
    }

    /// Convert a provider result into a generation outcome.
    pub fn from_result(result: Result<String>) -> Self {
        match result {
            Ok(text) => Generation::Success(text),
            Err(e) => Generation::Failure(e.to_string()),
        }
    }
}

/// Configuration for text generators.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model to use (e.g., "claude-sonnet-4-20250514").
    pub model: String,

    /// Maximum tokens in response.
    pub max_tokens: usize,

    /// Temperature for generation (0.0-1.0).
    pub temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 500,
            temperature: 0.1,
        }
    }
}

impl LlmConfig {
    /// Replace the model, keeping the other settings.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// An asynchronous text-understanding collaborator.
///
/// Implementations must be thread-safe (Send + Sync) so a single instance
/// can serve concurrent requests. Output is untrusted input.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for the prompt.
    async fn generate(&self, prompt: &str) -> Generation;

    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Get the configuration.
    fn config(&self) -> &LlmConfig;
}

/// Parse JSON from a model response, handling markdown code blocks.
pub fn parse_json_response<T: for<'de> Deserialize<'de>>(response: &str) -> Result<T> {
    let json_str = if response.contains("```json") {
        response
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .map(|s| s.trim())
            .unwrap_or(response)
    } else if response.contains("```") {
        response
            .split("```")
            .nth(1)
            .map(|s| s.trim())
            .unwrap_or(response)
    } else {
        response.trim()
    };

    serde_json::from_str(json_str).map_err(|e| {
        CarbonLensError::Generation(format!("Failed to parse JSON response: {}", e))
    })
}

//! Mock text generator for testing.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::provider::{Generation, LlmConfig, TextGenerator};

/// Mock generator that replays scripted responses.
///
/// Responses are handed out in order; once the script runs out the fallback
/// response is repeated. An optional delay simulates a slow collaborator.
pub struct MockGenerator {
    config: LlmConfig,
    script: Mutex<VecDeque<Generation>>,
    fallback: Generation,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    /// Create a mock that always fails with "mock generator has no script".
    pub fn new() -> Self {
        Self {
            config: LlmConfig::default().with_model("mock"),
            script: Mutex::new(VecDeque::new()),
            fallback: Generation::Failure("mock generator has no script".to_string()),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A mock that always answers with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new().with_fallback(Generation::Success(text.into()))
    }

    /// A mock that always fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self::new().with_fallback(Generation::Failure(reason.into()))
    }

    /// Queue a response.
    pub fn then(self, generation: Generation) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(generation);
        }
        self
    }

    /// Response used once the script is exhausted.
    pub fn with_fallback(mut self, generation: Generation) -> Self {
        self.fallback = generation;
        self
    }

    /// Sleep this long before every response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Generation {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().ok().and_then(|mut script| script.pop_front());
        next.unwrap_or_else(|| self.fallback.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }
}

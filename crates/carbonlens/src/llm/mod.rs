//! Text-generation collaborators used by the delegated intent extractor.
//!
//! Every provider implements [`TextGenerator`]. Calls never raise: a failed
//! request comes back as [`Generation::Failure`] and the extractor falls back
//! to its rule-based result.
//!
//! # Supported Providers
//!
//! - **Anthropic** - Claude models via API (requires `ANTHROPIC_API_KEY`)
//! - **OpenAI** - GPT models via API (requires `OPENAI_API_KEY`)
//! - **Gemini** - Google models via API (requires `GEMINI_API_KEY`)
//! - **Ollama** - Local models, no API key needed (honours `OLLAMA_HOST`)
//! - **Mock** - Scripted responses for tests

mod anthropic;
mod gemini;
mod mock;
mod ollama;
mod openai;
pub mod prompts;
mod provider;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use mock::MockGenerator;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use provider::{parse_json_response, Generation, LlmConfig, TextGenerator};

//! CLI command implementations.

pub mod ask;
pub mod columns;
pub mod serve;

use std::path::Path;
use std::sync::Arc;

use carbonlens::llm::{
    AnthropicProvider, GeminiProvider, LlmConfig, MockGenerator, OllamaProvider, OpenAIProvider,
    TextGenerator,
};
use carbonlens::{ExtractionStrategy, PipelineConfig, QueryPipeline, StoreHandle};
use colored::Colorize;

use crate::cli::{ExtractionArgs, LlmProviderChoice};

/// Open the dataset and assemble a pipeline for the chosen extraction strategy.
pub fn build_pipeline(
    data: &Path,
    args: &ExtractionArgs,
) -> Result<QueryPipeline, Box<dyn std::error::Error>> {
    if !data.exists() {
        return Err(format!("Dataset not found: {}", data.display()).into());
    }

    let mut config = PipelineConfig::default();
    config.extraction.strategy = args.strategy();
    config.extraction.timeout = args.timeout();

    let store = StoreHandle::open(data, config.store.clone())?;

    let generator = match config.extraction.strategy {
        ExtractionStrategy::Rules => {
            if args.llm != LlmProviderChoice::None {
                eprintln!(
                    "{} --llm {} is ignored with the rules extractor",
                    "Warning:".yellow(),
                    args.llm
                );
            }
            None
        }
        ExtractionStrategy::Delegated => Some(build_generator(&args.llm, args.model.as_deref())?),
    };

    Ok(QueryPipeline::from_config(store, &config, generator)?)
}

/// Create the text generator for a provider choice.
pub fn build_generator(
    choice: &LlmProviderChoice,
    model: Option<&str>,
) -> Result<Arc<dyn TextGenerator>, Box<dyn std::error::Error>> {
    let config = |default: &str| LlmConfig::default().with_model(model.unwrap_or(default));

    let generator: Arc<dyn TextGenerator> = match choice {
        LlmProviderChoice::None => {
            return Err("Delegated extraction needs an LLM provider; pass --llm".into());
        }
        LlmProviderChoice::Anthropic => Arc::new(AnthropicProvider::from_env(config(
            &LlmConfig::default().model,
        ))?),
        LlmProviderChoice::OpenAI => Arc::new(OpenAIProvider::from_env(config("gpt-4o-mini"))?),
        LlmProviderChoice::Gemini => {
            Arc::new(GeminiProvider::from_env(config("gemini-1.5-flash"))?)
        }
        LlmProviderChoice::Ollama => Arc::new(OllamaProvider::with_config(config("llama3.2"))?),
        LlmProviderChoice::Mock => Arc::new(MockGenerator::new()),
    };
    Ok(generator)
}

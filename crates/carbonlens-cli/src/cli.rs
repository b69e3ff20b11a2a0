//! CLI argument definitions using clap.

use std::path::PathBuf;
use std::time::Duration;

use carbonlens::ExtractionStrategy;
use clap::{Args, Parser, Subcommand};

/// CarbonLens: natural-language questions over CO2 data
#[derive(Parser)]
#[command(name = "carbonlens")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the query API over HTTP
    Serve {
        /// Path to the emissions dataset (CSV/TSV)
        #[arg(long, env = "CARBONLENS_DATA", value_name = "FILE")]
        data: PathBuf,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the web server
        #[arg(short, long, env = "CARBONLENS_PORT", default_value = "8000")]
        port: u16,

        #[command(flatten)]
        extraction: ExtractionArgs,
    },

    /// Answer a single question and exit
    Ask {
        /// Path to the emissions dataset (CSV/TSV)
        #[arg(long, env = "CARBONLENS_DATA", value_name = "FILE")]
        data: PathBuf,

        /// The question, e.g. "average CO2 of China since 2010"
        #[arg(value_name = "QUESTION")]
        question: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        extraction: ExtractionArgs,
    },

    /// List the dataset's columns
    Columns {
        /// Path to the emissions dataset (CSV/TSV)
        #[arg(long, env = "CARBONLENS_DATA", value_name = "FILE")]
        data: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// How questions are turned into intents.
#[derive(Args, Clone, Debug)]
pub struct ExtractionArgs {
    /// Extraction strategy: rules or delegated (default: delegated when --llm is set)
    #[arg(long)]
    pub extractor: Option<ExtractionStrategy>,

    /// LLM provider for delegated extraction
    #[arg(long, default_value = "none")]
    pub llm: LlmProviderChoice,

    /// Model to use (provider-specific, e.g., "gpt-4o-mini", "llama3.2")
    #[arg(long)]
    pub model: Option<String>,

    /// Seconds to wait for the LLM before falling back to rules
    #[arg(long, default_value = "15")]
    pub llm_timeout: u64,
}

impl ExtractionArgs {
    /// The strategy to use, inferring delegated extraction from `--llm`.
    pub fn strategy(&self) -> ExtractionStrategy {
        self.extractor.unwrap_or(match self.llm {
            LlmProviderChoice::None => ExtractionStrategy::Rules,
            _ => ExtractionStrategy::Delegated,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout)
    }
}

/// LLM provider choice for delegated extraction
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LlmProviderChoice {
    /// No LLM - rule-based extraction only
    #[default]
    None,
    /// Anthropic Claude API (requires ANTHROPIC_API_KEY)
    Anthropic,
    /// OpenAI GPT API (requires OPENAI_API_KEY)
    OpenAI,
    /// Google Gemini API (requires GEMINI_API_KEY)
    Gemini,
    /// Ollama local models (requires Ollama running, OLLAMA_HOST optional)
    Ollama,
    /// Mock provider that always fails, exercising the rule-based fallback
    Mock,
}

impl std::str::FromStr for LlmProviderChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(LlmProviderChoice::None),
            "anthropic" | "claude" => Ok(LlmProviderChoice::Anthropic),
            "openai" | "gpt" => Ok(LlmProviderChoice::OpenAI),
            "gemini" | "google" => Ok(LlmProviderChoice::Gemini),
            "ollama" | "local" => Ok(LlmProviderChoice::Ollama),
            "mock" | "test" => Ok(LlmProviderChoice::Mock),
            _ => Err(format!(
                "Unknown provider: {}. Use: none, anthropic, openai, gemini, ollama, or mock.",
                s
            )),
        }
    }
}

impl std::fmt::Display for LlmProviderChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProviderChoice::None => write!(f, "none"),
            LlmProviderChoice::Anthropic => write!(f, "anthropic"),
            LlmProviderChoice::OpenAI => write!(f, "openai"),
            LlmProviderChoice::Gemini => write!(f, "gemini"),
            LlmProviderChoice::Ollama => write!(f, "ollama"),
            LlmProviderChoice::Mock => write!(f, "mock"),
        }
    }
}

//! Pipeline configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CarbonLensError;

/// Configuration for the whole query pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Dataset loading.
    pub store: StoreConfig,
    /// Intent extraction strategy.
    pub extraction: ExtractionConfig,
    /// Validation thresholds.
    pub validation: ValidationConfig,
}

/// How the dataset file is read.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Header of the entity identifier column.
    pub entity_column: String,
    /// Header of the year column.
    pub year_column: String,
    /// Field delimiter; auto-detected when `None`.
    pub delimiter: Option<u8>,
    /// Extra column aliases as `(phrase, column)`, checked before the built-ins.
    pub column_aliases: Vec<(String, String)>,
    /// Unit overrides by column name.
    pub units: IndexMap<String, String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            entity_column: "country".to_string(),
            year_column: "year".to_string(),
            delimiter: None,
            column_aliases: Vec::new(),
            units: IndexMap::new(),
        }
    }
}

impl StoreConfig {
    pub fn with_entity_column(mut self, column: impl Into<String>) -> Self {
        self.entity_column = column.into();
        self
    }

    pub fn with_year_column(mut self, column: impl Into<String>) -> Self {
        self.year_column = column.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Add a column alias. The phrase is normalized at load time.
    pub fn with_column_alias(mut self, phrase: impl Into<String>, column: impl Into<String>) -> Self {
        self.column_aliases.push((phrase.into(), column.into()));
        self
    }

    /// Override the inferred unit of a column.
    pub fn with_unit(mut self, column: impl Into<String>, unit: impl Into<String>) -> Self {
        self.units.insert(column.into(), unit.into());
        self
    }
}

/// Which intent extractor to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Keyword and pattern matching only.
    #[default]
    Rules,
    /// Ask a text generator, falling back to rules.
    Delegated,
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionStrategy::Rules => write!(f, "rules"),
            ExtractionStrategy::Delegated => write!(f, "delegated"),
        }
    }
}

impl FromStr for ExtractionStrategy {
    type Err = CarbonLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rules" | "rule" | "rule-based" => Ok(ExtractionStrategy::Rules),
            "delegated" | "llm" => Ok(ExtractionStrategy::Delegated),
            other => Err(CarbonLensError::Config(format!(
                "Unknown extraction strategy '{}'. Use 'rules' or 'delegated'.",
                other
            ))),
        }
    }
}

/// Intent extraction settings.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub strategy: ExtractionStrategy,
    /// Upper bound on a single delegated generation call.
    pub timeout: Duration,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            strategy: ExtractionStrategy::Rules,
            timeout: Duration::from_secs(15),
        }
    }
}

/// Thresholds used when resolving names.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Minimum similarity for a fuzzy entity match.
    pub entity_similarity_floor: f64,
    /// Minimum similarity for a fuzzy metric match.
    pub metric_similarity_floor: f64,
    /// Maximum near-miss suggestions attached to a rejection.
    pub max_suggestions: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            entity_similarity_floor: DEFAULT_SIMILARITY_FLOOR,
            metric_similarity_floor: DEFAULT_SIMILARITY_FLOOR,
            max_suggestions: 5,
        }
    }
}

/// Similarity floor for fuzzy name matches.
pub const DEFAULT_SIMILARITY_FLOOR: f64 = 0.80;

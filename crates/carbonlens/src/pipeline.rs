//! The question-to-answer pipeline.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::{ExtractionStrategy, PipelineConfig};
use crate::error::{CarbonLensError, Result};
use crate::execution::{execute, ExecutionError};
use crate::intent::{DelegatedExtractor, IntentExtractor, QueryIntent, RuleBasedExtractor};
use crate::llm::TextGenerator;
use crate::store::{DatasetStore, StoreHandle};
use crate::summary::{data_points, summarize, QueryAnswer, Statistics};
use crate::validation::{Rejection, Validator};

/// Why a question produced no answer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("the question is empty")]
    EmptyQuestion,

    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl QueryError {
    /// Stable snake_case identifier for API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::EmptyQuestion => "empty_question",
            QueryError::Rejected(r) => r.kind.as_str(),
            QueryError::Execution(ExecutionError::UnsupportedCombination(r)) => r.kind.as_str(),
            QueryError::Execution(ExecutionError::StoreMismatch { .. }) => "store_mismatch",
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            QueryError::EmptyQuestion => None,
            QueryError::Rejected(r) => Some(r),
            QueryError::Execution(e) => e.rejection(),
        }
    }

    /// Whether the caller can fix this by rephrasing.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, QueryError::Execution(ExecutionError::StoreMismatch { .. }))
    }
}

/// Extract, validate, execute and summarize.
///
/// Each question is answered against a single store snapshot, so a reload
/// in the middle of a request cannot mix two datasets.
pub struct QueryPipeline {
    store: StoreHandle,
    extractor: Arc<dyn IntentExtractor>,
    validator: Validator,
}

impl QueryPipeline {
    pub fn new(store: StoreHandle, extractor: Arc<dyn IntentExtractor>, validator: Validator) -> Self {
        Self {
            store,
            extractor,
            validator,
        }
    }

    /// Build a pipeline from configuration.
    ///
    /// The delegated strategy needs a generator; without one the
    /// configuration is rejected.
    pub fn from_config(
        store: StoreHandle,
        config: &PipelineConfig,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Result<Self> {
        let extractor: Arc<dyn IntentExtractor> = match (config.extraction.strategy, generator) {
            (ExtractionStrategy::Rules, _) => Arc::new(RuleBasedExtractor::new()?),
            (ExtractionStrategy::Delegated, Some(generator)) => {
                Arc::new(DelegatedExtractor::new(generator, config.extraction.timeout)?)
            }
            (ExtractionStrategy::Delegated, None) => {
                return Err(CarbonLensError::Config(
                    "Delegated extraction needs a text generator".to_string(),
                ));
            }
        };
        Ok(Self::new(
            store,
            extractor,
            Validator::with_config(config.validation.clone()),
        ))
    }

    /// A rule-based pipeline with default thresholds.
    pub fn rule_based(store: StoreHandle) -> Result<Self> {
        Self::from_config(store, &PipelineConfig::default(), None)
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn strategy(&self) -> ExtractionStrategy {
        self.extractor.strategy()
    }

    /// Answer a natural-language question.
    pub async fn answer(&self, question: &str) -> std::result::Result<QueryAnswer, QueryError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QueryError::EmptyQuestion);
        }

        let store = self.store.snapshot();
        let intent = self.extractor.extract(question, &store).await;
        self.answer_on(&intent, &store)
    }

    /// Answer an already extracted intent.
    pub fn answer_intent(&self, intent: &QueryIntent) -> std::result::Result<QueryAnswer, QueryError> {
        let store = self.store.snapshot();
        self.answer_on(intent, &store)
    }

    fn answer_on(
        &self,
        intent: &QueryIntent,
        store: &DatasetStore,
    ) -> std::result::Result<QueryAnswer, QueryError> {
        let validated = self.validator.validate(intent, store).map_err(|rejection| {
            info!(
                kind = %rejection.kind,
                detail = %rejection.detail,
                "Rejected query"
            );
            rejection
        })?;

        let result = execute(&validated, store).map_err(|e| {
            info!(error = %e, "Execution refused query");
            e
        })?;

        let rows = store.rows_matching(validated.entities(), &validated.years());
        let column = validated.metric().name.as_str();

        Ok(QueryAnswer {
            summary: summarize(&validated, &result),
            statistics: Statistics::from_rows(&rows, column),
            data: data_points(&rows, column),
            query_used: validated.describe(),
            origin: intent.origin.clone(),
            notes: validated.notes().iter().map(ToString::to_string).collect(),
            intent: validated,
            result,
        })
    }
}

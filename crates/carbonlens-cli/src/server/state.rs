//! Application state for the web server.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use carbonlens::{QueryPipeline, StoreHandle};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The question pipeline; owns the swappable store handle.
    pub pipeline: Arc<QueryPipeline>,
    /// Name of the configured LLM provider (for display).
    pub llm_provider_name: Option<String>,
    /// When the server started.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create new application state.
    pub fn new(pipeline: QueryPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            llm_provider_name: None,
            started_at: Utc::now(),
        }
    }

    /// Record which LLM provider backs delegated extraction.
    pub fn with_llm_name(mut self, name: impl Into<String>) -> Self {
        self.llm_provider_name = Some(name.into());
        self
    }

    pub fn store(&self) -> &StoreHandle {
        self.pipeline.store()
    }
}

//! Health check handler.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use carbonlens::{SourceMetadata, YearSpan};

use crate::server::state::AppState;

/// Response for `GET /api/health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// The server only starts once the dataset has loaded.
    pub dataset_loaded: bool,
    pub row_count: usize,
    pub column_count: usize,
    pub entity_count: usize,
    pub year_span: YearSpan,
    pub source: SourceMetadata,
    /// Active extraction strategy.
    pub extractor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_provider: Option<String>,
    pub started_at: DateTime<Utc>,
}

/// GET /api/health - Report dataset status.
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.store().snapshot();
    let source = store.metadata().clone();

    Json(HealthResponse {
        status: "ok",
        dataset_loaded: true,
        row_count: source.row_count,
        column_count: source.column_count,
        entity_count: source.entity_count,
        year_span: source.year_span,
        source,
        extractor: state.pipeline.strategy().to_string(),
        llm_provider: state.llm_provider_name.clone(),
        started_at: state.started_at,
    })
}

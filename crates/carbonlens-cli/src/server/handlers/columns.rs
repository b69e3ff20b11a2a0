//! Schema listing handler.

use axum::{extract::State, Json};
use serde::Serialize;

use carbonlens::ColumnMeta;

use crate::server::state::AppState;

/// Response for `GET /api/columns`.
#[derive(Debug, Serialize)]
pub struct ColumnsResponse {
    pub entity_column: String,
    pub year_column: String,
    /// Number of numeric metric columns.
    pub metric_count: usize,
    pub columns: Vec<ColumnMeta>,
}

/// GET /api/columns - List column metadata.
pub async fn get_columns(State(state): State<AppState>) -> Json<ColumnsResponse> {
    let store = state.store().snapshot();

    Json(ColumnsResponse {
        entity_column: store.entity_column().to_string(),
        year_column: store.year_column().to_string(),
        metric_count: store.metric_columns().count(),
        columns: store.columns().to_vec(),
    })
}

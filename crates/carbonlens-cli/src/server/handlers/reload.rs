//! Dataset reload handler.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Response for `POST /api/reload`.
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub success: bool,
    /// Whether the file contents differ from the previous store.
    pub changed: bool,
    pub row_count: usize,
    pub fingerprint: String,
}

/// POST /api/reload - Re-read the dataset file and swap it in.
///
/// Loading runs on the blocking pool; in-flight queries keep their snapshot.
pub async fn post_reload(State(state): State<AppState>) -> Result<Json<ReloadResponse>, ApiError> {
    let handle = state.store().clone();
    let previous = handle.snapshot().fingerprint().to_string();

    let store = tokio::task::spawn_blocking(move || handle.reload())
        .await
        .map_err(|e| ApiError::Internal(format!("Reload task failed: {}", e)))??;

    Ok(Json(ReloadResponse {
        success: true,
        changed: store.fingerprint() != previous,
        row_count: store.row_count(),
        fingerprint: store.fingerprint().to_string(),
    }))
}

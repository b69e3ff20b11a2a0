//! Question answering handler.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use carbonlens::summary::DataPoint;
use carbonlens::{ExecutionResult, IntentOrigin, QueryAnswer, QueryError, Statistics};

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Longest question accepted, in characters.
const MAX_QUESTION_CHARS: usize = 1000;

/// Request body for `POST /api/query`.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// The natural-language question. A missing field counts as empty.
    #[serde(default)]
    pub query: String,
}

/// Response for a successfully answered question.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    /// Observations behind the answer, for charting.
    pub data: Vec<DataPoint>,
    pub summary: String,
    pub statistics: Statistics,
    /// Canonical description of what was computed.
    pub query_used: String,
    pub result: ExecutionResult,
    pub notes: Vec<String>,
    pub origin: IntentOrigin,
}

impl From<QueryAnswer> for QueryResponse {
    fn from(answer: QueryAnswer) -> Self {
        Self {
            success: true,
            data: answer.data,
            summary: answer.summary,
            statistics: answer.statistics,
            query_used: answer.query_used,
            result: answer.result,
            notes: answer.notes,
            origin: answer.origin,
        }
    }
}

/// POST /api/query - Answer a question.
pub async fn post_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    if request.query.trim().is_empty() {
        return Err(QueryError::EmptyQuestion.into());
    }
    if request.query.chars().count() > MAX_QUESTION_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Question is longer than {} characters",
            MAX_QUESTION_CHARS
        )));
    }

    let answer = state.pipeline.answer(&request.query).await?;
    Ok(Json(answer.into()))
}

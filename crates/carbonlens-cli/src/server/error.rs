//! API error types and handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use carbonlens::{CarbonLensError, QueryError, YearSpan};

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from client.
    BadRequest(String),
    /// Internal server error.
    Internal(String),
    /// A question that could not be answered.
    Query(QueryError),
    /// Error from the carbonlens library.
    CarbonLens(CarbonLensError),
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error_kind: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_years: Option<YearSpan>,
}

impl ErrorResponse {
    fn new(error_kind: &str, detail: String) -> Self {
        Self {
            success: false,
            error_kind: error_kind.to_string(),
            detail,
            suggestions: Vec::new(),
            applied_years: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new("bad_request", msg)),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("internal", msg),
            ),
            ApiError::Query(e) => {
                // A store swap between validation and execution is not the caller's fault.
                let status = if e.is_user_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::CONFLICT
                };
                let mut body = ErrorResponse::new(e.kind(), e.to_string());
                if let Some(rejection) = e.rejection() {
                    body.detail = rejection.detail.clone();
                    body.suggestions = rejection.suggestions.clone();
                    body.applied_years = rejection.applied_years;
                }
                (status, body)
            }
            ApiError::CarbonLens(CarbonLensError::Config(msg)) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new("config", msg))
            }
            ApiError::CarbonLens(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("data_load", e.to_string()),
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::Query(err)
    }
}

impl From<CarbonLensError> for ApiError {
    fn from(err: CarbonLensError) -> Self {
        ApiError::CarbonLens(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Query(e) => write!(f, "Query error: {}", e),
            ApiError::CarbonLens(e) => write!(f, "CarbonLens error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

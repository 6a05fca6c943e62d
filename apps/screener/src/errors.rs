use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::models::scores::{Dimension, OutOfRange};
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The uploaded payload is not a decodable PDF.
    #[error("PDF parse error: {0}")]
    PdfParse(String),

    /// The model replied, but not with the JSON shape that was asked for.
    #[error("Malformed model response: {0}")]
    ResponseFormat(String),

    #[error("Score for '{dimension}' is out of range [0, 10]: {value}")]
    ScoreRange { dimension: Dimension, value: String },

    /// The model could not be reached or returned a non-success status.
    #[error("Model request failed{}: {message}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    ModelRequest { status: Option<u16>, message: String },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn score_range(dimension: Dimension, value: impl ToString) -> Self {
        AppError::ScoreRange {
            dimension,
            value: value.to_string(),
        }
    }

    /// Stable machine-readable code, also used in batch failure reports.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::PdfParse(_) => "PDF_PARSE_ERROR",
            AppError::ResponseFormat(_) => "RESPONSE_FORMAT_ERROR",
            AppError::ScoreRange { .. } => "SCORE_RANGE_ERROR",
            AppError::ModelRequest { .. } => "MODEL_REQUEST_ERROR",
            AppError::Store(_) => "STORAGE_ERROR",
            AppError::Archive(_) => "ARCHIVE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<OutOfRange> for AppError {
    fn from(err: OutOfRange) -> Self {
        AppError::score_range(err.dimension, err.value)
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        let (status, message) = match err {
            LlmError::Api { status, message } => (Some(status), message),
            LlmError::Http(e) => (e.status().map(|s| s.as_u16()), e.to_string()),
            err @ LlmError::RateLimited { .. } => (Some(429), err.to_string()),
            LlmError::EmptyContent => (None, LlmError::EmptyContent.to_string()),
        };
        AppError::ModelRequest { status, message }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::PdfParse(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AppError::ResponseFormat(_) | AppError::ScoreRange { .. } => {
                tracing::warn!("Model reply rejected: {self}");
                (
                    StatusCode::BAD_GATEWAY,
                    format!("The AI's answer was malformed. {self}"),
                )
            }
            AppError::ModelRequest { .. } => {
                tracing::error!("{self}");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::Store(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Archive(msg) => {
                tracing::error!("Archive error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A document storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

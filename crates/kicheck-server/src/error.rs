use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kicheck_core::{ConfigError, SubmissionError};
use kicheck_relay::RenderError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Pflichtfelder fehlen: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Konfiguration unvollständig: {0}")]
    Config(#[from] ConfigError),

    #[error("PDFMonkey Error")]
    Render(#[from] RenderError),
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::MissingFields(fields) => ApiError::MissingFields(fields),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string() }),
            ),
            ApiError::MissingFields(fields) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string(), "missing": fields }),
            ),
            ApiError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": self.to_string() }),
            ),
            ApiError::Render(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": self.to_string(), "details": err.details() }),
            ),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::CoachError;

/// Error returned to HTTP callers as `{ "error": message }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub const NO_FILE_UPLOADED: &'static str = "No audio file uploaded.";

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }

    pub fn no_file_uploaded() -> Self {
        Self::bad_request(Self::NO_FILE_UPLOADED)
    }

    pub fn file_too_large(limit: usize) -> Self {
        Self {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: format!("Audio file exceeds the {limit} byte upload limit."),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Upstream and internal failures collapse to a short 500; details are
/// only logged.
impl From<CoachError> for ApiError {
    fn from(err: CoachError) -> Self {
        tracing::error!(error = %err, "evaluation failed");
        match err {
            CoachError::RetriesExhausted { .. } => ApiError::internal(
                "Failed to get a response from the AI provider after multiple retries.",
            ),
            CoachError::ResponseParse(_) => ApiError::internal("Failed to parse API response."),
            CoachError::Transcription(_) => ApiError::internal("Failed to transcribe audio."),
            CoachError::Upstream { .. }
            | CoachError::Generation(_)
            | CoachError::InvalidRequest(_)
            | CoachError::Config(_) => ApiError::internal("Failed to process audio."),
        }
    }
}

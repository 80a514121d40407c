use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde_json::{json, Value};

use super::{read_submission, ApiError, AppState};
use crate::{Analysis, BandAssessment, SampleAnswers};

/// `POST /analyze-speech`
pub async fn analyze_speech(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Analysis>, ApiError> {
    let submission = read_submission(multipart, state.max_upload_bytes).await?;
    Ok(Json(state.service.analyze(&submission).await?))
}

/// `POST /checkband`
pub async fn check_band(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<BandAssessment>, ApiError> {
    let submission = read_submission(multipart, state.max_upload_bytes).await?;
    Ok(Json(state.service.check_band(&submission).await?))
}

/// `POST /sample-answers`
pub async fn sample_answers(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SampleAnswers>, ApiError> {
    let submission = read_submission(multipart, state.max_upload_bytes).await?;
    Ok(Json(state.service.sample_answers(&submission).await?))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "provider": state.service.provider_name(),
    }))
}

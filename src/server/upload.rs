//! Multipart receiver for learner recordings.

use axum::extract::{
    multipart::{Field, MultipartRejection},
    Multipart,
};
use bytes::{Bytes, BytesMut};

use super::ApiError;
use crate::{AudioClip, Submission};

/// Collects audio and question fields from a multipart upload.
///
/// Audio comes from `audio` and `audio_part_<n>` file fields, ordered with
/// `audio` first and then by `n`. Text fields whose name starts with
/// `question` become context lines. A request that is not multipart, or
/// carries no non-empty audio, is rejected with "No audio file uploaded.".
/// Each audio file may hold at most `max_file_bytes`.
pub async fn read_submission(
    multipart: Result<Multipart, MultipartRejection>,
    max_file_bytes: usize,
) -> Result<Submission, ApiError> {
    let Ok(mut multipart) = multipart else {
        return Err(ApiError::no_file_uploaded());
    };

    let mut clips: Vec<(usize, AudioClip)> = Vec::new();
    let mut context: Vec<(usize, String)> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError {
        status: e.status(),
        message: format!("Failed reading multipart field: {}", e.body_text()),
    })? {
        let name = field.name().unwrap_or_default().to_owned();

        if let Some(order) = audio_field_order(&name) {
            let mime_type = field.content_type().map(str::to_owned);
            let file_name = field.file_name().map(str::to_owned);
            let bytes = read_limited(field, &name, max_file_bytes).await?;
            if bytes.is_empty() {
                continue;
            }
            clips.push((
                order,
                AudioClip::new(mime_type.as_deref(), file_name.as_deref(), bytes),
            ));
        } else if let Some(order) = question_field_order(&name) {
            let text = field.text().await.map_err(|e| {
                ApiError::bad_request(format!(
                    "Failed reading multipart '{name}' field: {}",
                    e.body_text()
                ))
            })?;
            if !text.trim().is_empty() {
                context.push((order, text.trim().to_owned()));
            }
        }
    }

    if clips.is_empty() {
        return Err(ApiError::no_file_uploaded());
    }

    clips.sort_by_key(|(order, _)| *order);
    context.sort_by_key(|(order, _)| *order);

    Ok(Submission {
        clips: clips.into_iter().map(|(_, clip)| clip).collect(),
        context: context.into_iter().map(|(_, text)| text).collect(),
    })
}

/// Reads a file field chunk by chunk, failing with 413 once it grows past
/// `limit`.
async fn read_limited(mut field: Field<'_>, name: &str, limit: usize) -> Result<Bytes, ApiError> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| ApiError {
        status: e.status(),
        message: format!("Failed reading multipart '{name}' field: {}", e.body_text()),
    })? {
        if buffer.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::file_too_large(limit));
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

/// Sort key for audio fields: `audio` is 0, `audio_part_<n>` is `n + 1`.
fn audio_field_order(name: &str) -> Option<usize> {
    if name == "audio" {
        return Some(0);
    }
    name.strip_prefix("audio_part_")?
        .parse::<usize>()
        .ok()
        .map(|n| n.saturating_add(1))
}

/// Sort key for question fields; unnumbered variants keep arrival order last.
fn question_field_order(name: &str) -> Option<usize> {
    let rest = name.strip_prefix("question")?;
    if rest.is_empty() {
        return Some(0);
    }
    Some(
        rest.trim_start_matches(['_', '-'])
            .parse::<usize>()
            .map(|n| n.saturating_add(1))
            .unwrap_or(usize::MAX),
    )
}

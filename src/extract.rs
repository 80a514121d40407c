use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{CoachError, Result};

/// Returned in place of generated text the provider did not include.
pub const NO_ANALYSIS_PLACEHOLDER: &str = "No analysis could be generated.";

/// JSON pointer to the generated text inside a provider response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextPath(pub &'static str);

impl TextPath {
    /// Gemini `generateContent`.
    pub const GEMINI: Self = Self("/candidates/0/content/parts/0/text");
    /// OpenAI-style chat completion.
    pub const CHAT_COMPLETION: Self = Self("/choices/0/message/content");
    /// Whisper transcription with `response_format=json`.
    pub const TRANSCRIPTION: Self = Self("/text");
}

/// Reads the string at `path`, or the placeholder when it is missing,
/// not a string, or empty.
pub fn extract_text(body: &Value, path: TextPath) -> String {
    body.pointer(path.0)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .unwrap_or(NO_ANALYSIS_PLACEHOLDER)
        .to_owned()
}

/// Decodes the JSON object a model wrote as its text answer.
///
/// Models sometimes wrap JSON in a Markdown code fence; the fence is
/// stripped before decoding.
pub fn decode_model_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    let json = strip_code_fence(text);
    serde_json::from_str(json).map_err(|err| {
        CoachError::ResponseParse(format!("model answer is not the expected JSON: {err}; text: {text}"))
    })
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an info string such as `json` on the opening fence line.
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.strip_prefix("json").unwrap_or(rest),
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

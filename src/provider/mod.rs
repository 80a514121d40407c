//! Adapters for the generative-AI provider families.
//!
//! An adapter only builds [`CallRequest`]s and names where the generated
//! text lives in the response; sending and retrying is left to
//! [`ResilientClient`](crate::ResilientClient).

mod gemini;
mod openai;

use std::{fmt, str::FromStr};

use crate::{extract::TextPath, AudioClip, CallRequest, CoachError, Result, Submission, Task};

pub use gemini::GeminiAdapter;
pub use openai::OpenAiAdapter;

/// Builds provider-specific requests for a [`Task`].
pub trait ProviderAdapter: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Speech-to-text request for one clip, or `None` when the provider
    /// consumes audio inline in the generation request.
    fn transcription_request(&self, clip: &AudioClip) -> Result<Option<CallRequest>>;

    /// Generation request for `task`. `transcript` is set when a
    /// transcription stage ran first.
    fn generation_request(
        &self,
        task: Task,
        submission: &Submission,
        transcript: Option<&str>,
    ) -> Result<CallRequest>;

    fn transcription_path(&self) -> TextPath {
        TextPath::TRANSCRIPTION
    }

    fn generation_path(&self) -> TextPath;
}

/// Provider family selected by configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProviderKind {
    #[default]
    Gemini,
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_var(self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => GeminiAdapter::DEFAULT_MODEL,
            Self::OpenAi => OpenAiAdapter::DEFAULT_MODEL,
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Gemini => GeminiAdapter::DEFAULT_BASE_URL,
            Self::OpenAi => OpenAiAdapter::DEFAULT_BASE_URL,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = CoachError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" | "whisper" => Ok(Self::OpenAi),
            other => Err(CoachError::Config(format!(
                "unknown provider '{other}' (expected 'gemini' or 'openai')"
            ))),
        }
    }
}

/// Label placed before each recording when a submission has several.
pub(crate) fn part_label(index: usize) -> String {
    format!("Answer part {}:", index + 1)
}

pub(crate) fn trim_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_owned()
}

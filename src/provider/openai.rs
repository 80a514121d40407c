use std::fmt;

use reqwest::header;
use serde::Serialize;

use super::{trim_base_url, ProviderAdapter};
use crate::{
    extract::TextPath, prompt::context_block, request::secret_headers, AudioClip, CallRequest,
    CoachError, FormPart, Result, Submission, Task,
};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// OpenAI: Whisper transcribes each clip, then a chat model writes the answer.
#[derive(Clone)]
pub struct OpenAiAdapter {
    base_url: String,
    model: String,
    transcription_model: String,
    api_key: String,
}

impl fmt::Debug for OpenAiAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiAdapter")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("transcription_model", &self.transcription_model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl OpenAiAdapter {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";
    pub const DEFAULT_TRANSCRIPTION_MODEL: &'static str = "whisper-1";

    pub fn new(
        base_url: impl AsRef<str>,
        model: impl Into<String>,
        transcription_model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: trim_base_url(base_url.as_ref()),
            model: model.into(),
            transcription_model: transcription_model.into(),
            api_key: api_key.into(),
        }
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        secret_headers([(header::AUTHORIZATION, format!("Bearer {}", self.api_key))])
    }

    fn user_message(task: Task, submission: &Submission, transcript: &str) -> String {
        let mut content = task.user_instruction().to_owned();
        if let Some(context) = context_block(&submission.context) {
            content.push_str("\n\n");
            content.push_str(&context);
        }
        content.push_str("\n\nStudent's input:\n");
        content.push_str(transcript);
        content
    }
}

impl ProviderAdapter for OpenAiAdapter {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn transcription_request(&self, clip: &AudioClip) -> Result<Option<CallRequest>> {
        let parts = vec![
            FormPart::File {
                name: "file".to_owned(),
                file_name: clip.file_name.clone(),
                mime_type: clip.mime_type.clone(),
                bytes: clip.bytes.clone(),
            },
            FormPart::Text {
                name: "model".to_owned(),
                value: self.transcription_model.clone(),
            },
            FormPart::Text {
                name: "response_format".to_owned(),
                value: "json".to_owned(),
            },
        ];
        Ok(Some(CallRequest::post_form(
            format!("{}/audio/transcriptions", self.base_url),
            self.auth_headers()?,
            parts,
        )))
    }

    fn generation_request(
        &self,
        task: Task,
        submission: &Submission,
        transcript: Option<&str>,
    ) -> Result<CallRequest> {
        let transcript = transcript.ok_or_else(|| {
            CoachError::InvalidRequest("chat completion needs a transcript of the audio".to_owned())
        })?;
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: task.system_instruction().to_owned(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::user_message(task, submission, transcript),
                },
            ],
            response_format: task
                .expects_json()
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        CallRequest::post_json(
            format!("{}/chat/completions", self.base_url),
            self.auth_headers()?,
            &payload,
        )
    }

    fn generation_path(&self) -> TextPath {
        TextPath::CHAT_COMPLETION
    }
}

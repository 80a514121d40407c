use std::fmt;

use reqwest::header::HeaderName;
use serde::Serialize;
use serde_json::Value;

use super::{part_label, trim_base_url, ProviderAdapter};
use crate::{
    extract::TextPath, prompt::context_block, request::secret_headers, AudioClip, CallRequest,
    Result, Submission, Task,
};

/// Body sent to the Gemini `generateContent` endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    system_instruction: SystemInstruction,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

/// Google Gemini: audio is base64-inlined next to the instructions.
#[derive(Clone)]
pub struct GeminiAdapter {
    base_url: String,
    model: String,
    api_key: String,
}

impl fmt::Debug for GeminiAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiAdapter")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiAdapter {
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_MODEL: &'static str = "gemini-2.5-flash-preview-05-20";

    pub fn new(
        base_url: impl AsRef<str>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: trim_base_url(base_url.as_ref()),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn user_parts(task: Task, submission: &Submission, transcript: Option<&str>) -> Vec<Part> {
        let mut parts = vec![Part::Text {
            text: task.user_instruction().to_owned(),
        }];
        if let Some(context) = context_block(&submission.context) {
            parts.push(Part::Text { text: context });
        }
        if let Some(transcript) = transcript {
            parts.push(Part::Text {
                text: format!("Transcript:\n{transcript}"),
            });
        }

        let labelled = submission.clips.len() > 1;
        for (index, clip) in submission.clips.iter().enumerate() {
            if labelled {
                parts.push(Part::Text {
                    text: part_label(index),
                });
            }
            parts.push(inline_part(clip));
        }
        parts
    }
}

fn inline_part(clip: &AudioClip) -> Part {
    Part::Inline {
        inline_data: InlineData {
            mime_type: clip.mime_type.clone(),
            data: clip.to_base64(),
        },
    }
}

impl ProviderAdapter for GeminiAdapter {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn transcription_request(&self, _clip: &AudioClip) -> Result<Option<CallRequest>> {
        Ok(None)
    }

    fn generation_request(
        &self,
        task: Task,
        submission: &Submission,
        transcript: Option<&str>,
    ) -> Result<CallRequest> {
        let generation_config = task.expects_json().then(|| GenerationConfig {
            response_mime_type: "application/json",
            response_schema: task.response_schema(transcript.is_none()),
        });
        let payload = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: Self::user_parts(task, submission, transcript),
            }],
            system_instruction: SystemInstruction {
                parts: vec![Part::Text {
                    text: task.system_instruction().to_owned(),
                }],
            },
            generation_config,
        };

        let headers = secret_headers([(
            HeaderName::from_static("x-goog-api-key"),
            self.api_key.clone(),
        )])?;
        CallRequest::post_json(self.endpoint(), headers, &payload)
    }

    fn generation_path(&self) -> TextPath {
        TextPath::GEMINI
    }
}
